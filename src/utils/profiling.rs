use std::time::Duration;

/// Per-frame timing and pass counters for one stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompositorProfiler {
    pub pre_cull_time: Duration,
    pub pre_render_time: Duration,
    pub composite_time: Duration,

    pub active_effects: usize,
    pub command_buffers: usize,
    pub composite_passes: u32,
    pub pooled_targets: usize,
}

impl CompositorProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_frame_time(&self) -> Duration {
        self.pre_cull_time + self.pre_render_time + self.composite_time
    }

    pub fn report(&self) {
        let total_us = self.total_frame_time().as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        log::info!(
            "post-fx: {} active effects, {} command buffers, {} composite passes, {} pooled targets",
            self.active_effects,
            self.command_buffers,
            self.composite_passes,
            self.pooled_targets
        );
        log::info!(
            "  pre-cull {:.2} ms ({:.1}%), pre-render {:.2} ms ({:.1}%), composite {:.2} ms ({:.1}%)",
            self.pre_cull_time.as_secs_f32() * 1000.0,
            (self.pre_cull_time.as_micros() as f32 / total_us) * 100.0,
            self.pre_render_time.as_secs_f32() * 1000.0,
            (self.pre_render_time.as_micros() as f32 / total_us) * 100.0,
            self.composite_time.as_secs_f32() * 1000.0,
            (self.composite_time.as_micros() as f32 / total_us) * 100.0,
        );
    }
}
