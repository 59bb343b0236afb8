use glam::Vec4;

use crate::config::{shaders, MOTION_BLUR_MAX_HISTORY};
use crate::core::command_buffer::{CommandBuffer, RenderTargetRef};
use crate::core::material::uniforms;
use crate::core::profile::MotionBlurSettings;
use crate::core::types::{CameraEvent, DepthTextureMode, EffectKind, FilterMode, TextureDesc};
use crate::effects::component::{
    CommandBufferEffect, FrameContext, FrameInfo, FrameResources, LifecycleContext, PostEffect,
};
use crate::error::Result;

const HISTORY_SLOTS: [&str; MOTION_BLUR_MAX_HISTORY] = [
    uniforms::HISTORY1_TEX,
    uniforms::HISTORY2_TEX,
    uniforms::HISTORY3_TEX,
    uniforms::HISTORY4_TEX,
];

/// Velocity-buffer blur plus optional blending with previous frames.
///
/// Previous frames live in a ring of history buffers; the ring is written
/// after the blur so frame blending always reads earlier frames.
#[derive(Debug, Default)]
pub struct MotionBlur {
    settings: MotionBlurSettings,
    active: bool,
    /// Ring slot the next frame is written to.
    next_slot: usize,
    /// Number of valid frames in the ring.
    recorded: usize,
}

impl MotionBlur {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &MotionBlurSettings {
        &self.settings
    }

    pub fn recorded_frames(&self) -> usize {
        self.recorded
    }

    fn velocity_blur(&self) -> bool {
        self.settings.shutter_angle > 0.0 && self.settings.sample_count > 0
    }

    fn frame_blending(&self) -> bool {
        self.settings.frame_blending > 0.0
    }

    /// Weights for the most recent frames, newest first; zero for empty slots.
    fn history_weights(&self) -> Vec4 {
        let strength = self.settings.frame_blending.clamp(0.0, 1.0);
        let mut weights = [0.0; MOTION_BLUR_MAX_HISTORY];
        for (age, weight) in weights.iter_mut().enumerate().take(self.recorded) {
            *weight = strength.powi(age as i32 + 1);
        }
        Vec4::from_array(weights)
    }
}

impl PostEffect for MotionBlur {
    fn kind(&self) -> EffectKind {
        EffectKind::MotionBlur
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.motion_blur.clone();
        self.active = self.settings.enabled
            && (self.velocity_blur() || self.frame_blending())
            && ctx.info.caps.supports_motion_vectors
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::MOTION_BLUR);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn on_disable(&mut self, ctx: &mut LifecycleContext<'_>) {
        ctx.history.release_owned_by(ctx.device, EffectKind::MotionBlur);
        self.reset_history();
    }

    fn camera_flags(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH | DepthTextureMode::MOTION_VECTORS
    }

    fn reset_history(&mut self) {
        self.next_slot = 0;
        self.recorded = 0;
    }
}

impl CommandBufferEffect for MotionBlur {
    fn camera_event(&self) -> CameraEvent {
        CameraEvent::BeforeImageEffects
    }

    fn name(&self) -> &'static str {
        "Motion Blur"
    }

    fn populate_command_buffer(
        &mut self,
        buffer: &mut CommandBuffer,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
    ) -> Result<()> {
        // Replayed against the camera target, which is camera pixel sized.
        let (width, height) = (info.camera.width, info.camera.height);
        let format = info.hdr_format();
        let desc = TextureDesc::new(width, height, format);

        let mut ring = [None; MOTION_BLUR_MAX_HISTORY];
        if self.frame_blending() {
            for (slot, texture) in ring.iter_mut().enumerate() {
                let (history, fresh) =
                    res.history
                        .ensure(res.device, EffectKind::MotionBlur, slot as u32, desc)?;
                if fresh {
                    // A resized ring holds no usable frames.
                    self.recorded = self.recorded.min(slot);
                }
                *texture = Some(history);
            }
        }

        let weights = self.history_weights();
        let material = res.materials.get_mut(&*res.device, shaders::MOTION_BLUR)?;
        material.set_float(uniforms::VELOCITY_SCALE, self.settings.shutter_angle / 360.0);
        material.set_float(uniforms::SAMPLE_COUNT, self.settings.sample_count as f32);
        material.set_vector(uniforms::HISTORY_WEIGHTS, weights);
        for age in 0..MOTION_BLUR_MAX_HISTORY {
            let slot = (self.next_slot + MOTION_BLUR_MAX_HISTORY - 1 - age) % MOTION_BLUR_MAX_HISTORY;
            match ring[slot] {
                Some(texture) if age < self.recorded => {
                    material.set_texture(HISTORY_SLOTS[age], texture)
                }
                _ => material.clear_texture(HISTORY_SLOTS[age]),
            }
        }

        let temp = RenderTargetRef::Temporary(uniforms::MOTION_BLUR_TEMP);
        buffer.get_temporary(
            uniforms::MOTION_BLUR_TEMP,
            width,
            height,
            format,
            FilterMode::Bilinear,
        );
        if self.velocity_blur() {
            buffer.blit_material(RenderTargetRef::CameraTarget, temp, material, 0);
        } else {
            buffer.blit(RenderTargetRef::CameraTarget, temp);
        }

        if self.frame_blending() {
            buffer.blit_material(temp, RenderTargetRef::CameraTarget, material, 1);
            if let Some(newest) = ring[self.next_slot] {
                buffer.blit(temp, RenderTargetRef::Texture(newest));
            }
            self.next_slot = (self.next_slot + 1) % MOTION_BLUR_MAX_HISTORY;
            self.recorded = (self.recorded + 1).min(MOTION_BLUR_MAX_HISTORY);
        } else {
            buffer.blit(temp, RenderTargetRef::CameraTarget);
        }
        buffer.release_temporary(uniforms::MOTION_BLUR_TEMP);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_cover_only_recorded_frames() {
        let mut effect = MotionBlur::new();
        effect.settings.frame_blending = 0.5;
        assert_eq!(effect.history_weights(), Vec4::ZERO);

        effect.recorded = 2;
        let weights = effect.history_weights();
        assert_eq!(weights.x, 0.5);
        assert_eq!(weights.y, 0.25);
        assert_eq!(weights.z, 0.0);
    }
}
