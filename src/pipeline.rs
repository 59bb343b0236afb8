//! Per-camera post-processing stack.
//!
//! [`PostProcessingStack`] drives every effect through the camera's frame:
//! `on_pre_cull` refreshes settings, runs enable/disable transitions, requests
//! auxiliary buffers and jitters the projection; `on_pre_render` records the
//! command-buffer effects; `on_post_render` restores the projection; and
//! `on_render_image` composites the frame through TAA, the uber material and
//! FXAA with as few full-screen passes as the active effects allow.

pub mod command_buffers;
pub mod state_observer;

use glam::{Mat4, Vec2, Vec4};
use std::sync::Arc;

use crate::config::{shaders, DEFAULT_DELTA_TIME, DEFAULT_FRAME_BUDGET_MS};
use crate::core::camera::Camera;
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::{DebugMode, PostProcessingProfile};
use crate::core::types::{
    ColorSpace, DepthTextureMode, EffectKind, FilterMode, RenderContextKind, TextureDesc,
    TextureFormat, TextureId,
};
use crate::effects::component::{
    try_prepare, CommandBufferEffect, FrameContext, FrameInfo, FrameResources, PostEffect,
};
use crate::effects::{EffectSet, Fxaa, JitterFn, TaaCoupling};
use crate::error::Result;
use crate::gpu::GraphicsDevice;
use crate::resources::{HistoryBuffers, MaterialCache, RenderTexturePool};
use crate::utils::logging::{warn_if_over_budget, Phase, PhaseTimer};
use crate::utils::profiling::CompositorProfiler;

pub use command_buffers::CommandBufferRegistry;
pub use state_observer::{EffectStates, StateTransition, Transition};

/// Called with the final composite before it is copied to the destination.
pub type MonitorFn = Box<dyn FnMut(&dyn GraphicsDevice, TextureId)>;

/// Overlay the host should draw on top of the frame for the active debug mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugOverlay {
    /// 1×1 adapted exposure texture.
    EyeAdaptation(TextureId),
    /// Baked color-grading LUT strip.
    LogLut(TextureId),
    UserLut(TextureId),
}

/// What `on_render_image` did this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeReport {
    pub taa: bool,
    pub eye_adaptation: bool,
    pub depth_of_field: bool,
    pub bloom: bool,
    /// Some effect wrote parameters into the uber material.
    pub uber_contributed: bool,
    pub uber_pass: bool,
    pub fxaa_pass: bool,
    pub direct_copy: bool,
    /// Full-screen passes between the (TAA-resolved) source and the destination.
    pub composite_passes: u32,
    pub monitor_invoked: bool,
}

pub struct PostProcessingStack {
    effects: EffectSet,
    states: EffectStates,
    command_buffers: CommandBufferRegistry,
    pool: RenderTexturePool,
    materials: MaterialCache,
    history: HistoryBuffers,
    profile: Option<Arc<PostProcessingProfile>>,
    previous_profile: Option<Arc<PostProcessingProfile>>,
    frame: Option<FrameInfo>,
    render_context: RenderContextKind,
    delta_time: f32,
    frame_index: u64,
    jitter_fn: Option<JitterFn>,
    monitor: Option<MonitorFn>,
    camera_jittered: bool,
    neutral_white: Option<TextureId>,
    last_transitions: Vec<StateTransition>,
    profiler: CompositorProfiler,
    frame_budget_ms: f32,
}

impl Default for PostProcessingStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PostProcessingStack {
    pub fn new() -> Self {
        Self {
            effects: EffectSet::new(),
            states: EffectStates::new(),
            command_buffers: CommandBufferRegistry::new(),
            pool: RenderTexturePool::new(),
            materials: MaterialCache::new(),
            history: HistoryBuffers::new(),
            profile: None,
            previous_profile: None,
            frame: None,
            render_context: RenderContextKind::Primary,
            delta_time: DEFAULT_DELTA_TIME,
            frame_index: 0,
            jitter_fn: None,
            monitor: None,
            camera_jittered: false,
            neutral_white: None,
            last_transitions: Vec::new(),
            profiler: CompositorProfiler::default(),
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
        }
    }

    pub fn with_profile(mut self, profile: Arc<PostProcessingProfile>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Installs the profile read from the next pre-cull on. A different `Arc`
    /// than last frame's counts as a swap and resets every effect.
    pub fn set_profile(&mut self, profile: Arc<PostProcessingProfile>) {
        self.profile = Some(profile);
    }

    /// Without a profile every frame is a direct copy.
    pub fn clear_profile(&mut self) {
        self.profile = None;
    }

    pub fn profile(&self) -> Option<&Arc<PostProcessingProfile>> {
        self.profile.as_ref()
    }

    /// Changes settings of the current profile in place. Effects follow the
    /// new settings through their usual transitions; this is not a swap.
    pub fn edit_profile(&mut self, edit: impl FnOnce(&mut PostProcessingProfile)) {
        let Some(profile) = self.profile.as_mut() else {
            return;
        };
        let current = self
            .previous_profile
            .as_ref()
            .is_some_and(|previous| Arc::ptr_eq(previous, profile));
        if !current {
            // A swap that no pre-cull has seen yet stays pending.
            edit(Arc::make_mut(profile));
            return;
        }
        // Drop our second handle so `make_mut` edits in place.
        self.previous_profile = None;
        edit(Arc::make_mut(profile));
        self.previous_profile = Some(Arc::clone(profile));
    }

    pub fn set_render_context(&mut self, context: RenderContextKind) {
        self.render_context = context;
    }

    pub fn set_delta_time(&mut self, delta_time: f32) {
        self.delta_time = delta_time.max(0.0);
    }

    /// Replaces the built-in projection jitter with `jitter`.
    pub fn set_jitter_function(&mut self, jitter: impl Fn(Vec2) -> Mat4 + 'static) {
        self.jitter_fn = Some(Box::new(jitter));
    }

    pub fn clear_jitter_function(&mut self) {
        self.jitter_fn = None;
    }

    pub fn set_monitor(&mut self, monitor: impl FnMut(&dyn GraphicsDevice, TextureId) + 'static) {
        self.monitor = Some(Box::new(monitor));
    }

    pub fn clear_monitor(&mut self) {
        self.monitor = None;
    }

    pub fn set_frame_budget_ms(&mut self, budget_ms: f32) {
        self.frame_budget_ms = budget_ms;
    }

    pub fn effects(&self) -> &EffectSet {
        &self.effects
    }

    /// Facts captured by the last successful pre-cull.
    pub fn frame_info(&self) -> Option<&FrameInfo> {
        self.frame.as_ref()
    }

    /// Transitions fired by the last pre-cull (or teardown), in order.
    pub fn last_transitions(&self) -> &[StateTransition] {
        &self.last_transitions
    }

    pub fn effect_states(&self) -> &EffectStates {
        &self.states
    }

    pub fn command_buffers(&self) -> &CommandBufferRegistry {
        &self.command_buffers
    }

    /// `(available, in use, total allocated)` pooled targets.
    pub fn pool_stats(&self) -> (usize, usize, usize) {
        self.pool.stats()
    }

    pub fn history(&self) -> &HistoryBuffers {
        &self.history
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    pub fn profiler(&self) -> &CompositorProfiler {
        &self.profiler
    }

    pub fn is_camera_jittered(&self) -> bool {
        self.camera_jittered
    }

    /// Frame start: refreshes every effect, fires enable/disable hooks,
    /// requests auxiliary buffers and jitters the projection for TAA.
    pub fn on_pre_cull(&mut self, device: &mut dyn GraphicsDevice, camera: Option<&mut dyn Camera>) {
        let timer = PhaseTimer::start(Phase::PreCull, self.frame_index);
        self.profiler.reset();
        self.last_transitions.clear();

        let (Some(profile), Some(camera)) = (self.profile.clone(), camera) else {
            log::trace!("Pre-cull skipped: no profile or camera");
            self.frame = None;
            return;
        };

        let debug = &profile.debug_views;
        let info = FrameInfo {
            camera: camera.snapshot(),
            render_context: self.render_context,
            debug_mode: if debug.enabled { debug.mode } else { DebugMode::None },
            interrupted: debug.will_interrupt(),
            delta_time: self.delta_time,
            frame_index: self.frame_index,
            caps: device.caps(),
            color_space: device.color_space(),
        };

        {
            let ctx = FrameContext {
                profile: &profile,
                info: &info,
                device: &*device,
            };
            for effect in self.effects.components_mut() {
                effect.init(&ctx);
            }
        }

        let swapped = self
            .previous_profile
            .as_ref()
            .is_some_and(|previous| !Arc::ptr_eq(previous, &profile));
        if swapped {
            log::info!("Post-processing profile swapped; disabling every effect");
            let mut effects = self.effects.components_mut();
            let forced =
                state_observer::disable_all(&mut self.states, &mut effects, device, &mut self.history);
            self.last_transitions.extend(forced);
        }
        self.previous_profile = Some(Arc::clone(&profile));

        {
            let mut effects = self.effects.components_mut();
            let transitions = state_observer::check_observers(
                &mut self.states,
                &mut effects,
                device,
                &mut self.history,
            );
            self.last_transitions.extend(transitions);
        }

        let mut flags = DepthTextureMode::NONE;
        for effect in self.effects.components() {
            if effect.is_active() {
                flags |= effect.camera_flags();
            }
        }
        camera.set_depth_texture_mode(flags);

        if self.effects.taa.is_active() && !info.is_preview() && !info.interrupted {
            let jitter = self.jitter_fn.as_deref();
            self.effects.taa.set_projection_matrix(camera, jitter);
            self.camera_jittered = true;
        }

        self.profiler.active_effects = self.effects.active_kinds().len();
        self.profiler.pre_cull_time += timer.elapsed();
        self.frame = Some(info);
    }

    /// Records the command-buffer effects and attaches them to `camera`.
    pub fn on_pre_render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        camera: &mut dyn Camera,
    ) -> Result<()> {
        let Some(info) = self.frame else {
            return Ok(());
        };
        let timer = PhaseTimer::start(Phase::PreRender, self.frame_index);

        let effects = &mut self.effects;
        let registry = &mut self.command_buffers;
        let mut res = FrameResources {
            device,
            pool: &mut self.pool,
            materials: &mut self.materials,
            history: &mut self.history,
        };

        update_command_buffer(&mut effects.debug_views, registry, camera, &mut res, &info)?;
        update_command_buffer(&mut effects.ambient_occlusion, registry, camera, &mut res, &info)?;
        update_command_buffer(
            &mut effects.screen_space_reflection,
            registry,
            camera,
            &mut res,
            &info,
        )?;
        update_command_buffer(&mut effects.fog, registry, camera, &mut res, &info)?;
        if info.is_preview() {
            registry.remove_if_present(camera, EffectKind::MotionBlur);
        } else {
            update_command_buffer(&mut effects.motion_blur, registry, camera, &mut res, &info)?;
        }

        self.profiler.command_buffers = self.command_buffers.len();
        self.profiler.pre_render_time += timer.elapsed();
        Ok(())
    }

    /// Restores the camera's own projection after a jittered frame.
    pub fn on_post_render(&mut self, camera: &mut dyn Camera) {
        if self.camera_jittered {
            camera.reset_projection_matrix();
            self.camera_jittered = false;
        }
    }

    /// Composites `source` into `destination`. Every pooled target is
    /// returned before this returns, whether or not composition succeeded.
    pub fn on_render_image(
        &mut self,
        device: &mut dyn GraphicsDevice,
        source: TextureId,
        destination: TextureId,
    ) -> Result<CompositeReport> {
        let timer = PhaseTimer::start(Phase::Composite, self.frame_index);

        let outcome = self.compose(device, source, destination);
        self.profiler.pooled_targets = self.pool.stats().2;
        self.pool.release_all(device);

        match &outcome {
            Ok(report) => self.profiler.composite_passes += report.composite_passes,
            Err(err) => log::warn!("Post-processing composite failed: {err}"),
        }
        self.profiler.composite_time += timer.elapsed();
        warn_if_over_budget(
            self.frame_index,
            self.profiler.total_frame_time(),
            self.frame_budget_ms,
        );
        self.frame_index += 1;
        outcome
    }

    /// Restarts every temporal effect as if it had just been enabled.
    pub fn reset_temporal_effects(&mut self) {
        self.effects.taa.reset_history();
        self.effects.motion_blur.reset_history();
        self.effects.eye_adaptation.reset_history();
        self.effects.depth_of_field.reset_history();
        log::debug!("Temporal effect history reset");
    }

    /// Detaches everything from `camera`, disables every effect and frees all
    /// GPU resources the stack owns.
    pub fn teardown(&mut self, device: &mut dyn GraphicsDevice, camera: Option<&mut dyn Camera>) {
        let _timer = PhaseTimer::start(Phase::Teardown, self.frame_index);
        match camera {
            Some(camera) => {
                self.command_buffers.clear(camera);
                if self.camera_jittered {
                    camera.reset_projection_matrix();
                }
                camera.set_depth_texture_mode(DepthTextureMode::NONE);
            }
            None => self.command_buffers.drop_all(),
        }
        self.camera_jittered = false;

        let mut effects = self.effects.components_mut();
        self.last_transitions =
            state_observer::disable_all(&mut self.states, &mut effects, device, &mut self.history);

        self.materials.dispose_all();
        self.pool.dispose(device);
        self.history.release_all(device);
        if let Some(white) = self.neutral_white.take() {
            device.destroy_texture(white);
        }
        self.frame = None;
        self.previous_profile = None;
        log::info!("Post-processing stack torn down");
    }

    /// Overlay to draw for the current debug mode, if it has one.
    pub fn debug_overlay(&self) -> Option<DebugOverlay> {
        let views = &self.profile.as_ref()?.debug_views;
        if !views.enabled {
            return None;
        }
        let effects = &self.effects;
        match views.mode {
            DebugMode::EyeAdaptation if effects.eye_adaptation.is_active() => effects
                .eye_adaptation
                .current_exposure()
                .map(DebugOverlay::EyeAdaptation),
            DebugMode::LogLut if effects.color_grading.is_active() => {
                effects.color_grading.lut().map(DebugOverlay::LogLut)
            }
            DebugMode::UserLut if effects.user_lut.is_active() => {
                effects.user_lut.settings().lut.map(DebugOverlay::UserLut)
            }
            _ => None,
        }
    }

    fn compose(
        &mut self,
        device: &mut dyn GraphicsDevice,
        source: TextureId,
        destination: TextureId,
    ) -> Result<CompositeReport> {
        let Some(info) = self.frame else {
            return direct_copy(device, source, destination);
        };

        let uber_id = match self.materials.get(&*device, shaders::UBER) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("{err}; copying the frame unprocessed");
                return direct_copy(device, source, destination);
            }
        };
        let Some(mut uber) = self.materials.take(uber_id) else {
            return direct_copy(device, source, destination);
        };
        let outcome = self.composite(device, &info, &mut uber, source, destination);
        self.materials.restore(uber_id, uber);
        outcome
    }

    fn composite(
        &mut self,
        device: &mut dyn GraphicsDevice,
        info: &FrameInfo,
        uber: &mut Material,
        source: TextureId,
        destination: TextureId,
    ) -> Result<CompositeReport> {
        let Self {
            effects,
            pool,
            materials,
            history,
            monitor,
            neutral_white,
            ..
        } = self;
        let mut report = CompositeReport::default();
        let mut res = FrameResources {
            device,
            pool,
            materials,
            history,
        };

        uber.clear_keywords();
        for name in [
            uniforms::AUTO_EXPOSURE,
            uniforms::DEPTH_OF_FIELD_TEX,
            uniforms::BLOOM_TEX,
            uniforms::BLOOM_DIRT_TEX,
        ] {
            uber.clear_texture(name);
        }

        let taa_active = effects.taa.is_active() && !info.is_preview();
        let mut src = source;
        if taa_active {
            let resolved = res.pool.acquire(res.device, src)?;
            effects.taa.render(&mut res, info, src, resolved)?;
            src = resolved;
            report.taa = true;
        }

        let exposure = if effects.eye_adaptation.is_active() {
            report.eye_adaptation = true;
            effects.eye_adaptation.prepare(&mut res, info, src, uber)?
        } else {
            ensure_neutral_white(neutral_white, res.device)?
        };
        uber.set_texture(uniforms::AUTO_EXPOSURE, exposure);

        if effects.depth_of_field.is_active() && !info.is_preview() {
            let taa = report.taa.then(|| TaaCoupling {
                jitter_uv: effects.taa.jitter_uv(),
                blending: effects.taa.motion_blending(),
            });
            effects.depth_of_field.prepare(&mut res, info, src, uber, taa)?;
            report.depth_of_field = true;
        }

        if effects.bloom.is_active() {
            effects.bloom.prepare(&mut res, info, src, uber, exposure)?;
            report.bloom = true;
        }

        let mut uber_active = report.eye_adaptation || report.depth_of_field || report.bloom;
        uber_active |= try_prepare(&mut effects.chromatic_aberration, uber, info);
        if effects.color_grading.is_active() {
            effects.color_grading.bake_lut(&mut res, info)?;
        }
        uber_active |= try_prepare(&mut effects.color_grading, uber, info);
        uber_active |= try_prepare(&mut effects.vignette, uber, info);
        uber_active |= try_prepare(&mut effects.user_lut, uber, info);

        let target = if monitor.is_some() {
            res.pool.acquire(res.device, destination)?
        } else {
            destination
        };

        if effects.fxaa.is_active() {
            let fxaa_id = res.materials.get(&*res.device, shaders::FXAA)?;
            if let Some(mut fxaa_material) = res.materials.take(fxaa_id) {
                fxaa_material.clear_keywords();
                try_prepare(&mut effects.grain, &mut fxaa_material, info);
                try_prepare(&mut effects.dithering, &mut fxaa_material, info);
                let outcome = run_fxaa(
                    &mut res,
                    &effects.fxaa,
                    &mut fxaa_material,
                    uber,
                    uber_active,
                    src,
                    target,
                    &mut report,
                );
                res.materials.restore(fxaa_id, fxaa_material);
                outcome?;
            }
        } else {
            uber_active |= try_prepare(&mut effects.grain, uber, info);
            uber_active |= try_prepare(&mut effects.dithering, uber, info);
            if info.color_space == ColorSpace::Gamma {
                uber.enable_keyword(keywords::COLORSPACE_GAMMA);
            }

            if uber_active {
                res.device.blit(Some(src), target, Some(&*uber), 0)?;
                report.uber_pass = true;
            } else {
                res.device.blit(Some(src), target, None, 0)?;
                report.direct_copy = true;
            }
            report.composite_passes += 1;
        }
        report.uber_contributed = uber_active;

        if let Some(monitor) = monitor.as_mut() {
            res.device.blit(Some(target), destination, None, 0)?;
            monitor(&*res.device, target);
            report.monitor_invoked = true;
        }

        log::trace!("Composite: {report:?}");
        Ok(report)
    }
}

/// Re-records `effect` into its camera buffer, or detaches the buffer when
/// the effect is inactive.
fn update_command_buffer<E: CommandBufferEffect>(
    effect: &mut E,
    registry: &mut CommandBufferRegistry,
    camera: &mut dyn Camera,
    res: &mut FrameResources<'_>,
    info: &FrameInfo,
) -> Result<()> {
    if !effect.is_active() {
        if registry.remove_if_present(camera, effect.kind()) {
            log::debug!("Detached command buffer for {}", effect.kind());
        }
        return Ok(());
    }

    let shared = registry.get_or_create(camera, effect.kind(), effect.camera_event(), effect.name());
    let mut buffer = shared.lock();
    buffer.clear();
    effect.populate_command_buffer(&mut buffer, res, info)
}

#[allow(clippy::too_many_arguments)]
fn run_fxaa(
    res: &mut FrameResources<'_>,
    fxaa: &Fxaa,
    fxaa_material: &mut Material,
    uber: &Material,
    uber_active: bool,
    source: TextureId,
    destination: TextureId,
    report: &mut CompositeReport,
) -> Result<()> {
    let mut fxaa_source = source;
    if uber_active {
        let graded = res.pool.acquire(res.device, source)?;
        res.device.blit(Some(source), graded, Some(uber), 0)?;
        report.uber_pass = true;
        report.composite_passes += 1;
        fxaa_source = graded;
    }
    fxaa.render(res.device, fxaa_material, fxaa_source, destination)?;
    report.fxaa_pass = true;
    report.composite_passes += 1;
    Ok(())
}

fn direct_copy(
    device: &mut dyn GraphicsDevice,
    source: TextureId,
    destination: TextureId,
) -> Result<CompositeReport> {
    device.blit(Some(source), destination, None, 0)?;
    Ok(CompositeReport {
        direct_copy: true,
        composite_passes: 1,
        ..CompositeReport::default()
    })
}

/// 1×1 white exposure bound when eye adaptation is off.
fn ensure_neutral_white(
    slot: &mut Option<TextureId>,
    device: &mut dyn GraphicsDevice,
) -> Result<TextureId> {
    if let Some(white) = *slot {
        if device.texture_desc(white).is_some() {
            return Ok(white);
        }
    }
    let desc = TextureDesc::new(1, 1, TextureFormat::RFloat).with_filter(FilterMode::Point);
    let white = device.create_texture(desc, "neutral white")?;
    device.clear_texture(white, Vec4::ONE)?;
    *slot = Some(white);
    Ok(white)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{SoftwareCamera, SoftwareDevice};

    #[test]
    fn missing_profile_copies_the_frame() {
        let mut device = SoftwareDevice::new();
        let mut camera = SoftwareCamera::new(4, 4);
        let desc = TextureDesc::new(4, 4, TextureFormat::RgbaFloat);
        let source = device.upload(desc, &[Vec4::new(0.25, 0.5, 0.75, 1.0); 16]).expect("source");
        let destination = device.create_texture(desc, "destination").expect("destination");

        let mut stack = PostProcessingStack::new();
        stack.on_pre_cull(&mut device, Some(&mut camera));
        assert!(stack.frame_info().is_none());
        let report = stack
            .on_render_image(&mut device, source, destination)
            .expect("composite");
        assert!(report.direct_copy);
        assert_eq!(
            device.read_texture(destination).expect("read"),
            device.read_texture(source).expect("read")
        );
    }

    #[test]
    fn debug_overlay_needs_an_enabled_view() {
        let mut profile = PostProcessingProfile::default();
        profile.debug_views.mode = DebugMode::LogLut;
        let stack = PostProcessingStack::new().with_profile(Arc::new(profile));
        assert_eq!(stack.debug_overlay(), None);
    }
}
