use glam::{Mat4, Vec2, Vec4};

use crate::config::{shaders, TAA_SAMPLE_COUNT};
use crate::core::camera::Camera;
use crate::core::material::uniforms;
use crate::core::profile::{AntialiasingMethod, AntialiasingSettings, TaaSettings};
use crate::core::types::{DepthTextureMode, EffectKind, TextureId};
use crate::effects::component::{FrameContext, FrameInfo, FrameResources, LifecycleContext, PostEffect};
use crate::error::{PostFxError, Result};
use crate::utils::math::halton;

/// Supplies a jittered projection for a pixel-space sub-sample offset.
pub type JitterFn = Box<dyn Fn(Vec2) -> Mat4>;

/// Motion in UV units at which blending reaches `motion_blending`.
const MOTION_AMPLIFICATION: f32 = 6000.0;

/// Temporal antialiasing: sub-pixel projection jitter plus a history
/// resolve that reprojects the previous output along motion vectors.
#[derive(Debug, Default)]
pub struct TemporalAntialiasing {
    settings: AntialiasingSettings,
    active: bool,
    sample_index: u32,
    /// Offset of the current frame in pixels.
    jitter: Vec2,
    /// Offset of the current frame in UV units.
    jitter_uv: Vec2,
    reset_requested: bool,
}

impl TemporalAntialiasing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &TaaSettings {
        &self.settings.taa
    }

    pub fn jitter_uv(&self) -> Vec2 {
        self.jitter_uv
    }

    pub fn jitter(&self) -> Vec2 {
        self.jitter
    }

    pub fn motion_blending(&self) -> f32 {
        self.settings.taa.motion_blending
    }

    /// Next offset of the Halton (2, 3) cycle, centred on the pixel.
    fn next_offset(&mut self) -> Vec2 {
        let index = self.sample_index % TAA_SAMPLE_COUNT + 1;
        self.sample_index = (self.sample_index + 1) % TAA_SAMPLE_COUNT;
        let offset = Vec2::new(halton(index, 2) - 0.5, halton(index, 3) - 0.5);
        offset * self.settings.taa.jitter_spread
    }

    /// Installs this frame's jittered projection on `camera`.
    ///
    /// `jitter_fn` builds the projection from the pixel offset; without one
    /// the camera's own projection is shifted by the offset.
    pub fn set_projection_matrix(
        &mut self,
        camera: &mut dyn Camera,
        jitter_fn: Option<&dyn Fn(Vec2) -> Mat4>,
    ) {
        let offset = self.next_offset();
        let size = Vec2::new(
            camera.pixel_width().max(1) as f32,
            camera.pixel_height().max(1) as f32,
        );

        let projection = match jitter_fn {
            Some(jitter_fn) => jitter_fn(offset),
            None => {
                let mut projection = camera.projection_matrix();
                let shift = offset * 2.0 / size;
                if camera.is_orthographic() {
                    projection.w_axis.x -= shift.x;
                    projection.w_axis.y -= shift.y;
                } else {
                    projection.z_axis.x += shift.x;
                    projection.z_axis.y += shift.y;
                }
                projection
            }
        };
        camera.set_projection_matrix(projection);

        self.jitter = offset;
        self.jitter_uv = offset / size;
        log::trace!("TAA jitter {:?} (sample {})", offset, self.sample_index);
    }

    /// Resolves `source` against the history into `destination`, then
    /// stores `destination` as next frame's history.
    pub fn render(
        &mut self,
        res: &mut FrameResources<'_>,
        _info: &FrameInfo,
        source: TextureId,
        destination: TextureId,
    ) -> Result<()> {
        let desc = res
            .device
            .texture_desc(source)
            .ok_or(PostFxError::InvalidTexture(source))?;
        let (history, fresh) = res
            .history
            .ensure(res.device, EffectKind::TemporalAntialiasing, 0, desc)?;
        if fresh || self.reset_requested {
            res.device.blit(Some(source), history, None, 0)?;
            self.reset_requested = false;
        }

        let taa = &self.settings.taa;
        let material = res.materials.get_mut(&*res.device, shaders::TAA)?;
        material.set_vector(
            uniforms::JITTER,
            Vec4::new(self.jitter_uv.x, self.jitter_uv.y, 0.0, 0.0),
        );
        material.set_vector(
            uniforms::SHARPEN_PARAMETERS,
            Vec4::new(taa.sharpen, 0.0, 0.0, 0.0),
        );
        material.set_vector(
            uniforms::FINAL_BLEND_PARAMETERS,
            Vec4::new(
                taa.stationary_blending,
                taa.motion_blending,
                MOTION_AMPLIFICATION,
                0.0,
            ),
        );
        material.set_texture(uniforms::HISTORY_TEX, history);
        res.device.blit(Some(source), destination, Some(&*material), 0)?;
        res.device.blit(Some(destination), history, None, 0)
    }
}

impl PostEffect for TemporalAntialiasing {
    fn kind(&self) -> EffectKind {
        EffectKind::TemporalAntialiasing
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.antialiasing.clone();
        self.active = self.is_enabled()
            && ctx.info.caps.supports_motion_vectors
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::TAA);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled && self.settings.method == AntialiasingMethod::Taa
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn on_disable(&mut self, ctx: &mut LifecycleContext<'_>) {
        ctx.history
            .release_owned_by(ctx.device, EffectKind::TemporalAntialiasing);
        self.reset_history();
    }

    fn camera_flags(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH | DepthTextureMode::MOTION_VECTORS
    }

    fn reset_history(&mut self) {
        self.sample_index = 0;
        self.jitter = Vec2::ZERO;
        self.jitter_uv = Vec2::ZERO;
        self.reset_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::SoftwareCamera;

    fn taa() -> TemporalAntialiasing {
        let mut effect = TemporalAntialiasing::new();
        effect.settings.enabled = true;
        effect.settings.method = AntialiasingMethod::Taa;
        effect
    }

    #[test]
    fn jitter_cycles_and_stays_inside_the_pixel() {
        let mut effect = taa();
        let first: Vec<Vec2> = (0..TAA_SAMPLE_COUNT).map(|_| effect.next_offset()).collect();
        let second: Vec<Vec2> = (0..TAA_SAMPLE_COUNT).map(|_| effect.next_offset()).collect();
        assert_eq!(first, second);
        for offset in first {
            assert!(offset.x.abs() <= 0.5 && offset.y.abs() <= 0.5);
        }
    }

    #[test]
    fn perspective_jitter_shifts_the_projection_center() {
        let mut camera = SoftwareCamera::new(64, 32);
        let original = camera.projection_matrix();
        let mut effect = taa();
        effect.set_projection_matrix(&mut camera, None);

        let jittered = camera.projection_matrix();
        let expected = effect.jitter() * 2.0 / Vec2::new(64.0, 32.0);
        approx::assert_relative_eq!(jittered.z_axis.x - original.z_axis.x, expected.x);
        approx::assert_relative_eq!(jittered.z_axis.y - original.z_axis.y, expected.y);
        assert_eq!(effect.jitter_uv(), effect.jitter() / Vec2::new(64.0, 32.0));
    }

    #[test]
    fn reset_restarts_the_sequence() {
        let mut effect = taa();
        let first = effect.next_offset();
        effect.next_offset();
        effect.reset_history();
        assert_eq!(effect.next_offset(), first);
    }
}
