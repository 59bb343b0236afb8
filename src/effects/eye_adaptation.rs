use glam::Vec4;

use crate::config::shaders;
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::{EyeAdaptationSettings, EyeAdaptationType};
use crate::core::types::{EffectKind, FilterMode, TextureDesc, TextureFormat, TextureId};
use crate::effects::component::{FrameContext, FrameInfo, FrameResources, LifecycleContext, PostEffect};
use crate::error::Result;

/// Automatic exposure from the scene's luminance histogram.
///
/// The measured exposure is smoothed over time in a pair of 1×1 history
/// buffers used alternately as previous and current value.
#[derive(Debug, Default)]
pub struct EyeAdaptation {
    settings: EyeAdaptationSettings,
    active: bool,
    /// History slot written this frame.
    ping: u32,
    reset_requested: bool,
    current_exposure: Option<TextureId>,
}

impl EyeAdaptation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &EyeAdaptationSettings {
        &self.settings
    }

    /// The exposure texture produced by the last `prepare`.
    pub fn current_exposure(&self) -> Option<TextureId> {
        self.current_exposure
    }

    fn exposure_desc() -> TextureDesc {
        TextureDesc::new(1, 1, TextureFormat::RFloat).with_filter(FilterMode::Point)
    }

    /// Measures `source`, adapts towards it and binds the result on `uber`.
    /// Returns the 1×1 exposure texture.
    pub fn prepare(
        &mut self,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
        source: TextureId,
        uber: &mut Material,
    ) -> Result<TextureId> {
        let settings = &self.settings;
        let speed = Vec4::new(
            settings.speed_down.max(0.0),
            settings.speed_up.max(0.0),
            info.delta_time,
            if settings.dynamic_key_value { 1.0 } else { 0.0 },
        );
        let low = settings.low_percent.clamp(1.0, 99.0);
        let high = settings.high_percent.clamp(low + 1.0, 100.0);

        let material = res.materials.get_mut(&*res.device, shaders::EYE_ADAPTATION)?;
        material.set_vector(
            uniforms::EYE_PARAMS,
            Vec4::new(
                low * 0.01,
                high * 0.01,
                settings.min_luminance,
                settings.max_luminance,
            ),
        );
        material.set_vector(uniforms::EYE_SPEED, speed);
        material.set_float(uniforms::EYE_EXPOSURE_COMPENSATION, settings.key_value);

        let measured = res.pool.acquire_desc(res.device, Self::exposure_desc())?;
        res.device.blit(Some(source), measured, Some(&*material), 0)?;

        let previous_slot = self.ping;
        let current_slot = 1 - self.ping;
        let (previous, previous_fresh) = res.history.ensure(
            res.device,
            EffectKind::EyeAdaptation,
            previous_slot,
            Self::exposure_desc(),
        )?;
        let (current, _) = res.history.ensure(
            res.device,
            EffectKind::EyeAdaptation,
            current_slot,
            Self::exposure_desc(),
        )?;

        let instant = self.reset_requested
            || previous_fresh
            || settings.adaptation_type == EyeAdaptationType::Fixed;
        if instant {
            res.device.blit(Some(measured), current, None, 0)?;
        } else {
            material.set_texture(uniforms::HISTORY_TEX, previous);
            res.device.blit(Some(measured), current, Some(&*material), 1)?;
        }
        res.pool.release(measured);

        self.reset_requested = false;
        self.ping = current_slot;
        self.current_exposure = Some(current);

        uber.set_texture(uniforms::AUTO_EXPOSURE, current);
        uber.enable_keyword(keywords::EYE_ADAPTATION);
        log::trace!("Eye adaptation wrote history slot {current_slot} (instant: {instant})");
        Ok(current)
    }
}

impl PostEffect for EyeAdaptation {
    fn kind(&self) -> EffectKind {
        EffectKind::EyeAdaptation
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.eye_adaptation.clone();
        self.active = self.settings.enabled
            && ctx.info.caps.supports_compute
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::EYE_ADAPTATION);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn on_disable(&mut self, ctx: &mut LifecycleContext<'_>) {
        ctx.history.release_owned_by(ctx.device, EffectKind::EyeAdaptation);
        self.current_exposure = None;
        self.reset_history();
    }

    fn reset_history(&mut self) {
        self.ping = 0;
        self.reset_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::CameraSnapshot;
    use crate::core::profile::DebugMode;
    use crate::core::types::{ColorSpace, DeviceCaps, RenderContextKind};
    use crate::gpu::{GraphicsDevice, SoftwareDevice};
    use crate::resources::{HistoryBuffers, MaterialCache, RenderTexturePool};

    fn info() -> FrameInfo {
        FrameInfo {
            camera: CameraSnapshot::perspective(4, 4),
            render_context: RenderContextKind::Primary,
            debug_mode: DebugMode::None,
            interrupted: false,
            delta_time: 1.0 / 60.0,
            frame_index: 0,
            caps: DeviceCaps::default(),
            color_space: ColorSpace::Linear,
        }
    }

    #[test]
    fn fixed_adaptation_lands_on_the_measured_exposure() {
        let mut device = SoftwareDevice::new();
        let (mut pool, mut materials, mut history) = (
            RenderTexturePool::new(),
            MaterialCache::new(),
            HistoryBuffers::new(),
        );
        let source = device
            .upload(
                TextureDesc::new(4, 4, TextureFormat::RgbaFloat),
                &[Vec4::new(0.18, 0.18, 0.18, 1.0); 16],
            )
            .expect("upload");
        let mut uber = Material::new(
            device.find_shader(shaders::UBER).expect("uber shader"),
            shaders::UBER,
        );

        let mut effect = EyeAdaptation::new();
        effect.settings.enabled = true;
        effect.settings.adaptation_type = EyeAdaptationType::Fixed;
        effect.settings.dynamic_key_value = false;
        effect.settings.key_value = 0.18;

        let mut res = FrameResources {
            device: &mut device,
            pool: &mut pool,
            materials: &mut materials,
            history: &mut history,
        };
        let exposure = effect
            .prepare(&mut res, &info(), source, &mut uber)
            .expect("prepare");

        let value = device.read_texture(exposure).expect("read")[0].x;
        approx::assert_relative_eq!(value, 1.0, epsilon = 1e-3);
        assert_eq!(uber.texture(uniforms::AUTO_EXPOSURE), Some(exposure));
        assert!(uber.is_keyword_enabled(keywords::EYE_ADAPTATION));
        assert_eq!(history.count_for(EffectKind::EyeAdaptation), 2);
    }
}
