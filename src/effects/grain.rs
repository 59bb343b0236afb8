use glam::Vec4;

use crate::config::{shaders, GRAIN_LOOKUP_SIZE};
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::GrainSettings;
use crate::core::types::EffectKind;
use crate::effects::component::{FrameContext, FrameInfo, PostEffect, UberEffect};
use crate::utils::math::hash_noise;

/// Animated film grain, tiled over the screen with a per-frame offset.
#[derive(Debug, Default)]
pub struct Grain {
    settings: GrainSettings,
    active: bool,
}

impl Grain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &GrainSettings {
        &self.settings
    }
}

impl PostEffect for Grain {
    fn kind(&self) -> EffectKind {
        EffectKind::Grain
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.grain.clone();
        self.active = self.settings.enabled
            && self.settings.intensity > 0.0
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::UBER);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl UberEffect for Grain {
    fn prepare(&mut self, material: &mut Material, info: &FrameInfo) -> bool {
        let settings = &self.settings;
        let seed = info.frame_index as u32;
        let size = settings.size.max(0.3);
        material.set_vector(
            uniforms::GRAIN_PARAMS1,
            Vec4::new(
                settings.luminance_contribution,
                settings.intensity,
                0.0,
                0.0,
            ),
        );
        material.set_vector(
            uniforms::GRAIN_PARAMS2,
            Vec4::new(
                info.camera.width as f32 / GRAIN_LOOKUP_SIZE / size,
                info.camera.height as f32 / GRAIN_LOOKUP_SIZE / size,
                hash_noise(seed, 0, 0x67),
                hash_noise(0, seed, 0x67),
            ),
        );
        material.enable_keyword(keywords::GRAIN);
        if settings.colored {
            material.enable_keyword(keywords::GRAIN_COLORED);
        }
        true
    }
}
