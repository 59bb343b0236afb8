use glam::Vec4;

use crate::config::{shaders, DITHERING_TEXTURE_COUNT, DITHERING_TILE_SIZE};
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::DitheringSettings;
use crate::core::types::EffectKind;
use crate::effects::component::{FrameContext, FrameInfo, PostEffect, UberEffect};
use crate::utils::math::hash_noise;

/// Triangular-noise dithering against 8-bit banding.
#[derive(Debug, Default)]
pub struct Dithering {
    settings: DitheringSettings,
    active: bool,
    texture_index: u32,
}

impl Dithering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &DitheringSettings {
        &self.settings
    }
}

impl PostEffect for Dithering {
    fn kind(&self) -> EffectKind {
        EffectKind::Dithering
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.dithering.clone();
        self.active =
            self.settings.enabled && !ctx.info.interrupted && ctx.has_shader(shaders::UBER);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl UberEffect for Dithering {
    fn prepare(&mut self, material: &mut Material, info: &FrameInfo) -> bool {
        self.texture_index = (self.texture_index + 1) % DITHERING_TEXTURE_COUNT;
        let index = self.texture_index;
        material.set_vector(
            uniforms::DITHERING_COORDS,
            Vec4::new(
                info.camera.width as f32 / DITHERING_TILE_SIZE,
                info.camera.height as f32 / DITHERING_TILE_SIZE,
                hash_noise(index, 1, 0x2b),
                hash_noise(1, index, 0x2b),
            ),
        );
        material.enable_keyword(keywords::DITHERING);
        true
    }
}
