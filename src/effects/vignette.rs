use glam::Vec4;

use crate::config::shaders;
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::{VignetteMode, VignetteSettings};
use crate::core::types::EffectKind;
use crate::effects::component::{FrameContext, FrameInfo, PostEffect, UberEffect};

/// Edge darkening, either procedural (classic) or from a mask texture.
#[derive(Debug, Default)]
pub struct Vignette {
    settings: VignetteSettings,
    active: bool,
}

impl Vignette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &VignetteSettings {
        &self.settings
    }
}

impl PostEffect for Vignette {
    fn kind(&self) -> EffectKind {
        EffectKind::Vignette
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.vignette.clone();
        let visible = match self.settings.mode {
            VignetteMode::Classic => self.settings.intensity > 0.0,
            VignetteMode::Masked => self.settings.mask.is_some() && self.settings.opacity > 0.0,
        };
        self.active = self.settings.enabled
            && visible
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

impl UberEffect for Vignette {
    fn prepare(&mut self, material: &mut Material, _info: &FrameInfo) -> bool {
        let settings = &self.settings;
        material.set_vector(uniforms::VIGNETTE_COLOR, settings.color);

        match settings.mode {
            VignetteMode::Classic => {
                let roundness = (1.0 - settings.roundness) * 6.0 + settings.roundness;
                material.set_vector(
                    uniforms::VIGNETTE_CENTER,
                    Vec4::new(settings.center.x, settings.center.y, 0.0, 0.0),
                );
                material.set_vector(
                    uniforms::VIGNETTE_SETTINGS,
                    Vec4::new(
                        settings.intensity * 3.0,
                        settings.smoothness * 5.0,
                        roundness,
                        if settings.rounded { 1.0 } else { 0.0 },
                    ),
                );
                material.enable_keyword(keywords::VIGNETTE_CLASSIC);
            }
            VignetteMode::Masked => {
                let Some(mask) = settings.mask else {
                    return false;
                };
                material.set_texture(uniforms::VIGNETTE_MASK, mask);
                material.set_float(uniforms::VIGNETTE_OPACITY, settings.opacity.clamp(0.0, 1.0));
                material.enable_keyword(keywords::VIGNETTE_MASKED);
            }
        }
        true
    }
}
