use crate::config::shaders;
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::ChromaticAberrationSettings;
use crate::core::types::EffectKind;
use crate::effects::component::{FrameContext, FrameInfo, PostEffect, UberEffect};

/// Radial red/blue channel split towards the screen edges.
#[derive(Debug, Default)]
pub struct ChromaticAberration {
    settings: ChromaticAberrationSettings,
    active: bool,
}

impl ChromaticAberration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &ChromaticAberrationSettings {
        &self.settings
    }
}

impl PostEffect for ChromaticAberration {
    fn kind(&self) -> EffectKind {
        EffectKind::ChromaticAberration
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.chromatic_aberration.clone();
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

impl UberEffect for ChromaticAberration {
    fn prepare(&mut self, material: &mut Material, _info: &FrameInfo) -> bool {
        material.set_float(
            uniforms::CHROMATIC_ABERRATION_AMOUNT,
            self.settings.intensity * 0.03,
        );
        material.enable_keyword(keywords::CHROMATIC_ABERRATION);
        true
    }
}
