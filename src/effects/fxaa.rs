use crate::config::shaders;
use crate::core::material::{uniforms, Material};
use crate::core::profile::{AntialiasingMethod, AntialiasingSettings, FxaaPreset};
use crate::core::types::{EffectKind, TextureId};
use crate::effects::component::{FrameContext, PostEffect};
use crate::error::Result;
use crate::gpu::GraphicsDevice;

/// Fast approximate antialiasing, run as the last full-screen pass.
#[derive(Debug, Default)]
pub struct Fxaa {
    settings: AntialiasingSettings,
    active: bool,
}

impl Fxaa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(&self) -> FxaaPreset {
        self.settings.fxaa_preset
    }

    /// Blits `source` into `destination` through `material`, which already
    /// carries any grain and dithering parameters.
    pub fn render(
        &self,
        device: &mut dyn GraphicsDevice,
        material: &mut Material,
        source: TextureId,
        destination: TextureId,
    ) -> Result<()> {
        let preset = self.settings.fxaa_preset;
        material.set_vector(uniforms::QUALITY_SETTINGS, preset.quality());
        material.set_vector(uniforms::CONSOLE_SETTINGS, preset.console());
        device.blit(Some(source), destination, Some(&*material), 0)
    }
}

impl PostEffect for Fxaa {
    fn kind(&self) -> EffectKind {
        EffectKind::Fxaa
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.antialiasing.clone();
        self.active =
            self.is_enabled() && !ctx.info.interrupted && ctx.has_shader(shaders::FXAA);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled && self.settings.method == AntialiasingMethod::Fxaa
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
