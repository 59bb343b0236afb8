use glam::Vec4;

use crate::config::shaders;
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::UserLutSettings;
use crate::core::types::{EffectKind, TextureDesc};
use crate::effects::component::{FrameContext, FrameInfo, PostEffect, UberEffect};

/// Artist-supplied lookup table applied in sRGB after grading.
#[derive(Debug, Default)]
pub struct UserLut {
    settings: UserLutSettings,
    lut_desc: Option<TextureDesc>,
    active: bool,
}

impl UserLut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &UserLutSettings {
        &self.settings
    }

    /// A strip LUT is `size` slices of `size × size` laid side by side.
    pub fn is_valid_strip(desc: &TextureDesc) -> bool {
        desc.height > 1 && desc.width == desc.height * desc.height
    }
}

impl PostEffect for UserLut {
    fn kind(&self) -> EffectKind {
        EffectKind::UserLut
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.user_lut.clone();
        self.lut_desc = self
            .settings
            .lut
            .and_then(|lut| ctx.device.texture_desc(lut));
        let valid = self.lut_desc.as_ref().is_some_and(Self::is_valid_strip);
        if self.settings.enabled && self.settings.lut.is_some() && !valid {
            log::warn!("User LUT ignored: expected a size² × size strip, got {:?}", self.lut_desc);
        }
        self.active = self.settings.enabled
            && valid
            && self.settings.contribution > 0.0
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

impl UberEffect for UserLut {
    fn prepare(&mut self, material: &mut Material, _info: &FrameInfo) -> bool {
        let (Some(lut), Some(desc)) = (self.settings.lut, self.lut_desc) else {
            return false;
        };
        material.set_texture(uniforms::USER_LUT, lut);
        material.set_vector(
            uniforms::USER_LUT_PARAMS,
            Vec4::new(
                1.0 / desc.width as f32,
                1.0 / desc.height as f32,
                desc.height as f32 - 1.0,
                self.settings.contribution.clamp(0.0, 1.0),
            ),
        );
        material.enable_keyword(keywords::USER_LUT);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TextureFormat;

    #[test]
    fn strip_layout_is_validated() {
        assert!(UserLut::is_valid_strip(&TextureDesc::new(256, 16, TextureFormat::Rgba8)));
        assert!(!UserLut::is_valid_strip(&TextureDesc::new(256, 256, TextureFormat::Rgba8)));
        assert!(!UserLut::is_valid_strip(&TextureDesc::new(1, 1, TextureFormat::Rgba8)));
    }
}
