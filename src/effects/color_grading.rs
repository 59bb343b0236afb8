//! Color grading baked into a log-encoded 3D LUT.
//!
//! Every grading operation (white balance, channel mixer, hue, saturation,
//! contrast, lift/gamma/gain, tonemapping) is evaluated once per LUT texel by
//! the LUT generator shader. The uber pass then only encodes to LogC and does
//! one trilinear lookup. The LUT is rebaked when the settings change.

use glam::{Vec3, Vec4};

use crate::config::{shaders, COLOR_GRADING_LUT_SIZE};
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::{ColorGradingSettings, DebugMode, Tonemapper, TonemappingSettings};
use crate::core::types::{EffectKind, TextureDesc, TextureId};
use crate::effects::component::{
    FrameContext, FrameInfo, FrameResources, LifecycleContext, PostEffect, UberEffect,
};
use crate::error::Result;
use crate::utils::math::lerp;

/// D65 white point in LMS space.
const D65_LMS: Vec3 = Vec3::new(0.949_237, 1.035_42, 1.087_28);

fn standard_illuminant_y(x: f32) -> f32 {
    2.87 * x - 3.0 * x * x - 0.275_095_07
}

fn cie_xy_to_lms(x: f32, y: f32) -> Vec3 {
    let big_y = 1.0;
    let big_x = big_y * x / y;
    let big_z = big_y * (1.0 - x - y) / y;
    Vec3::new(
        0.7328 * big_x + 0.4296 * big_y - 0.1624 * big_z,
        -0.7036 * big_x + 1.6975 * big_y + 0.0061 * big_z,
        0.0030 * big_x + 0.0136 * big_y + 0.9834 * big_z,
    )
}

/// Per-channel LMS gains for a temperature/tint pair in `-100..=100`.
pub fn white_balance(temperature: f32, tint: f32) -> Vec3 {
    let t1 = temperature / 55.0;
    let t2 = tint / 55.0;
    let x = 0.312_71 - t1 * if t1 < 0.0 { 0.1 } else { 0.05 };
    let y = standard_illuminant_y(x) + t2 * 0.05;
    D65_LMS / cie_xy_to_lms(x, y)
}

/// `(params1, params2)` for the neutral curve from artist-facing settings.
pub fn neutral_tonemapper_params(settings: &TonemappingSettings) -> (Vec4, Vec4) {
    const SCALE: f32 = 20.0;
    const HALF_SCALE: f32 = SCALE * 0.5;

    let in_black = settings.neutral_black_in * SCALE + 1.0;
    let out_black = settings.neutral_black_out * HALF_SCALE + 1.0;
    let in_white = settings.neutral_white_in / SCALE;
    let out_white = 1.0 - settings.neutral_white_out / SCALE;
    let black_ratio = in_black / out_black;
    let white_ratio = in_white / out_white;

    let a = 0.2;
    let b = lerp(0.57, 0.37, black_ratio).max(0.0);
    let c = lerp(0.01, 0.24, white_ratio);
    let d = lerp(0.02, 0.20, black_ratio).max(0.0);
    (
        Vec4::new(a, b, c, d),
        Vec4::new(
            0.02,
            0.30,
            settings.neutral_white_level,
            settings.neutral_white_clip / HALF_SCALE,
        ),
    )
}

#[derive(Debug, Default)]
pub struct ColorGrading {
    settings: ColorGradingSettings,
    debug_mode: DebugMode,
    active: bool,
    /// Settings the current LUT was baked with.
    baked: Option<ColorGradingSettings>,
    lut: Option<TextureId>,
}

impl ColorGrading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &ColorGradingSettings {
        &self.settings
    }

    /// The baked log LUT, once `bake_lut` has run.
    pub fn lut(&self) -> Option<TextureId> {
        self.lut
    }

    fn lut_desc(info: &FrameInfo) -> TextureDesc {
        let size = COLOR_GRADING_LUT_SIZE;
        TextureDesc::new(size * size, size, info.hdr_format())
    }

    /// Bakes the grading LUT into its history buffer if it is missing or
    /// the settings changed since the last bake.
    pub fn bake_lut(&mut self, res: &mut FrameResources<'_>, info: &FrameInfo) -> Result<TextureId> {
        let (lut, fresh) =
            res.history
                .ensure(res.device, EffectKind::ColorGrading, 0, Self::lut_desc(info))?;
        self.lut = Some(lut);
        if !fresh && self.baked.as_ref() == Some(&self.settings) {
            return Ok(lut);
        }

        let settings = &self.settings;
        let basic = &settings.basic;
        let wheels = &settings.color_wheels;
        let material = res.materials.get_mut(&*res.device, shaders::LUT_GENERATOR)?;
        material.clear_keywords();
        material.set_vector(
            uniforms::BALANCE,
            white_balance(basic.temperature, basic.tint).extend(1.0),
        );
        material.set_vector(uniforms::CHANNEL_MIXER_RED, settings.channel_mixer.red);
        material.set_vector(uniforms::CHANNEL_MIXER_GREEN, settings.channel_mixer.green);
        material.set_vector(uniforms::CHANNEL_MIXER_BLUE, settings.channel_mixer.blue);
        material.set_float(uniforms::HUE_SHIFT, basic.hue_shift.to_radians());
        material.set_float(uniforms::SATURATION, basic.saturation.max(0.0));
        material.set_float(uniforms::CONTRAST, basic.contrast.max(0.0));

        let lift = wheels.lift.truncate() * 0.1 + Vec3::splat(wheels.lift.w);
        let gain = Vec3::ONE + wheels.gain.truncate() * 0.5 + Vec3::splat(wheels.gain.w);
        let gamma = Vec3::ONE + wheels.gamma.truncate() * 0.5 + Vec3::splat(wheels.gamma.w);
        material.set_vector(uniforms::LIFT, lift.extend(0.0));
        material.set_vector(uniforms::GAIN, gain.extend(1.0));
        material.set_vector(
            uniforms::INV_GAMMA,
            (Vec3::ONE / gamma.max(Vec3::splat(1e-3))).extend(1.0),
        );

        let size = COLOR_GRADING_LUT_SIZE as f32;
        material.set_vector(
            uniforms::LUT_PARAMS,
            Vec4::new(size, 0.5 / (size * size), 0.5 / size, size / (size - 1.0)),
        );
        match settings.tonemapping.tonemapper {
            Tonemapper::None => {}
            Tonemapper::Aces => material.enable_keyword(keywords::TONEMAPPING_ACES),
            Tonemapper::Neutral => {
                let (params1, params2) = neutral_tonemapper_params(&settings.tonemapping);
                material.set_vector(uniforms::NEUTRAL_TONEMAPPER_PARAMS1, params1);
                material.set_vector(uniforms::NEUTRAL_TONEMAPPER_PARAMS2, params2);
                material.enable_keyword(keywords::TONEMAPPING_NEUTRAL);
            }
        }

        res.device.blit(None, lut, Some(&*material), 0)?;
        log::debug!("Baked color grading LUT into {lut}");
        self.baked = Some(self.settings.clone());
        Ok(lut)
    }
}

impl PostEffect for ColorGrading {
    fn kind(&self) -> EffectKind {
        EffectKind::ColorGrading
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.color_grading.clone();
        self.debug_mode = ctx.info.debug_mode;
        self.active = self.settings.enabled
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::UBER)
            && ctx.has_shader(shaders::LUT_GENERATOR);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn on_disable(&mut self, ctx: &mut LifecycleContext<'_>) {
        ctx.history.release_owned_by(ctx.device, EffectKind::ColorGrading);
        self.baked = None;
        self.lut = None;
    }
}

impl UberEffect for ColorGrading {
    fn prepare(&mut self, material: &mut Material, _info: &FrameInfo) -> bool {
        if self.debug_mode == DebugMode::PreGradingLog {
            material.enable_keyword(keywords::COLOR_GRADING_LOG_VIEW);
            return true;
        }

        let Some(lut) = self.lut else {
            return false;
        };
        let size = COLOR_GRADING_LUT_SIZE as f32;
        material.set_texture(uniforms::LOG_LUT, lut);
        material.set_vector(
            uniforms::LOG_LUT_PARAMS,
            Vec4::new(1.0 / (size * size), 1.0 / size, size - 1.0, 0.0),
        );
        material.set_float(
            uniforms::EXPOSURE_EV,
            self.settings.basic.post_exposure.exp2(),
        );
        material.enable_keyword(keywords::COLOR_GRADING);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_white_balance_is_identity() {
        let balance = white_balance(0.0, 0.0);
        approx::assert_relative_eq!(balance.x, 1.0, epsilon = 1e-2);
        approx::assert_relative_eq!(balance.y, 1.0, epsilon = 1e-2);
        approx::assert_relative_eq!(balance.z, 1.0, epsilon = 1e-2);
    }

    #[test]
    fn warmer_temperature_boosts_long_wavelengths() {
        let warm = white_balance(50.0, 0.0);
        assert!(warm.x / warm.z > 1.0);
    }

    #[test]
    fn default_neutral_params_map_white_level() {
        let (params1, params2) = neutral_tonemapper_params(&TonemappingSettings::default());
        assert_eq!(params1.x, 0.2);
        assert_eq!(params2.z, 5.3);
        approx::assert_relative_eq!(params2.w, 1.0);
    }
}
