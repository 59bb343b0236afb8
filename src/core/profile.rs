//! Effect settings grouped into a shareable profile.
//!
//! A profile is plain data. The stack reads it once per frame through an
//! `Arc` and treats a different `Arc` (pointer identity, not value equality)
//! as a profile swap that resets every effect.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::core::types::TextureId;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessingProfile {
    pub debug_views: DebugViewsSettings,
    pub ambient_occlusion: AmbientOcclusionSettings,
    pub screen_space_reflection: ScreenSpaceReflectionSettings,
    pub fog: FogSettings,
    pub motion_blur: MotionBlurSettings,
    pub antialiasing: AntialiasingSettings,
    pub eye_adaptation: EyeAdaptationSettings,
    pub depth_of_field: DepthOfFieldSettings,
    pub bloom: BloomSettings,
    pub chromatic_aberration: ChromaticAberrationSettings,
    pub color_grading: ColorGradingSettings,
    pub user_lut: UserLutSettings,
    pub grain: GrainSettings,
    pub vignette: VignetteSettings,
    pub dithering: DitheringSettings,
}

impl PostProcessingProfile {
    /// Parses a profile from JSON; omitted fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DebugMode {
    #[default]
    None,
    Depth,
    Normals,
    MotionVectors,
    AmbientOcclusion,
    EyeAdaptation,
    FocusPlane,
    PreGradingLog,
    LogLut,
    UserLut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugViewsSettings {
    pub enabled: bool,
    pub mode: DebugMode,
    /// Multiplier applied to linear depth in the depth view.
    pub depth_scale: f32,
    /// Amplitude of the motion vector view.
    pub motion_amplitude: f32,
}

impl Default for DebugViewsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: DebugMode::None,
            depth_scale: 1.0,
            motion_amplitude: 1.0,
        }
    }
}

impl DebugViewsSettings {
    pub fn is_mode_active(&self, mode: DebugMode) -> bool {
        self.enabled && self.mode == mode
    }

    /// Debug views that replace the image outright; most effects stand down.
    pub fn will_interrupt(&self) -> bool {
        self.enabled
            && matches!(
                self.mode,
                DebugMode::Depth
                    | DebugMode::Normals
                    | DebugMode::MotionVectors
                    | DebugMode::AmbientOcclusion
                    | DebugMode::FocusPlane
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleCount {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
}

impl SampleCount {
    pub fn samples(self) -> u32 {
        match self {
            SampleCount::Lowest => 3,
            SampleCount::Low => 6,
            SampleCount::Medium => 10,
            SampleCount::High => 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionSettings {
    pub enabled: bool,
    pub intensity: f32,
    pub radius: f32,
    pub sample_count: SampleCount,
    pub downsampling: bool,
    pub force_forward_compatibility: bool,
    /// Deferred only: feed occlusion to ambient lighting instead of compositing it.
    pub ambient_only: bool,
    pub high_precision: bool,
}

impl Default for AmbientOcclusionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 1.0,
            radius: 0.3,
            sample_count: SampleCount::Medium,
            downsampling: true,
            force_forward_compatibility: false,
            ambient_only: false,
            high_precision: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenSpaceReflectionSettings {
    pub enabled: bool,
    pub intensity: f32,
    pub max_distance: f32,
    pub max_steps: u32,
    pub step_size: f32,
    pub thickness: f32,
    pub screen_edge_mask: f32,
}

impl Default for ScreenSpaceReflectionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.5,
            max_distance: 100.0,
            max_steps: 32,
            step_size: 1.0,
            thickness: 0.02,
            screen_edge_mask: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogSettings {
    pub enabled: bool,
    pub exclude_skybox: bool,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            exclude_skybox: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlurSettings {
    pub enabled: bool,
    /// Exposure time as a fraction of a full 360° rotation.
    pub shutter_angle: f32,
    pub sample_count: u32,
    /// Strength of blending with previous frames, `0..=1`.
    pub frame_blending: f32,
}

impl Default for MotionBlurSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            shutter_angle: 270.0,
            sample_count: 10,
            frame_blending: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AntialiasingMethod {
    #[default]
    Fxaa,
    Taa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FxaaPreset {
    ExtremePerformance,
    Performance,
    #[default]
    Default,
    Quality,
    ExtremeQuality,
}

impl FxaaPreset {
    /// `(subpixel removal, edge threshold, edge threshold min)`.
    pub fn quality(self) -> Vec4 {
        match self {
            FxaaPreset::ExtremePerformance => Vec4::new(0.0, 0.333, 0.0833, 0.0),
            FxaaPreset::Performance => Vec4::new(0.25, 0.25, 0.0833, 0.0),
            FxaaPreset::Default => Vec4::new(0.75, 0.166, 0.0833, 0.0),
            FxaaPreset::Quality => Vec4::new(1.0, 0.125, 0.0625, 0.0),
            FxaaPreset::ExtremeQuality => Vec4::new(1.0, 0.063, 0.0312, 0.0),
        }
    }

    /// `(subpixel spread, edge sharpness, edge threshold, edge threshold min)`.
    pub fn console(self) -> Vec4 {
        match self {
            FxaaPreset::ExtremePerformance | FxaaPreset::Performance => {
                Vec4::new(0.33, 8.0, 0.25, 0.06)
            }
            FxaaPreset::Default => Vec4::new(0.5, 4.0, 0.125, 0.04),
            FxaaPreset::Quality | FxaaPreset::ExtremeQuality => Vec4::new(0.5, 2.0, 0.125, 0.04),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaaSettings {
    pub jitter_spread: f32,
    pub sharpen: f32,
    pub stationary_blending: f32,
    pub motion_blending: f32,
}

impl Default for TaaSettings {
    fn default() -> Self {
        Self {
            jitter_spread: 0.75,
            sharpen: 0.3,
            stationary_blending: 0.95,
            motion_blending: 0.85,
        }
    }
}

/// FXAA and TAA share one block; `method` picks which one runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntialiasingSettings {
    pub enabled: bool,
    pub method: AntialiasingMethod,
    pub fxaa_preset: FxaaPreset,
    pub taa: TaaSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EyeAdaptationType {
    #[default]
    Progressive,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeAdaptationSettings {
    pub enabled: bool,
    /// Percentages of the luminance histogram ignored at the dark and bright ends.
    pub low_percent: f32,
    pub high_percent: f32,
    pub min_luminance: f32,
    pub max_luminance: f32,
    pub key_value: f32,
    pub dynamic_key_value: bool,
    pub adaptation_type: EyeAdaptationType,
    pub speed_up: f32,
    pub speed_down: f32,
}

impl Default for EyeAdaptationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            low_percent: 45.0,
            high_percent: 95.0,
            min_luminance: -5.0,
            max_luminance: 1.0,
            key_value: 0.25,
            dynamic_key_value: true,
            adaptation_type: EyeAdaptationType::Progressive,
            speed_up: 2.0,
            speed_down: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KernelSize {
    Small,
    #[default]
    Medium,
    Large,
    VeryLarge,
}

impl KernelSize {
    pub fn index(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthOfFieldSettings {
    pub enabled: bool,
    pub focus_distance: f32,
    pub aperture: f32,
    /// Millimeters; ignored when `use_camera_fov` is set.
    pub focal_length: f32,
    pub use_camera_fov: bool,
    pub kernel_size: KernelSize,
}

impl Default for DepthOfFieldSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            focus_distance: 10.0,
            aperture: 5.6,
            focal_length: 50.0,
            use_camera_fov: false,
            kernel_size: KernelSize::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    pub intensity: f32,
    /// Gamma-space threshold.
    pub threshold: f32,
    pub soft_knee: f32,
    pub radius: f32,
    pub anti_flicker: bool,
    pub lens_dirt_intensity: f32,
    #[serde(skip)]
    pub lens_dirt_texture: Option<TextureId>,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.5,
            threshold: 1.1,
            soft_knee: 0.5,
            radius: 4.0,
            anti_flicker: false,
            lens_dirt_intensity: 3.0,
            lens_dirt_texture: None,
        }
    }
}

impl BloomSettings {
    pub fn threshold_linear(&self) -> f32 {
        self.threshold.max(0.0).powf(2.2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaticAberrationSettings {
    pub enabled: bool,
    pub intensity: f32,
}

impl Default for ChromaticAberrationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tonemapper {
    None,
    #[default]
    Aces,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TonemappingSettings {
    pub tonemapper: Tonemapper,
    pub neutral_black_in: f32,
    pub neutral_white_in: f32,
    pub neutral_black_out: f32,
    pub neutral_white_out: f32,
    pub neutral_white_level: f32,
    pub neutral_white_clip: f32,
}

impl Default for TonemappingSettings {
    fn default() -> Self {
        Self {
            tonemapper: Tonemapper::Aces,
            neutral_black_in: 0.02,
            neutral_white_in: 10.0,
            neutral_black_out: 0.0,
            neutral_white_out: 10.0,
            neutral_white_level: 5.3,
            neutral_white_clip: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicGradingSettings {
    /// Exposure in EV applied before the LUT.
    pub post_exposure: f32,
    pub temperature: f32,
    pub tint: f32,
    /// Degrees.
    pub hue_shift: f32,
    pub saturation: f32,
    pub contrast: f32,
}

impl Default for BasicGradingSettings {
    fn default() -> Self {
        Self {
            post_exposure: 0.0,
            temperature: 0.0,
            tint: 0.0,
            hue_shift: 0.0,
            saturation: 1.0,
            contrast: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMixerSettings {
    pub red: Vec4,
    pub green: Vec4,
    pub blue: Vec4,
}

impl Default for ChannelMixerSettings {
    fn default() -> Self {
        Self {
            red: Vec4::new(1.0, 0.0, 0.0, 0.0),
            green: Vec4::new(0.0, 1.0, 0.0, 0.0),
            blue: Vec4::new(0.0, 0.0, 1.0, 0.0),
        }
    }
}

/// Lift/gamma/gain wheels; `w` is the luminance offset applied to all channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorWheelsSettings {
    pub lift: Vec4,
    pub gamma: Vec4,
    pub gain: Vec4,
}

impl Default for ColorWheelsSettings {
    fn default() -> Self {
        Self {
            lift: Vec4::ZERO,
            gamma: Vec4::ZERO,
            gain: Vec4::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGradingSettings {
    pub enabled: bool,
    pub tonemapping: TonemappingSettings,
    pub basic: BasicGradingSettings,
    pub channel_mixer: ChannelMixerSettings,
    pub color_wheels: ColorWheelsSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserLutSettings {
    pub enabled: bool,
    /// Strip of `size` slices laid out horizontally: `size² × size` texels.
    #[serde(skip)]
    pub lut: Option<TextureId>,
    pub contribution: f32,
}

impl Default for UserLutSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            lut: None,
            contribution: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainSettings {
    pub enabled: bool,
    pub colored: bool,
    pub intensity: f32,
    pub size: f32,
    pub luminance_contribution: f32,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            colored: true,
            intensity: 0.5,
            size: 1.0,
            luminance_contribution: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VignetteMode {
    #[default]
    Classic,
    Masked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteSettings {
    pub enabled: bool,
    pub mode: VignetteMode,
    pub color: Vec4,
    pub center: Vec2,
    pub intensity: f32,
    pub smoothness: f32,
    pub roundness: f32,
    pub rounded: bool,
    #[serde(skip)]
    pub mask: Option<TextureId>,
    pub opacity: f32,
}

impl Default for VignetteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: VignetteMode::Classic,
            color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            center: Vec2::splat(0.5),
            intensity: 0.45,
            smoothness: 0.2,
            roundness: 1.0,
            rounded: false,
            mask: None,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DitheringSettings {
    pub enabled: bool,
}
