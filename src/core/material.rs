//! Shader parameter blocks.
//!
//! A [`Material`] is a shader plus named floats, vectors, textures and enabled
//! keywords. Parameter names are the compatibility surface between effects and
//! shaders; they live in [`uniforms`] and [`keywords`].

use glam::Vec4;
use std::collections::{BTreeSet, HashMap};

use crate::core::types::TextureId;

/// Device-side identity of a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    shader: ShaderId,
    shader_name: String,
    floats: HashMap<&'static str, f32>,
    vectors: HashMap<&'static str, Vec4>,
    textures: HashMap<&'static str, TextureId>,
    keywords: BTreeSet<&'static str>,
}

impl Material {
    pub fn new(shader: ShaderId, shader_name: impl Into<String>) -> Self {
        Self {
            shader,
            shader_name: shader_name.into(),
            floats: HashMap::new(),
            vectors: HashMap::new(),
            textures: HashMap::new(),
            keywords: BTreeSet::new(),
        }
    }

    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    pub fn set_float(&mut self, name: &'static str, value: f32) {
        self.floats.insert(name, value);
    }

    pub fn set_vector(&mut self, name: &'static str, value: Vec4) {
        self.vectors.insert(name, value);
    }

    pub fn set_texture(&mut self, name: &'static str, texture: TextureId) {
        self.textures.insert(name, texture);
    }

    pub fn clear_texture(&mut self, name: &'static str) {
        self.textures.remove(name);
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.floats.get(name).copied()
    }

    pub fn vector(&self, name: &str) -> Option<Vec4> {
        self.vectors.get(name).copied()
    }

    pub fn texture(&self, name: &str) -> Option<TextureId> {
        self.textures.get(name).copied()
    }

    pub fn enable_keyword(&mut self, keyword: &'static str) {
        self.keywords.insert(keyword);
    }

    pub fn disable_keyword(&mut self, keyword: &'static str) {
        self.keywords.remove(keyword);
    }

    pub fn is_keyword_enabled(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    /// Resets the keyword set; parameters are left in place.
    pub fn clear_keywords(&mut self) {
        self.keywords.clear();
    }

    pub fn keywords(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keywords.iter().copied()
    }

    /// Whether any texture parameter points at `texture`.
    pub fn references(&self, texture: TextureId) -> bool {
        self.textures.values().any(|&bound| bound == texture)
    }
}

pub mod uniforms {
    pub const MAIN_TEX: &str = "_MainTex";
    pub const AUTO_EXPOSURE: &str = "_AutoExposure";
    pub const CAMERA_DEPTH_TEXTURE: &str = "_CameraDepthTexture";
    pub const CAMERA_DEPTH_NORMALS_TEXTURE: &str = "_CameraDepthNormalsTexture";
    pub const CAMERA_MOTION_VECTORS_TEXTURE: &str = "_CameraMotionVectorsTexture";
    pub const FAR_CLIP: &str = "_FarClip";

    pub const HISTORY_TEX: &str = "_HistoryTex";
    pub const JITTER: &str = "_Jitter";
    pub const SHARPEN_PARAMETERS: &str = "_SharpenParameters";
    pub const FINAL_BLEND_PARAMETERS: &str = "_FinalBlendParameters";

    pub const EYE_PARAMS: &str = "_Params";
    pub const EYE_SPEED: &str = "_Speed";
    pub const EYE_EXPOSURE_COMPENSATION: &str = "_ExposureCompensation";

    pub const DEPTH_OF_FIELD_TEX: &str = "_DepthOfFieldTex";
    pub const DEPTH_OF_FIELD_PARAMS: &str = "_DepthOfFieldParams";
    pub const TAA_PARAMS: &str = "_TaaParams";
    pub const COC_TEX: &str = "_CoCTex";
    pub const COC_HISTORY: &str = "_CoCHistory";

    pub const BLOOM_TEX: &str = "_BloomTex";
    pub const BLOOM_SETTINGS: &str = "_Bloom_Settings";
    pub const BLOOM_DIRT_TEX: &str = "_Bloom_DirtTex";
    pub const BLOOM_DIRT_INTENSITY: &str = "_Bloom_DirtIntensity";
    pub const BASE_TEX: &str = "_BaseTex";
    pub const THRESHOLD: &str = "_Threshold";
    pub const CURVE: &str = "_Curve";
    pub const PREFILTER_OFFS: &str = "_PrefilterOffs";
    pub const SAMPLE_SCALE: &str = "_SampleScale";

    pub const CHROMATIC_ABERRATION_AMOUNT: &str = "_ChromaticAberration_Amount";

    pub const LOG_LUT: &str = "_LogLut";
    pub const LOG_LUT_PARAMS: &str = "_LogLut_Params";
    pub const EXPOSURE_EV: &str = "_ExposureEV";
    pub const LUT_PARAMS: &str = "_LutParams";
    pub const NEUTRAL_TONEMAPPER_PARAMS1: &str = "_NeutralTonemapperParams1";
    pub const NEUTRAL_TONEMAPPER_PARAMS2: &str = "_NeutralTonemapperParams2";
    pub const HUE_SHIFT: &str = "_HueShift";
    pub const SATURATION: &str = "_Saturation";
    pub const CONTRAST: &str = "_Contrast";
    pub const BALANCE: &str = "_Balance";
    pub const LIFT: &str = "_Lift";
    pub const INV_GAMMA: &str = "_InvGamma";
    pub const GAIN: &str = "_Gain";
    pub const CHANNEL_MIXER_RED: &str = "_ChannelMixerRed";
    pub const CHANNEL_MIXER_GREEN: &str = "_ChannelMixerGreen";
    pub const CHANNEL_MIXER_BLUE: &str = "_ChannelMixerBlue";

    pub const USER_LUT: &str = "_UserLut";
    pub const USER_LUT_PARAMS: &str = "_UserLut_Params";

    pub const GRAIN_PARAMS1: &str = "_Grain_Params1";
    pub const GRAIN_PARAMS2: &str = "_Grain_Params2";

    pub const DITHERING_COORDS: &str = "_DitheringCoords";

    pub const VIGNETTE_COLOR: &str = "_Vignette_Color";
    pub const VIGNETTE_CENTER: &str = "_Vignette_Center";
    pub const VIGNETTE_SETTINGS: &str = "_Vignette_Settings";
    pub const VIGNETTE_MASK: &str = "_Vignette_Mask";
    pub const VIGNETTE_OPACITY: &str = "_Vignette_Opacity";

    pub const QUALITY_SETTINGS: &str = "_QualitySettings";
    pub const CONSOLE_SETTINGS: &str = "_ConsoleSettings";

    pub const OCCLUSION_TEXTURE: &str = "_OcclusionTexture";
    pub const OCCLUSION_TEXTURE1: &str = "_OcclusionTexture1";
    pub const OCCLUSION_TEXTURE2: &str = "_OcclusionTexture2";
    pub const INTENSITY: &str = "_Intensity";
    pub const RADIUS: &str = "_Radius";
    pub const DOWNSAMPLE: &str = "_Downsample";
    pub const SAMPLE_COUNT: &str = "_SampleCount";

    pub const REFLECTION_TEXTURE: &str = "_ReflectionTexture";
    pub const SSR_PARAMS: &str = "_SSRParams";
    pub const MAX_STEPS: &str = "_MaxSteps";
    pub const SCREEN_EDGE_MASK: &str = "_ScreenEdgeMask";

    pub const FOG_TEMP: &str = "_FogTemp";
    pub const FOG_COLOR: &str = "_FogColor";
    pub const FOG_DENSITY: &str = "_Density";
    pub const FOG_START: &str = "_Start";
    pub const FOG_END: &str = "_End";

    pub const MOTION_BLUR_TEMP: &str = "_MotionBlurTemp";
    pub const VELOCITY_SCALE: &str = "_VelocityScale";
    pub const HISTORY1_TEX: &str = "_History1Tex";
    pub const HISTORY2_TEX: &str = "_History2Tex";
    pub const HISTORY3_TEX: &str = "_History3Tex";
    pub const HISTORY4_TEX: &str = "_History4Tex";
    pub const HISTORY_WEIGHTS: &str = "_HistoryWeights";

    pub const DEBUG_TEMP: &str = "_DebugViewTemp";
    pub const DEPTH_SCALE: &str = "_DepthScale";
    pub const OPACITY: &str = "_Opacity";
    pub const AMPLITUDE: &str = "_Amplitude";
}

pub mod keywords {
    pub const BLOOM: &str = "BLOOM";
    pub const BLOOM_LENS_DIRT: &str = "BLOOM_LENS_DIRT";
    pub const ANTI_FLICKER: &str = "ANTI_FLICKER";
    pub const EYE_ADAPTATION: &str = "EYE_ADAPTATION";
    pub const DEPTH_OF_FIELD: &str = "DEPTH_OF_FIELD";
    pub const DEPTH_OF_FIELD_COC_VIEW: &str = "DEPTH_OF_FIELD_COC_VIEW";
    pub const CHROMATIC_ABERRATION: &str = "CHROMATIC_ABERRATION";
    pub const COLOR_GRADING: &str = "COLOR_GRADING";
    pub const COLOR_GRADING_LOG_VIEW: &str = "COLOR_GRADING_LOG_VIEW";
    pub const TONEMAPPING_ACES: &str = "TONEMAPPING_ACES";
    pub const TONEMAPPING_NEUTRAL: &str = "TONEMAPPING_NEUTRAL";
    pub const USER_LUT: &str = "USER_LUT";
    pub const VIGNETTE_CLASSIC: &str = "VIGNETTE_CLASSIC";
    pub const VIGNETTE_MASKED: &str = "VIGNETTE_MASKED";
    pub const GRAIN: &str = "GRAIN";
    pub const GRAIN_COLORED: &str = "GRAIN_COLORED";
    pub const DITHERING: &str = "DITHERING";
    pub const COLORSPACE_GAMMA: &str = "COLORSPACE_GAMMA";
    pub const FOG_LINEAR: &str = "FOG_LINEAR";
    pub const FOG_EXP: &str = "FOG_EXP";
    pub const FOG_EXP2: &str = "FOG_EXP2";
    pub const SOURCE_DEPTHNORMALS: &str = "SOURCE_DEPTHNORMALS";
    pub const AO_DEBUG: &str = "AO_DEBUG";
}
