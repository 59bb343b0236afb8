use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::utils::allocator::Handle;

/// Opaque handle to a texture owned by a [`GraphicsDevice`](crate::gpu::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub Handle);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex#{}v{}", self.0.index(), self.0.generation())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    Rgba8,
    #[default]
    RgbaHalf,
    RgbaFloat,
    RFloat,
    RHalf,
    RgHalf,
}

impl TextureFormat {
    pub fn is_half(self) -> bool {
        matches!(self, Self::RgbaHalf | Self::RHalf | Self::RgHalf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    Point,
    #[default]
    Bilinear,
}

/// Size and layout of a texture; pooled targets are matched on full equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: FilterMode,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            filter: FilterMode::Bilinear,
        }
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Same format, dimensions divided by `divisor` (never below one texel).
    pub fn downscaled(self, divisor: u32) -> Self {
        let divisor = divisor.max(1);
        Self {
            width: (self.width / divisor).max(1),
            height: (self.height / divisor).max(1),
            ..self
        }
    }

    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Auxiliary buffers a camera renders before post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthTextureMode(u8);

impl DepthTextureMode {
    pub const NONE: Self = Self(0);
    pub const DEPTH: Self = Self(1);
    pub const DEPTH_NORMALS: Self = Self(1 << 1);
    pub const MOTION_VECTORS: Self = Self(1 << 2);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DepthTextureMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DepthTextureMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Fixed points of the camera pipeline where command buffers can be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CameraEvent {
    BeforeDepthTexture,
    AfterDepthTexture,
    BeforeDepthNormalsTexture,
    AfterDepthNormalsTexture,
    BeforeGBuffer,
    AfterGBuffer,
    BeforeLighting,
    AfterLighting,
    BeforeFinalPass,
    AfterFinalPass,
    BeforeForwardOpaque,
    AfterForwardOpaque,
    BeforeImageEffectsOpaque,
    AfterImageEffectsOpaque,
    BeforeSkybox,
    AfterSkybox,
    BeforeForwardAlpha,
    AfterForwardAlpha,
    BeforeImageEffects,
    AfterImageEffects,
    AfterEverything,
    BeforeReflections,
    AfterReflections,
}

/// Whether the stack renders the game view or an editor-style preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderContextKind {
    #[default]
    Primary,
    /// Secondary camera: no jitter, no depth of field, no motion blur.
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    #[default]
    Linear,
    Gamma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingPath {
    #[default]
    Forward,
    Deferred,
}

/// Identity of each effect component, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    DebugViews,
    AmbientOcclusion,
    ScreenSpaceReflection,
    Fog,
    MotionBlur,
    TemporalAntialiasing,
    EyeAdaptation,
    DepthOfField,
    Bloom,
    ChromaticAberration,
    ColorGrading,
    UserLut,
    Grain,
    Vignette,
    Dithering,
    Fxaa,
}

impl EffectKind {
    pub const ALL: [EffectKind; 16] = [
        EffectKind::DebugViews,
        EffectKind::AmbientOcclusion,
        EffectKind::ScreenSpaceReflection,
        EffectKind::Fog,
        EffectKind::MotionBlur,
        EffectKind::TemporalAntialiasing,
        EffectKind::EyeAdaptation,
        EffectKind::DepthOfField,
        EffectKind::Bloom,
        EffectKind::ChromaticAberration,
        EffectKind::ColorGrading,
        EffectKind::UserLut,
        EffectKind::Grain,
        EffectKind::Vignette,
        EffectKind::Dithering,
        EffectKind::Fxaa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::DebugViews => "Builtin Debug Views",
            EffectKind::AmbientOcclusion => "Ambient Occlusion",
            EffectKind::ScreenSpaceReflection => "Screen Space Reflection",
            EffectKind::Fog => "Fog",
            EffectKind::MotionBlur => "Motion Blur",
            EffectKind::TemporalAntialiasing => "Temporal Anti-aliasing",
            EffectKind::EyeAdaptation => "Eye Adaptation",
            EffectKind::DepthOfField => "Depth Of Field",
            EffectKind::Bloom => "Bloom",
            EffectKind::ChromaticAberration => "Chromatic Aberration",
            EffectKind::ColorGrading => "Color Grading",
            EffectKind::UserLut => "User Lut",
            EffectKind::Grain => "Grain",
            EffectKind::Vignette => "Vignette",
            EffectKind::Dithering => "Dithering",
            EffectKind::Fxaa => "FXAA",
        }
    }

    /// Position in registration order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional hardware features some effects depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCaps {
    pub supports_motion_vectors: bool,
    pub supports_compute: bool,
    pub supports_half_formats: bool,
    pub max_texture_size: u32,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            supports_motion_vectors: true,
            supports_compute: true,
            supports_half_formats: true,
            max_texture_size: crate::config::MAX_TEXTURE_SIZE,
        }
    }
}
