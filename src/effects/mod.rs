//! The sixteen post-processing effects and the set the stack owns.

pub mod ambient_occlusion;
pub mod bloom;
pub mod chromatic_aberration;
pub mod color_grading;
pub mod component;
pub mod debug_views;
pub mod depth_of_field;
pub mod dithering;
pub mod eye_adaptation;
pub mod fog;
pub mod fxaa;
pub mod grain;
pub mod motion_blur;
pub mod screen_space_reflection;
pub mod taa;
pub mod user_lut;
pub mod vignette;

pub use ambient_occlusion::AmbientOcclusion;
pub use bloom::Bloom;
pub use chromatic_aberration::ChromaticAberration;
pub use color_grading::ColorGrading;
pub use component::{
    CommandBufferEffect, FrameContext, FrameInfo, FrameResources, LifecycleContext, PostEffect,
    UberEffect,
};
pub use debug_views::DebugViews;
pub use depth_of_field::{DepthOfField, TaaCoupling};
pub use dithering::Dithering;
pub use eye_adaptation::EyeAdaptation;
pub use fog::Fog;
pub use fxaa::Fxaa;
pub use grain::Grain;
pub use motion_blur::MotionBlur;
pub use screen_space_reflection::ScreenSpaceReflection;
pub use taa::{JitterFn, TemporalAntialiasing};
pub use user_lut::UserLut;
pub use vignette::Vignette;

use crate::core::types::EffectKind;

/// One instance of every effect, addressable by type or in registration order.
#[derive(Debug, Default)]
pub struct EffectSet {
    pub debug_views: DebugViews,
    pub ambient_occlusion: AmbientOcclusion,
    pub screen_space_reflection: ScreenSpaceReflection,
    pub fog: Fog,
    pub motion_blur: MotionBlur,
    pub taa: TemporalAntialiasing,
    pub eye_adaptation: EyeAdaptation,
    pub depth_of_field: DepthOfField,
    pub bloom: Bloom,
    pub chromatic_aberration: ChromaticAberration,
    pub color_grading: ColorGrading,
    pub user_lut: UserLut,
    pub grain: Grain,
    pub vignette: Vignette,
    pub dithering: Dithering,
    pub fxaa: Fxaa,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every effect in registration order.
    pub fn components(&self) -> [&dyn PostEffect; 16] {
        [
            &self.debug_views,
            &self.ambient_occlusion,
            &self.screen_space_reflection,
            &self.fog,
            &self.motion_blur,
            &self.taa,
            &self.eye_adaptation,
            &self.depth_of_field,
            &self.bloom,
            &self.chromatic_aberration,
            &self.color_grading,
            &self.user_lut,
            &self.grain,
            &self.vignette,
            &self.dithering,
            &self.fxaa,
        ]
    }

    pub fn components_mut(&mut self) -> [&mut dyn PostEffect; 16] {
        [
            &mut self.debug_views,
            &mut self.ambient_occlusion,
            &mut self.screen_space_reflection,
            &mut self.fog,
            &mut self.motion_blur,
            &mut self.taa,
            &mut self.eye_adaptation,
            &mut self.depth_of_field,
            &mut self.bloom,
            &mut self.chromatic_aberration,
            &mut self.color_grading,
            &mut self.user_lut,
            &mut self.grain,
            &mut self.vignette,
            &mut self.dithering,
            &mut self.fxaa,
        ]
    }

    pub fn get(&self, kind: EffectKind) -> &dyn PostEffect {
        self.components()[kind.index()]
    }

    /// Kinds of the effects currently active.
    pub fn active_kinds(&self) -> Vec<EffectKind> {
        self.components()
            .iter()
            .filter(|effect| effect.is_active())
            .map(|effect| effect.kind())
            .collect()
    }
}
