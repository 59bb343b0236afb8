use crate::config::shaders;
use crate::core::command_buffer::{CommandBuffer, RenderTargetRef};
use crate::core::material::uniforms;
use crate::core::profile::{DebugMode, DebugViewsSettings};
use crate::core::types::{CameraEvent, DepthTextureMode, EffectKind, FilterMode};
use crate::effects::component::{
    CommandBufferEffect, FrameContext, FrameInfo, FrameResources, PostEffect,
};
use crate::error::Result;

/// Full-screen visualisation of the camera's depth, normals or motion vectors.
///
/// Other debug modes are served by the effect they inspect (ambient
/// occlusion, focus plane, pre-grading log) or by the debug overlay.
#[derive(Debug, Default)]
pub struct DebugViews {
    settings: DebugViewsSettings,
    motion_vectors_supported: bool,
    active: bool,
}

impl DebugViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &DebugViewsSettings {
        &self.settings
    }

    pub fn will_interrupt(&self) -> bool {
        self.settings.will_interrupt()
    }

    fn pass(&self) -> Option<u32> {
        match self.settings.mode {
            DebugMode::Depth => Some(0),
            DebugMode::Normals => Some(1),
            DebugMode::MotionVectors => Some(2),
            _ => None,
        }
    }
}

impl PostEffect for DebugViews {
    fn kind(&self) -> EffectKind {
        EffectKind::DebugViews
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.debug_views.clone();
        self.motion_vectors_supported = ctx.info.caps.supports_motion_vectors;
        let supported =
            self.settings.mode != DebugMode::MotionVectors || self.motion_vectors_supported;
        self.active = self.settings.enabled
            && self.pass().is_some()
            && supported
            && ctx.has_shader(shaders::DEBUG_VIEWS);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn camera_flags(&self) -> DepthTextureMode {
        match self.settings.mode {
            DebugMode::Depth => DepthTextureMode::DEPTH,
            DebugMode::Normals => DepthTextureMode::DEPTH_NORMALS,
            DebugMode::MotionVectors => DepthTextureMode::DEPTH | DepthTextureMode::MOTION_VECTORS,
            _ => DepthTextureMode::NONE,
        }
    }
}

impl CommandBufferEffect for DebugViews {
    fn camera_event(&self) -> CameraEvent {
        if self.settings.mode == DebugMode::MotionVectors {
            CameraEvent::BeforeImageEffects
        } else {
            CameraEvent::BeforeImageEffectsOpaque
        }
    }

    fn name(&self) -> &'static str {
        "Builtin Debug Views"
    }

    fn populate_command_buffer(
        &mut self,
        buffer: &mut CommandBuffer,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
    ) -> Result<()> {
        let Some(pass) = self.pass() else {
            return Ok(());
        };

        let material = res.materials.get_mut(&*res.device, shaders::DEBUG_VIEWS)?;
        material.set_float(uniforms::DEPTH_SCALE, self.settings.depth_scale);
        material.set_float(uniforms::AMPLITUDE, self.settings.motion_amplitude);
        material.set_float(uniforms::OPACITY, 1.0);

        let temp = RenderTargetRef::Temporary(uniforms::DEBUG_TEMP);
        buffer.get_temporary(
            uniforms::DEBUG_TEMP,
            info.camera.width,
            info.camera.height,
            info.hdr_format(),
            FilterMode::Bilinear,
        );
        buffer.blit(RenderTargetRef::CameraTarget, temp);
        buffer.blit_material(temp, RenderTargetRef::CameraTarget, material, pass);
        buffer.release_temporary(uniforms::DEBUG_TEMP);
        Ok(())
    }
}
