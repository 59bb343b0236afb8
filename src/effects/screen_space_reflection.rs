use glam::Vec4;

use crate::config::shaders;
use crate::core::command_buffer::{CommandBuffer, RenderTargetRef};
use crate::core::material::uniforms;
use crate::core::profile::ScreenSpaceReflectionSettings;
use crate::core::types::{CameraEvent, DepthTextureMode, EffectKind, FilterMode, RenderingPath};
use crate::effects::component::{
    CommandBufferEffect, FrameContext, FrameInfo, FrameResources, PostEffect,
};
use crate::error::Result;

/// Screen-space reflections traced against the depth-normals buffer.
/// Deferred cameras only.
#[derive(Debug, Default)]
pub struct ScreenSpaceReflection {
    settings: ScreenSpaceReflectionSettings,
    active: bool,
}

impl ScreenSpaceReflection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &ScreenSpaceReflectionSettings {
        &self.settings
    }
}

impl PostEffect for ScreenSpaceReflection {
    fn kind(&self) -> EffectKind {
        EffectKind::ScreenSpaceReflection
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.screen_space_reflection.clone();
        self.active = self.settings.enabled
            && ctx.info.camera.rendering_path == RenderingPath::Deferred
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::SCREEN_SPACE_REFLECTION);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn camera_flags(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH | DepthTextureMode::DEPTH_NORMALS
    }
}

impl CommandBufferEffect for ScreenSpaceReflection {
    fn camera_event(&self) -> CameraEvent {
        CameraEvent::AfterFinalPass
    }

    fn name(&self) -> &'static str {
        "Screen Space Reflection"
    }

    fn populate_command_buffer(
        &mut self,
        buffer: &mut CommandBuffer,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
    ) -> Result<()> {
        let far = info.camera.far_clip.max(1e-3);
        let material = res
            .materials
            .get_mut(&*res.device, shaders::SCREEN_SPACE_REFLECTION)?;
        material.set_vector(
            uniforms::SSR_PARAMS,
            Vec4::new(
                self.settings.intensity,
                self.settings.step_size,
                self.settings.thickness,
                (self.settings.max_distance / far).clamp(0.0, 1.5),
            ),
        );
        material.set_float(uniforms::MAX_STEPS, self.settings.max_steps as f32);
        material.set_float(uniforms::SCREEN_EDGE_MASK, self.settings.screen_edge_mask);

        let reflections = RenderTargetRef::Temporary(uniforms::REFLECTION_TEXTURE);
        buffer.get_temporary(
            uniforms::REFLECTION_TEXTURE,
            info.camera.width,
            info.camera.height,
            info.hdr_format(),
            FilterMode::Bilinear,
        );
        buffer.blit_material(RenderTargetRef::CameraTarget, reflections, material, 0);
        buffer.blit_material(reflections, RenderTargetRef::CameraTarget, material, 1);
        buffer.release_temporary(uniforms::REFLECTION_TEXTURE);
        Ok(())
    }
}
