use crate::config::shaders;
use crate::core::camera::{FogMode, SceneFog};
use crate::core::command_buffer::{CommandBuffer, RenderTargetRef};
use crate::core::material::{keywords, uniforms};
use crate::core::profile::FogSettings;
use crate::core::types::{CameraEvent, DepthTextureMode, EffectKind, FilterMode, RenderingPath};
use crate::effects::component::{
    CommandBufferEffect, FrameContext, FrameInfo, FrameResources, PostEffect,
};
use crate::error::Result;

/// Replays the camera's scene fog over deferred geometry, which the
/// forward fog path never touches.
#[derive(Debug, Default)]
pub struct Fog {
    settings: FogSettings,
    scene_fog: SceneFog,
    active: bool,
}

impl Fog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &FogSettings {
        &self.settings
    }
}

impl PostEffect for Fog {
    fn kind(&self) -> EffectKind {
        EffectKind::Fog
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.fog.clone();
        self.scene_fog = ctx.info.camera.fog;
        self.active = self.settings.enabled
            && self.scene_fog.enabled
            && ctx.info.camera.rendering_path == RenderingPath::Deferred
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::FOG);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn camera_flags(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH
    }
}

impl CommandBufferEffect for Fog {
    fn camera_event(&self) -> CameraEvent {
        CameraEvent::AfterImageEffectsOpaque
    }

    fn name(&self) -> &'static str {
        "Fog"
    }

    fn populate_command_buffer(
        &mut self,
        buffer: &mut CommandBuffer,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
    ) -> Result<()> {
        let fog = self.scene_fog;
        let material = res.materials.get_mut(&*res.device, shaders::FOG)?;
        material.clear_keywords();
        material.set_vector(uniforms::FOG_COLOR, fog.color);
        material.set_float(uniforms::FOG_DENSITY, fog.density);
        material.set_float(uniforms::FOG_START, fog.start);
        material.set_float(uniforms::FOG_END, fog.end);
        material.set_float(uniforms::FAR_CLIP, info.camera.far_clip);
        material.enable_keyword(match fog.mode {
            FogMode::Linear => keywords::FOG_LINEAR,
            FogMode::Exponential => keywords::FOG_EXP,
            FogMode::ExponentialSquared => keywords::FOG_EXP2,
        });

        let temp = RenderTargetRef::Temporary(uniforms::FOG_TEMP);
        buffer.get_temporary(
            uniforms::FOG_TEMP,
            info.camera.width,
            info.camera.height,
            info.hdr_format(),
            FilterMode::Bilinear,
        );
        buffer.blit(RenderTargetRef::CameraTarget, temp);
        let pass = if self.settings.exclude_skybox { 1 } else { 0 };
        buffer.blit_material(temp, RenderTargetRef::CameraTarget, material, pass);
        buffer.release_temporary(uniforms::FOG_TEMP);
        Ok(())
    }
}
