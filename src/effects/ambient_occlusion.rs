use crate::config::shaders;
use crate::core::command_buffer::{CommandBuffer, RenderTargetRef};
use crate::core::material::{keywords, uniforms};
use crate::core::profile::{AmbientOcclusionSettings, DebugMode};
use crate::core::types::{
    CameraEvent, DepthTextureMode, EffectKind, FilterMode, RenderingPath, TextureFormat,
};
use crate::effects::component::{
    CommandBufferEffect, FrameContext, FrameInfo, FrameResources, PostEffect,
};
use crate::error::Result;

/// Where the occlusion estimate reads depth from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcclusionSource {
    #[default]
    DepthTexture,
    DepthNormalsTexture,
}

/// Screen-space ambient occlusion.
///
/// In a deferred camera with `ambient_only` the result is published as
/// `_OcclusionTexture` before reflections so only ambient lighting is
/// darkened; otherwise it is multiplied over the opaque image.
#[derive(Debug, Default)]
pub struct AmbientOcclusion {
    settings: AmbientOcclusionSettings,
    rendering_path: RenderingPath,
    debug: bool,
    active: bool,
}

impl AmbientOcclusion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &AmbientOcclusionSettings {
        &self.settings
    }

    fn deferred(&self) -> bool {
        self.rendering_path == RenderingPath::Deferred
            && !self.settings.force_forward_compatibility
    }

    /// Occlusion feeds ambient lighting only; needs a deferred camera.
    pub fn ambient_only(&self) -> bool {
        self.settings.ambient_only && self.deferred()
    }

    pub fn occlusion_source(&self) -> OcclusionSource {
        if self.deferred() {
            OcclusionSource::DepthTexture
        } else {
            OcclusionSource::DepthNormalsTexture
        }
    }
}

impl PostEffect for AmbientOcclusion {
    fn kind(&self) -> EffectKind {
        EffectKind::AmbientOcclusion
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.ambient_occlusion.clone();
        self.rendering_path = ctx.info.camera.rendering_path;
        self.debug = ctx.info.debug_mode == DebugMode::AmbientOcclusion;
        self.active = self.settings.enabled
            && self.settings.intensity > 0.0
            && ctx.has_shader(shaders::AMBIENT_OCCLUSION);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn camera_flags(&self) -> DepthTextureMode {
        match self.occlusion_source() {
            OcclusionSource::DepthTexture => DepthTextureMode::DEPTH,
            OcclusionSource::DepthNormalsTexture => {
                DepthTextureMode::DEPTH | DepthTextureMode::DEPTH_NORMALS
            }
        }
    }
}

impl CommandBufferEffect for AmbientOcclusion {
    fn camera_event(&self) -> CameraEvent {
        if self.ambient_only() {
            CameraEvent::BeforeReflections
        } else {
            CameraEvent::BeforeImageEffectsOpaque
        }
    }

    fn name(&self) -> &'static str {
        "Ambient Occlusion"
    }

    fn populate_command_buffer(
        &mut self,
        buffer: &mut CommandBuffer,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
    ) -> Result<()> {
        let downsample = if self.settings.downsampling { 2 } else { 1 };
        let width = (info.camera.width / downsample).max(1);
        let height = (info.camera.height / downsample).max(1);
        let format = if self.settings.high_precision {
            info.hdr_format()
        } else {
            TextureFormat::Rgba8
        };

        let material = res.materials.get_mut(&*res.device, shaders::AMBIENT_OCCLUSION)?;
        material.clear_keywords();
        material.set_float(uniforms::INTENSITY, self.settings.intensity);
        material.set_float(uniforms::RADIUS, self.settings.radius);
        material.set_float(uniforms::DOWNSAMPLE, 1.0 / downsample as f32);
        material.set_float(
            uniforms::SAMPLE_COUNT,
            self.settings.sample_count.samples() as f32,
        );
        material.set_float(uniforms::FAR_CLIP, info.camera.far_clip);
        if self.occlusion_source() == OcclusionSource::DepthNormalsTexture {
            material.enable_keyword(keywords::SOURCE_DEPTHNORMALS);
        }
        if self.debug {
            material.enable_keyword(keywords::AO_DEBUG);
        }

        let raw = RenderTargetRef::Temporary(uniforms::OCCLUSION_TEXTURE1);
        let blurred = RenderTargetRef::Temporary(uniforms::OCCLUSION_TEXTURE2);
        buffer.get_temporary(
            uniforms::OCCLUSION_TEXTURE1,
            width,
            height,
            format,
            FilterMode::Bilinear,
        );
        buffer.blit_material(RenderTargetRef::CameraTarget, raw, material, 0);
        buffer.get_temporary(
            uniforms::OCCLUSION_TEXTURE2,
            width,
            height,
            format,
            FilterMode::Bilinear,
        );
        buffer.blit_material(raw, blurred, material, 1);
        buffer.release_temporary(uniforms::OCCLUSION_TEXTURE1);
        buffer.set_global_texture(uniforms::OCCLUSION_TEXTURE, blurred);

        if self.ambient_only() && !self.debug {
            // Lighting samples the global; the temporary lives to the end of the buffer.
            return Ok(());
        }

        buffer.blit_material(blurred, RenderTargetRef::CameraTarget, material, 2);
        buffer.release_temporary(uniforms::OCCLUSION_TEXTURE2);
        Ok(())
    }
}
