use glam::{Vec2, Vec4};

use crate::config::{shaders, FILM_HEIGHT};
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::{DebugMode, DepthOfFieldSettings};
use crate::core::types::{DepthTextureMode, EffectKind, TextureDesc, TextureFormat, TextureId};
use crate::effects::component::{FrameContext, FrameInfo, FrameResources, LifecycleContext, PostEffect};
use crate::error::{PostFxError, Result};

/// Jitter and history blending shared by TAA with the CoC passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaaCoupling {
    pub jitter_uv: Vec2,
    pub blending: f32,
}

/// Physically based depth of field with a gather bokeh at half resolution.
#[derive(Debug, Default)]
pub struct DepthOfField {
    settings: DepthOfFieldSettings,
    active: bool,
    taa_params: Vec4,
    reset_requested: bool,
}

impl DepthOfField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &DepthOfFieldSettings {
        &self.settings
    }

    /// `_TaaParams` written by the last `prepare`; zero unless TAA ran.
    pub fn taa_params(&self) -> Vec4 {
        self.taa_params
    }

    /// Focal length in meters.
    fn focal_length(&self, field_of_view: f32) -> f32 {
        if self.settings.use_camera_fov {
            let half_fov = field_of_view.to_radians() * 0.5;
            0.5 * FILM_HEIGHT / half_fov.tan()
        } else {
            self.settings.focal_length / 1000.0
        }
    }

    /// Largest circle of confusion as a fraction of screen height.
    fn max_coc_radius(&self, height: u32) -> f32 {
        let radius_in_pixels = self.settings.kernel_size.index() as f32 * 4.0 + 6.0;
        (radius_in_pixels / height.max(1) as f32).min(0.05)
    }

    /// `(focus distance, lens coefficient, max CoC, 1 / max CoC)`.
    pub fn lens_params(&self, info: &FrameInfo) -> Vec4 {
        let f = self.focal_length(info.camera.field_of_view);
        let s1 = self.settings.focus_distance.max(f);
        let coeff = f * f
            / (self.settings.aperture.max(1e-3) * (s1 - f).max(1e-4) * FILM_HEIGHT * 2.0);
        let max_coc = self.max_coc_radius(info.camera.height);
        Vec4::new(s1, coeff, max_coc, 1.0 / max_coc)
    }

    /// Computes CoC, blurs the half-resolution image and binds it on `uber`.
    pub fn prepare(
        &mut self,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
        source: TextureId,
        uber: &mut Material,
        taa: Option<TaaCoupling>,
    ) -> Result<()> {
        let source_desc = res
            .device
            .texture_desc(source)
            .ok_or(PostFxError::InvalidTexture(source))?;
        let (width, height) = (source_desc.width, source_desc.height);
        self.taa_params = taa.map_or(Vec4::ZERO, |taa| {
            Vec4::new(taa.jitter_uv.x, taa.jitter_uv.y, taa.blending, 0.0)
        });

        let params = self.lens_params(info);
        let material = res.materials.get_mut(&*res.device, shaders::DEPTH_OF_FIELD)?;
        material.set_vector(uniforms::DEPTH_OF_FIELD_PARAMS, params);
        material.set_vector(uniforms::TAA_PARAMS, self.taa_params);
        material.set_float(uniforms::FAR_CLIP, info.camera.far_clip);

        let coc_desc = TextureDesc::new(width, height, TextureFormat::RHalf);
        let coc = res.pool.acquire_desc(res.device, coc_desc)?;
        res.device.blit(Some(source), coc, Some(&*material), 0)?;

        let coc = if taa.is_some() {
            let (history, fresh) =
                res.history
                    .ensure(res.device, EffectKind::DepthOfField, 0, coc_desc)?;
            if fresh || self.reset_requested {
                res.device.blit(Some(coc), history, None, 0)?;
                self.reset_requested = false;
            }
            let filtered = res.pool.acquire_desc(res.device, coc_desc)?;
            material.set_texture(uniforms::COC_HISTORY, history);
            res.device.blit(Some(coc), filtered, Some(&*material), 1)?;
            res.device.blit(Some(filtered), history, None, 0)?;
            filtered
        } else {
            coc
        };
        material.set_texture(uniforms::COC_TEX, coc);

        let half = TextureDesc::new(width, height, info.hdr_format()).downscaled(2);
        let prefiltered = res.pool.acquire_desc(res.device, half)?;
        let bokeh = res.pool.acquire_desc(res.device, half)?;
        res.device.blit(Some(source), prefiltered, Some(&*material), 2)?;
        let bokeh_pass = 3 + self.settings.kernel_size.index();
        res.device.blit(Some(prefiltered), bokeh, Some(&*material), bokeh_pass)?;
        res.device.blit(Some(bokeh), prefiltered, Some(&*material), 7)?;
        res.pool.release(bokeh);

        uber.set_texture(uniforms::DEPTH_OF_FIELD_TEX, prefiltered);
        uber.set_vector(uniforms::DEPTH_OF_FIELD_PARAMS, params);
        if info.debug_mode == DebugMode::FocusPlane {
            uber.enable_keyword(keywords::DEPTH_OF_FIELD_COC_VIEW);
        } else {
            uber.enable_keyword(keywords::DEPTH_OF_FIELD);
        }
        log::trace!("Depth of field: bokeh pass {bokeh_pass}, params {params:?}");
        Ok(())
    }
}

impl PostEffect for DepthOfField {
    fn kind(&self) -> EffectKind {
        EffectKind::DepthOfField
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.depth_of_field.clone();
        self.active = self.settings.enabled
            && ctx.info.caps.supports_half_formats
            && ctx.has_shader(shaders::DEPTH_OF_FIELD);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn on_disable(&mut self, ctx: &mut LifecycleContext<'_>) {
        ctx.history.release_owned_by(ctx.device, EffectKind::DepthOfField);
        self.reset_history();
    }

    fn camera_flags(&self) -> DepthTextureMode {
        DepthTextureMode::DEPTH
    }

    fn reset_history(&mut self) {
        self.reset_requested = true;
    }
}
