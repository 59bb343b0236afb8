use glam::Vec4;

use crate::config::{shaders, BLOOM_MAX_ITERATIONS};
use crate::core::material::{keywords, uniforms, Material};
use crate::core::profile::BloomSettings;
use crate::core::types::{EffectKind, TextureDesc, TextureId};
use crate::effects::component::{FrameContext, FrameInfo, FrameResources, PostEffect};
use crate::error::{PostFxError, Result};

/// Mip chain layout derived from the source size and the bloom radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomChain {
    pub iterations: usize,
    pub sample_scale: f32,
}

impl BloomChain {
    pub fn new(width: u32, height: u32, radius: f32) -> Self {
        let size = width.max(height).max(1) as f32;
        let log_h = size.log2() + radius - 8.0;
        let log_h_floor = log_h.floor();
        Self {
            iterations: (log_h_floor.max(1.0) as usize).min(BLOOM_MAX_ITERATIONS),
            sample_scale: 0.5 + log_h - log_h_floor,
        }
    }
}

/// Soft-knee bright-pass followed by a progressive down/upsample chain.
#[derive(Debug, Default)]
pub struct Bloom {
    settings: BloomSettings,
    active: bool,
}

impl Bloom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &BloomSettings {
        &self.settings
    }

    /// `(threshold - knee, 2 × knee, 0.25 / knee, 0)`.
    fn curve(&self) -> Vec4 {
        let threshold = self.settings.threshold_linear();
        let knee = threshold * self.settings.soft_knee + 1e-5;
        Vec4::new(threshold - knee, knee * 2.0, 0.25 / knee, 0.0)
    }

    /// Renders the bloom chain from `source` and binds the result on `uber`.
    ///
    /// `exposure` is the eye-adaptation texture (or neutral white) so the
    /// bright-pass sees the adapted image.
    pub fn prepare(
        &mut self,
        res: &mut FrameResources<'_>,
        _info: &FrameInfo,
        source: TextureId,
        uber: &mut Material,
        exposure: TextureId,
    ) -> Result<()> {
        let source_desc = res
            .device
            .texture_desc(source)
            .ok_or(PostFxError::InvalidTexture(source))?;
        let half = source_desc.downscaled(2);
        let chain = BloomChain::new(half.width, half.height, self.settings.radius);

        let material = res.materials.get_mut(&*res.device, shaders::BLOOM)?;
        material.clear_keywords();
        material.set_texture(uniforms::AUTO_EXPOSURE, exposure);
        material.set_float(uniforms::THRESHOLD, self.settings.threshold_linear());
        material.set_vector(uniforms::CURVE, self.curve());
        material.set_float(uniforms::PREFILTER_OFFS, 0.0);
        material.set_float(uniforms::SAMPLE_SCALE, chain.sample_scale);
        if self.settings.anti_flicker {
            material.enable_keyword(keywords::ANTI_FLICKER);
        }

        let prefiltered = res.pool.acquire_desc(res.device, half)?;
        res.device.blit(Some(source), prefiltered, Some(&*material), 0)?;

        let mut mips: Vec<TextureId> = Vec::with_capacity(chain.iterations);
        let mut last = prefiltered;
        let mut desc = half;
        for _ in 0..chain.iterations {
            desc = desc.downscaled(2);
            let mip = res.pool.acquire_desc(res.device, desc)?;
            res.device.blit(Some(last), mip, Some(&*material), 1)?;
            mips.push(mip);
            last = mip;
        }

        // Walk back up, adding each level onto the next larger one.
        for index in (0..mips.len().saturating_sub(1)).rev() {
            let base = mips[index];
            let desc = res
                .device
                .texture_desc(base)
                .ok_or(PostFxError::InvalidTexture(base))?;
            let up = res.pool.acquire_desc(res.device, desc)?;
            material.set_texture(uniforms::BASE_TEX, base);
            res.device.blit(Some(last), up, Some(&*material), 2)?;
            last = up;
        }

        let result = res.pool.acquire_desc(res.device, source_desc)?;
        material.set_texture(uniforms::BASE_TEX, prefiltered);
        res.device.blit(Some(last), result, Some(&*material), 2)?;

        uber.set_texture(uniforms::BLOOM_TEX, result);
        uber.set_vector(
            uniforms::BLOOM_SETTINGS,
            Vec4::new(
                chain.sample_scale,
                (self.settings.intensity / 10.0).exp2() - 1.0,
                0.0,
                0.0,
            ),
        );
        uber.enable_keyword(keywords::BLOOM);

        if let Some(dirt) = self.settings.lens_dirt_texture {
            if self.settings.lens_dirt_intensity > 0.0 {
                uber.set_texture(uniforms::BLOOM_DIRT_TEX, dirt);
                uber.set_float(uniforms::BLOOM_DIRT_INTENSITY, self.settings.lens_dirt_intensity);
                uber.enable_keyword(keywords::BLOOM_LENS_DIRT);
            }
        }

        log::trace!(
            "Bloom: {} iterations, sample scale {:.3}",
            chain.iterations,
            chain.sample_scale
        );
        Ok(())
    }
}

impl PostEffect for Bloom {
    fn kind(&self) -> EffectKind {
        EffectKind::Bloom
    }

    fn init(&mut self, ctx: &FrameContext<'_>) {
        self.settings = ctx.profile.bloom.clone();
        self.active = self.settings.enabled
            && self.settings.intensity > 0.0
            && !ctx.info.interrupted
            && ctx.has_shader(shaders::BLOOM);
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
