use std::collections::VecDeque;

use crate::config::POOL_MAX_IDLE_FRAMES;
use crate::core::types::{TextureDesc, TextureId};
use crate::error::{PostFxError, Result};
use crate::gpu::GraphicsDevice;

/// Pool bookkeeping for one scratch target
#[derive(Debug, Clone, Copy)]
struct PooledTarget {
    texture: TextureId,
    desc: TextureDesc,
    last_used_frame: u64,
}

/// Scratch render targets reused across frames.
///
/// Everything acquired during a frame is handed back by [`release_all`]
/// once composition is done. Free targets that stay unused for more than
/// [`POOL_MAX_IDLE_FRAMES`] frames are destroyed.
///
/// [`release_all`]: RenderTexturePool::release_all
#[derive(Debug, Default)]
pub struct RenderTexturePool {
    available: VecDeque<PooledTarget>,
    in_use: Vec<PooledTarget>,
    total_allocated: usize,
    frame: u64,
}

impl RenderTexturePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a target with the same size and format as `reference`.
    pub fn acquire(
        &mut self,
        device: &mut dyn GraphicsDevice,
        reference: TextureId,
    ) -> Result<TextureId> {
        let desc = device
            .texture_desc(reference)
            .ok_or(PostFxError::InvalidTexture(reference))?;
        self.acquire_desc(device, desc)
    }

    /// Acquires a target matching `desc` exactly.
    pub fn acquire_desc(
        &mut self,
        device: &mut dyn GraphicsDevice,
        desc: TextureDesc,
    ) -> Result<TextureId> {
        if let Some(position) = self.available.iter().position(|target| target.desc == desc) {
            if let Some(mut target) = self.available.remove(position) {
                log::debug!(
                    "Reusing pooled target {} ({}x{})",
                    target.texture,
                    desc.width,
                    desc.height
                );
                target.last_used_frame = self.frame;
                self.in_use.push(target);
                return Ok(target.texture);
            }
        }

        let texture = device.create_texture(desc, "pooled target")?;
        log::info!(
            "Allocating pooled target {texture} ({}x{} {:?})",
            desc.width,
            desc.height,
            desc.format
        );
        self.total_allocated += 1;
        self.in_use.push(PooledTarget {
            texture,
            desc,
            last_used_frame: self.frame,
        });
        Ok(texture)
    }

    /// Returns one target before the end of the frame.
    pub fn release(&mut self, texture: TextureId) {
        if let Some(position) = self.in_use.iter().position(|target| target.texture == texture) {
            let target = self.in_use.swap_remove(position);
            self.available.push_back(target);
        }
    }

    /// Returns every target acquired this frame and advances the frame counter.
    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        self.available.extend(self.in_use.drain(..));

        let frame = self.frame;
        let mut trimmed = 0;
        self.available.retain(|target| {
            let idle = frame.saturating_sub(target.last_used_frame);
            if idle > u64::from(POOL_MAX_IDLE_FRAMES) {
                device.destroy_texture(target.texture);
                trimmed += 1;
                false
            } else {
                true
            }
        });
        if trimmed > 0 {
            log::debug!("Trimmed {trimmed} idle pooled targets");
        }

        self.frame += 1;
    }

    /// Destroys every target, in use or not.
    pub fn dispose(&mut self, device: &mut dyn GraphicsDevice) {
        let count = self.available.len() + self.in_use.len();
        for target in self.available.drain(..).chain(self.in_use.drain(..)) {
            device.destroy_texture(target.texture);
        }
        if count > 0 {
            log::info!("Render texture pool disposed: {count} targets destroyed");
        }
    }

    /// `(available, in use, total allocated)`
    pub fn stats(&self) -> (usize, usize, usize) {
        (self.available.len(), self.in_use.len(), self.total_allocated)
    }

    pub fn is_in_use(&self, texture: TextureId) -> bool {
        self.in_use.iter().any(|target| target.texture == texture)
    }
}
