use crate::core::types::{EffectKind, TextureDesc, TextureId};
use crate::error::Result;
use crate::gpu::GraphicsDevice;
use crate::utils::allocator::{Arena, Handle};

#[derive(Debug, Clone, Copy)]
struct HistoryBuffer {
    owner: EffectKind,
    slot: u32,
    texture: TextureId,
    desc: TextureDesc,
}

/// Persistent per-effect textures that carry state from one frame to the next.
///
/// Kept apart from the render-texture pool: a history buffer is owned by one
/// effect slot until that effect releases it, so pooled scratch targets can
/// never alias it.
#[derive(Default)]
pub struct HistoryBuffers {
    buffers: Arena<HistoryBuffer>,
}

impl HistoryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buffer for `(owner, slot)`, (re)allocating it when missing
    /// or when its descriptor changed. The flag is `true` for a fresh buffer
    /// whose contents are undefined.
    pub fn ensure(
        &mut self,
        device: &mut dyn GraphicsDevice,
        owner: EffectKind,
        slot: u32,
        desc: TextureDesc,
    ) -> Result<(TextureId, bool)> {
        if let Some(handle) = self.find(owner, slot) {
            if let Some(buffer) = self.buffers.get(handle) {
                if buffer.desc == desc && device.texture_desc(buffer.texture).is_some() {
                    return Ok((buffer.texture, false));
                }
            }
            if let Some(stale) = self.buffers.remove(handle) {
                device.destroy_texture(stale.texture);
            }
        }

        let texture = device.create_texture(desc, owner.name())?;
        log::info!(
            "Allocated history buffer for {owner} slot {slot} ({}x{})",
            desc.width,
            desc.height
        );
        self.buffers.insert(HistoryBuffer {
            owner,
            slot,
            texture,
            desc,
        });
        Ok((texture, true))
    }

    pub fn get(&self, owner: EffectKind, slot: u32) -> Option<TextureId> {
        self.find(owner, slot)
            .and_then(|handle| self.buffers.get(handle))
            .map(|buffer| buffer.texture)
    }

    pub fn release(&mut self, device: &mut dyn GraphicsDevice, owner: EffectKind, slot: u32) {
        if let Some(buffer) = self.find(owner, slot).and_then(|h| self.buffers.remove(h)) {
            device.destroy_texture(buffer.texture);
        }
    }

    pub fn release_owned_by(&mut self, device: &mut dyn GraphicsDevice, owner: EffectKind) {
        let owned: Vec<Handle> = self
            .buffers
            .iter()
            .filter(|(_, buffer)| buffer.owner == owner)
            .map(|(handle, _)| handle)
            .collect();
        if owned.is_empty() {
            return;
        }
        for handle in &owned {
            if let Some(buffer) = self.buffers.remove(*handle) {
                device.destroy_texture(buffer.texture);
            }
        }
        log::debug!("Released {} history buffers owned by {owner}", owned.len());
    }

    pub fn release_all(&mut self, device: &mut dyn GraphicsDevice) {
        for buffer in self.buffers.drain() {
            device.destroy_texture(buffer.texture);
        }
    }

    pub fn count_for(&self, owner: EffectKind) -> usize {
        self.buffers
            .iter()
            .filter(|(_, buffer)| buffer.owner == owner)
            .count()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    fn find(&self, owner: EffectKind, slot: u32) -> Option<Handle> {
        self.buffers
            .iter()
            .find(|(_, buffer)| buffer.owner == owner && buffer.slot == slot)
            .map(|(handle, _)| handle)
    }
}
