use std::collections::HashMap;

use crate::core::material::Material;
use crate::error::{PostFxError, Result};
use crate::gpu::GraphicsDevice;
use crate::utils::allocator::{Arena, Handle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub Handle);

/// Materials keyed by shader name, owned by one stack.
#[derive(Default)]
pub struct MaterialCache {
    by_name: HashMap<String, MaterialId>,
    materials: Arena<Material>,
}

impl MaterialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the material for `shader_name`, creating it on first request.
    pub fn get(&mut self, device: &dyn GraphicsDevice, shader_name: &str) -> Result<MaterialId> {
        if let Some(&id) = self.by_name.get(shader_name) {
            return Ok(id);
        }

        let shader = device
            .find_shader(shader_name)
            .ok_or_else(|| PostFxError::ShaderNotFound(shader_name.to_string()))?;
        let id = MaterialId(self.materials.insert(Material::new(shader, shader_name)));
        self.by_name.insert(shader_name.to_string(), id);
        log::debug!("Created material for '{shader_name}'");
        Ok(id)
    }

    /// [`get`](Self::get) followed by a mutable lookup.
    pub fn get_mut(
        &mut self,
        device: &dyn GraphicsDevice,
        shader_name: &str,
    ) -> Result<&mut Material> {
        let id = self.get(device, shader_name)?;
        self.materials
            .get_mut(id.0)
            .ok_or_else(|| PostFxError::ShaderNotFound(shader_name.to_string()))
    }

    pub fn find(&self, shader_name: &str) -> Option<MaterialId> {
        self.by_name.get(shader_name).copied()
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    /// Moves a material out so it can be written while the cache is lent to
    /// other code. Pair with [`MaterialCache::restore`].
    pub fn take(&mut self, id: MaterialId) -> Option<Material> {
        self.materials.take(id.0)
    }

    pub fn restore(&mut self, id: MaterialId, material: Material) {
        self.materials.restore(id.0, material);
    }

    pub fn contains(&self, shader_name: &str) -> bool {
        self.by_name.contains_key(shader_name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn dispose_all(&mut self) {
        let count = self.by_name.len();
        self.by_name.clear();
        self.materials.drain();
        if count > 0 {
            log::info!("Disposed {count} materials");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::shaders;
    use crate::gpu::SoftwareDevice;

    #[test]
    fn get_is_idempotent() {
        let device = SoftwareDevice::new();
        let mut cache = MaterialCache::new();
        let first = cache.get(&device, shaders::BLOOM).expect("bloom");
        let second = cache.get(&device, shaders::BLOOM).expect("bloom");
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.material(first).map(|m| m.shader_name()),
            Some(shaders::BLOOM)
        );
    }

    #[test]
    fn unresolved_shader_is_an_error() {
        let device = SoftwareDevice::new().without_shader(shaders::FOG);
        let mut cache = MaterialCache::new();
        let err = cache.get(&device, shaders::FOG).unwrap_err();
        assert!(matches!(err, PostFxError::ShaderNotFound(_)));
        assert!(!cache.contains(shaders::FOG));
    }

    #[test]
    fn dispose_all_forgets_materials() {
        let device = SoftwareDevice::new();
        let mut cache = MaterialCache::new();
        let id = cache.get(&device, shaders::UBER).expect("uber");
        cache.dispose_all();
        assert!(cache.is_empty());
        assert!(cache.material(id).is_none());
    }
}
