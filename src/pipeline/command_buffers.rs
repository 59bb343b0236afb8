use std::collections::HashMap;

use crate::core::camera::Camera;
use crate::core::command_buffer::{shared_command_buffer, SharedCommandBuffer};
use crate::core::types::{CameraEvent, EffectKind};

#[derive(Debug)]
struct RegisteredBuffer {
    event: CameraEvent,
    buffer: SharedCommandBuffer,
}

/// At most one camera command buffer per effect, each pinned to the event
/// it was attached at.
#[derive(Debug, Default)]
pub struct CommandBufferRegistry {
    buffers: HashMap<EffectKind, RegisteredBuffer>,
    created: usize,
    removed: usize,
}

impl CommandBufferRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buffer for `kind`, attaching a new one at `event` when
    /// none exists. A buffer attached at a different event is detached and
    /// replaced.
    pub fn get_or_create(
        &mut self,
        camera: &mut dyn Camera,
        kind: EffectKind,
        event: CameraEvent,
        name: &str,
    ) -> SharedCommandBuffer {
        if let Some(existing) = self.buffers.get(&kind) {
            if existing.event == event {
                return existing.buffer.clone();
            }
            log::debug!(
                "{kind} moved from {:?} to {event:?}; recreating its command buffer",
                existing.event
            );
            self.remove_if_present(camera, kind);
        }

        let buffer = shared_command_buffer(name);
        camera.add_command_buffer(event, buffer.clone());
        self.buffers.insert(
            kind,
            RegisteredBuffer {
                event,
                buffer: buffer.clone(),
            },
        );
        self.created += 1;
        log::debug!("Attached command buffer '{name}' at {event:?}");
        buffer
    }

    /// Detaches and drops the buffer for `kind`. Returns whether one existed.
    pub fn remove_if_present(&mut self, camera: &mut dyn Camera, kind: EffectKind) -> bool {
        match self.buffers.remove(&kind) {
            Some(registered) => {
                camera.remove_command_buffer(registered.event, &registered.buffer);
                self.removed += 1;
                true
            }
            None => false,
        }
    }

    /// Detaches every buffer from `camera`.
    pub fn clear(&mut self, camera: &mut dyn Camera) {
        let mut kinds: Vec<EffectKind> = self.buffers.keys().copied().collect();
        kinds.sort();
        for kind in kinds {
            self.remove_if_present(camera, kind);
        }
    }

    /// Forgets every buffer without a camera to detach from.
    pub fn drop_all(&mut self) {
        self.removed += self.buffers.len();
        self.buffers.clear();
    }

    pub fn event_of(&self, kind: EffectKind) -> Option<CameraEvent> {
        self.buffers.get(&kind).map(|registered| registered.event)
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.buffers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn removed(&self) -> usize {
        self.removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::SoftwareCamera;

    #[test]
    fn same_event_reuses_the_buffer() {
        let mut camera = SoftwareCamera::new(8, 8);
        let mut registry = CommandBufferRegistry::new();
        let first = registry.get_or_create(
            &mut camera,
            EffectKind::Fog,
            CameraEvent::AfterImageEffectsOpaque,
            "Fog",
        );
        let second = registry.get_or_create(
            &mut camera,
            EffectKind::Fog,
            CameraEvent::AfterImageEffectsOpaque,
            "Fog",
        );
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(registry.created(), 1);
        assert_eq!(camera.attached_buffers().len(), 1);
    }

    #[test]
    fn event_change_detaches_and_reattaches() {
        let mut camera = SoftwareCamera::new(8, 8);
        let mut registry = CommandBufferRegistry::new();
        registry.get_or_create(
            &mut camera,
            EffectKind::AmbientOcclusion,
            CameraEvent::BeforeImageEffectsOpaque,
            "Ambient Occlusion",
        );
        registry.get_or_create(
            &mut camera,
            EffectKind::AmbientOcclusion,
            CameraEvent::BeforeReflections,
            "Ambient Occlusion",
        );

        assert_eq!((registry.created(), registry.removed()), (2, 1));
        assert_eq!(camera.attached_at(CameraEvent::BeforeImageEffectsOpaque), 0);
        assert_eq!(camera.attached_at(CameraEvent::BeforeReflections), 1);
        assert_eq!(
            registry.event_of(EffectKind::AmbientOcclusion),
            Some(CameraEvent::BeforeReflections)
        );
    }

    #[test]
    fn clear_detaches_everything() {
        let mut camera = SoftwareCamera::new(8, 8);
        let mut registry = CommandBufferRegistry::new();
        registry.get_or_create(&mut camera, EffectKind::Fog, CameraEvent::AfterImageEffectsOpaque, "Fog");
        registry.get_or_create(
            &mut camera,
            EffectKind::DebugViews,
            CameraEvent::BeforeImageEffectsOpaque,
            "Builtin Debug Views",
        );
        registry.clear(&mut camera);
        assert!(registry.is_empty());
        assert!(camera.attached_buffers().is_empty());
        assert!(!registry.remove_if_present(&mut camera, EffectKind::Fog));
    }
}
