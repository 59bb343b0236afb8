use parking_lot::Mutex;
use std::sync::Arc;

use crate::core::material::Material;
use crate::core::types::{FilterMode, TextureFormat, TextureId};

/// Where a recorded blit reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTargetRef {
    /// The image the camera is currently rendering.
    CameraTarget,
    /// A temporary acquired earlier in the same buffer.
    Temporary(&'static str),
    Texture(TextureId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    GetTemporary {
        name: &'static str,
        width: u32,
        height: u32,
        format: TextureFormat,
        filter: FilterMode,
    },
    ReleaseTemporary {
        name: &'static str,
    },
    SetGlobalTexture {
        name: &'static str,
        target: RenderTargetRef,
    },
    Blit {
        source: RenderTargetRef,
        destination: RenderTargetRef,
        /// `None` copies the source unchanged.
        material: Option<Box<Material>>,
        pass: u32,
    },
}

/// Recorded list of GPU commands replayed at a camera event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandBuffer {
    pub name: String,
    commands: Vec<GpuCommand>,
}

impl CommandBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get_temporary(
        &mut self,
        name: &'static str,
        width: u32,
        height: u32,
        format: TextureFormat,
        filter: FilterMode,
    ) {
        self.commands.push(GpuCommand::GetTemporary {
            name,
            width,
            height,
            format,
            filter,
        });
    }

    pub fn release_temporary(&mut self, name: &'static str) {
        self.commands.push(GpuCommand::ReleaseTemporary { name });
    }

    pub fn set_global_texture(&mut self, name: &'static str, target: RenderTargetRef) {
        self.commands
            .push(GpuCommand::SetGlobalTexture { name, target });
    }

    pub fn blit(&mut self, source: RenderTargetRef, destination: RenderTargetRef) {
        self.commands.push(GpuCommand::Blit {
            source,
            destination,
            material: None,
            pass: 0,
        });
    }

    /// Records a blit through a snapshot of `material` as it is now.
    pub fn blit_material(
        &mut self,
        source: RenderTargetRef,
        destination: RenderTargetRef,
        material: &Material,
        pass: u32,
    ) {
        self.commands.push(GpuCommand::Blit {
            source,
            destination,
            material: Some(Box::new(material.clone())),
            pass,
        });
    }
}

/// A command buffer shared between the stack (which records it) and the
/// camera (which replays it).
pub type SharedCommandBuffer = Arc<Mutex<CommandBuffer>>;

pub fn shared_command_buffer(name: impl Into<String>) -> SharedCommandBuffer {
    Arc::new(Mutex::new(CommandBuffer::new(name)))
}
