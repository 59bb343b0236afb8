//! Graphics device seam.
//!
//! The stack never talks to a graphics API directly. Everything it needs
//! (textures, blits through materials, global textures, command-buffer
//! replay) goes through [`GraphicsDevice`]. [`SoftwareDevice`] is the CPU
//! reference implementation used by tests, benches and demos.

pub mod software;

pub use software::{SoftwareCamera, SoftwareDevice};

use glam::Vec4;
use std::collections::HashMap;

use crate::core::command_buffer::{CommandBuffer, GpuCommand, RenderTargetRef};
use crate::core::material::{Material, ShaderId};
use crate::core::types::{ColorSpace, DeviceCaps, TextureDesc, TextureId};
use crate::error::{PostFxError, Result};

pub trait GraphicsDevice {
    fn name(&self) -> &str;

    fn caps(&self) -> DeviceCaps;

    /// Color space the device's render targets are stored in.
    fn color_space(&self) -> ColorSpace {
        ColorSpace::Linear
    }

    fn find_shader(&self, name: &str) -> Option<ShaderId>;

    fn create_texture(&mut self, desc: TextureDesc, label: &str) -> Result<TextureId>;

    fn destroy_texture(&mut self, texture: TextureId);

    fn texture_desc(&self, texture: TextureId) -> Option<TextureDesc>;

    fn clear_texture(&mut self, texture: TextureId, color: Vec4) -> Result<()>;

    /// Full-screen pass from `source` into `destination`.
    ///
    /// Without a material the source is copied unchanged (resampled if the
    /// sizes differ). `source` and `destination` must be different textures.
    fn blit(
        &mut self,
        source: Option<TextureId>,
        destination: TextureId,
        material: Option<&Material>,
        pass: u32,
    ) -> Result<()>;

    fn set_global_texture(&mut self, name: &'static str, texture: Option<TextureId>);

    fn global_texture(&self, name: &str) -> Option<TextureId>;

    fn read_texture(&self, texture: TextureId) -> Result<Vec<Vec4>>;

    /// Replays a recorded command buffer with `camera_target` bound as the
    /// camera's current image.
    ///
    /// Temporaries live until released or until the end of the buffer.
    fn execute_command_buffer(
        &mut self,
        buffer: &CommandBuffer,
        camera_target: TextureId,
    ) -> Result<()> {
        let mut temporaries: HashMap<&'static str, TextureId> = HashMap::new();
        let resolve = |target: RenderTargetRef, temporaries: &HashMap<&'static str, TextureId>| {
            match target {
                RenderTargetRef::CameraTarget => Ok(camera_target),
                RenderTargetRef::Texture(texture) => Ok(texture),
                RenderTargetRef::Temporary(name) => temporaries
                    .get(name)
                    .copied()
                    .ok_or(PostFxError::UnknownTemporary(name)),
            }
        };

        let mut outcome = Ok(());
        for command in buffer.commands() {
            let step = match command {
                GpuCommand::GetTemporary {
                    name,
                    width,
                    height,
                    format,
                    filter,
                } => {
                    let desc = TextureDesc::new(*width, *height, *format).with_filter(*filter);
                    self.create_texture(desc, name).map(|texture| {
                        if let Some(previous) = temporaries.insert(*name, texture) {
                            self.destroy_texture(previous);
                        }
                    })
                }
                GpuCommand::ReleaseTemporary { name } => {
                    if let Some(texture) = temporaries.remove(name) {
                        self.destroy_texture(texture);
                    }
                    Ok(())
                }
                GpuCommand::SetGlobalTexture { name, target } => {
                    resolve(*target, &temporaries).map(|texture| {
                        self.set_global_texture(*name, Some(texture));
                    })
                }
                GpuCommand::Blit {
                    source,
                    destination,
                    material,
                    pass,
                } => resolve(*source, &temporaries).and_then(|source| {
                    let destination = resolve(*destination, &temporaries)?;
                    self.blit(Some(source), destination, material.as_deref(), *pass)
                }),
            };
            if let Err(err) = step {
                log::warn!("command buffer '{}' aborted: {err}", buffer.name);
                outcome = Err(err);
                break;
            }
        }

        for (_, texture) in temporaries.drain() {
            self.destroy_texture(texture);
        }
        outcome
    }
}
