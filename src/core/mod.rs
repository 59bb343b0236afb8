//! Core types shared by the device seam, the effects and the stack.

pub mod camera;
pub mod command_buffer;
pub mod material;
pub mod profile;
pub mod types;

pub use camera::{Camera, CameraSnapshot, FogMode, SceneFog};
pub use command_buffer::{
    shared_command_buffer, CommandBuffer, GpuCommand, RenderTargetRef, SharedCommandBuffer,
};
pub use material::{keywords, uniforms, Material, ShaderId};
pub use profile::PostProcessingProfile;
pub use types::{
    CameraEvent, ColorSpace, DepthTextureMode, DeviceCaps, EffectKind, FilterMode,
    RenderContextKind, RenderingPath, TextureDesc, TextureFormat, TextureId,
};
