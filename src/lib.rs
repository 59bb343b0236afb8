//! postfx_stack – per-camera post-processing compositor.
//!
//! A [`PostProcessingStack`] sits between a camera and its render target. It
//! reads a [`PostProcessingProfile`] every frame, keeps sixteen effects in
//! step with it, records the effects that run mid-frame into camera command
//! buffers, and fuses the rest into a single uber pass (plus TAA before it
//! and FXAA after it when enabled). All GPU work goes through the
//! [`GraphicsDevice`] seam; [`SoftwareDevice`] implements it on the CPU.

pub mod config;
pub mod core;
pub mod effects;
pub mod error;
pub mod gpu;
pub mod pipeline;
pub mod resources;
pub mod utils;

pub use glam::{Mat4, Vec2, Vec3, Vec4};

pub use core::{
    camera::{Camera, CameraSnapshot, FogMode, SceneFog},
    command_buffer::{CommandBuffer, GpuCommand, RenderTargetRef, SharedCommandBuffer},
    material::Material,
    profile::{DebugMode, PostProcessingProfile},
    types::{
        CameraEvent, ColorSpace, DepthTextureMode, DeviceCaps, EffectKind, FilterMode,
        RenderContextKind, RenderingPath, TextureDesc, TextureFormat, TextureId,
    },
};
pub use effects::{EffectSet, PostEffect};
pub use error::{PostFxError, Result};
pub use gpu::{GraphicsDevice, SoftwareCamera, SoftwareDevice};
pub use pipeline::{
    CompositeReport, DebugOverlay, PostProcessingStack, StateTransition, Transition,
};
pub use resources::{HistoryBuffers, MaterialCache, RenderTexturePool};
pub use utils::profiling::CompositorProfiler;
