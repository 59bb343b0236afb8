//! Capability set shared by every effect.
//!
//! [`PostEffect`] covers what the stack asks of all sixteen effects each
//! frame. Effects that only write uber-material parameters also implement
//! [`UberEffect`]; effects that record GPU work at a camera event implement
//! [`CommandBufferEffect`]. Effects with resource-allocating passes (TAA, eye
//! adaptation, depth of field, bloom, FXAA) expose inherent methods the stack
//! calls in dependency order.

use crate::core::camera::CameraSnapshot;
use crate::core::command_buffer::CommandBuffer;
use crate::core::material::Material;
use crate::core::profile::{DebugMode, PostProcessingProfile};
use crate::core::types::{
    CameraEvent, ColorSpace, DepthTextureMode, DeviceCaps, EffectKind, RenderContextKind,
    TextureFormat,
};
use crate::error::Result;
use crate::gpu::GraphicsDevice;
use crate::pipeline::state_observer::EffectStates;
use crate::resources::{HistoryBuffers, MaterialCache, RenderTexturePool};

/// Per-frame facts captured at pre-cull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub camera: CameraSnapshot,
    pub render_context: RenderContextKind,
    /// Active debug mode, `None` when debug views are off.
    pub debug_mode: DebugMode,
    /// A debug view replaces the image; most effects stand down.
    pub interrupted: bool,
    pub delta_time: f32,
    pub frame_index: u64,
    pub caps: DeviceCaps,
    pub color_space: ColorSpace,
}

impl FrameInfo {
    pub fn is_preview(&self) -> bool {
        self.render_context == RenderContextKind::Preview
    }

    /// Half-float format when the device has one, full float otherwise.
    pub fn hdr_format(&self) -> TextureFormat {
        if self.caps.supports_half_formats {
            TextureFormat::RgbaHalf
        } else {
            TextureFormat::RgbaFloat
        }
    }
}

/// Read-only view handed to every effect's `init`.
pub struct FrameContext<'a> {
    pub profile: &'a PostProcessingProfile,
    pub info: &'a FrameInfo,
    pub device: &'a dyn GraphicsDevice,
}

impl FrameContext<'_> {
    pub fn has_shader(&self, name: &str) -> bool {
        self.device.find_shader(name).is_some()
    }
}

/// Mutable resources lent to effects while they render or record.
pub struct FrameResources<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub pool: &'a mut RenderTexturePool,
    pub materials: &'a mut MaterialCache,
    pub history: &'a mut HistoryBuffers,
}

/// What an `on_enable` / `on_disable` hook may touch.
pub struct LifecycleContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub history: &'a mut HistoryBuffers,
    /// Already reflects the transition being notified.
    pub states: &'a EffectStates,
}

pub trait PostEffect {
    fn kind(&self) -> EffectKind;

    /// Rebinds settings and recomputes activity. Called every frame.
    fn init(&mut self, ctx: &FrameContext<'_>);

    /// The settings flag the enable/disable transitions follow.
    fn is_enabled(&self) -> bool;

    /// Enabled and every prerequisite met.
    fn is_active(&self) -> bool;

    fn on_enable(&mut self, _ctx: &mut LifecycleContext<'_>) {}

    fn on_disable(&mut self, _ctx: &mut LifecycleContext<'_>) {}

    fn camera_flags(&self) -> DepthTextureMode {
        DepthTextureMode::NONE
    }

    fn reset_history(&mut self) {}
}

/// Effect that contributes only parameters to a shared material.
pub trait UberEffect: PostEffect {
    /// Writes parameters and keywords; returns whether the effect contributed.
    fn prepare(&mut self, material: &mut Material, info: &FrameInfo) -> bool;
}

/// Effect that records its work into a command buffer replayed by the camera.
pub trait CommandBufferEffect: PostEffect {
    fn camera_event(&self) -> CameraEvent;

    fn name(&self) -> &'static str;

    /// Records this frame's commands into a cleared buffer.
    fn populate_command_buffer(
        &mut self,
        buffer: &mut CommandBuffer,
        res: &mut FrameResources<'_>,
        info: &FrameInfo,
    ) -> Result<()>;
}

/// Prepares `effect` against `material` when it is active.
pub fn try_prepare(effect: &mut dyn UberEffect, material: &mut Material, info: &FrameInfo) -> bool {
    effect.is_active() && effect.prepare(material, info)
}
