use glam::{Mat4, Vec4};

use crate::core::command_buffer::SharedCommandBuffer;
use crate::core::types::{CameraEvent, DepthTextureMode, RenderingPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogMode {
    Linear,
    #[default]
    Exponential,
    ExponentialSquared,
}

/// Scene-wide fog the host renders for forward geometry; deferred fog replays it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneFog {
    pub enabled: bool,
    pub mode: FogMode,
    pub color: Vec4,
    pub density: f32,
    pub start: f32,
    pub end: f32,
}

impl Default for SceneFog {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::Exponential,
            color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            density: 0.01,
            start: 0.0,
            end: 300.0,
        }
    }
}

/// Camera state captured at pre-cull and reused for the rest of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    pub width: u32,
    pub height: u32,
    pub projection: Mat4,
    pub orthographic: bool,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub rendering_path: RenderingPath,
    pub allow_hdr: bool,
    pub fog: SceneFog,
}

impl CameraSnapshot {
    /// Forward HDR perspective camera of the given size with default clip planes.
    pub fn perspective(width: u32, height: u32) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Self {
            width,
            height,
            projection: Mat4::perspective_rh(60f32.to_radians(), aspect, 0.3, 1000.0),
            orthographic: false,
            near_clip: 0.3,
            far_clip: 1000.0,
            field_of_view: 60.0,
            rendering_path: RenderingPath::Forward,
            allow_hdr: true,
            fog: SceneFog::default(),
        }
    }
}

/// The host camera the stack post-processes.
///
/// Only the size, projection, auxiliary-buffer flags and command-buffer
/// attachment are required; the rest have defaults describing a forward HDR
/// perspective camera without fog.
pub trait Camera {
    fn pixel_width(&self) -> u32;
    fn pixel_height(&self) -> u32;

    fn projection_matrix(&self) -> Mat4;
    fn set_projection_matrix(&mut self, projection: Mat4);
    /// Restores the projection the camera would compute on its own.
    fn reset_projection_matrix(&mut self);

    fn depth_texture_mode(&self) -> DepthTextureMode;
    fn set_depth_texture_mode(&mut self, mode: DepthTextureMode);

    fn add_command_buffer(&mut self, event: CameraEvent, buffer: SharedCommandBuffer);
    fn remove_command_buffer(&mut self, event: CameraEvent, buffer: &SharedCommandBuffer);

    fn is_orthographic(&self) -> bool {
        false
    }

    fn near_clip_plane(&self) -> f32 {
        0.3
    }

    fn far_clip_plane(&self) -> f32 {
        1000.0
    }

    fn field_of_view(&self) -> f32 {
        60.0
    }

    fn rendering_path(&self) -> RenderingPath {
        RenderingPath::Forward
    }

    fn allow_hdr(&self) -> bool {
        true
    }

    fn scene_fog(&self) -> SceneFog {
        SceneFog::default()
    }

    fn snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            width: self.pixel_width(),
            height: self.pixel_height(),
            projection: self.projection_matrix(),
            orthographic: self.is_orthographic(),
            near_clip: self.near_clip_plane(),
            far_clip: self.far_clip_plane(),
            field_of_view: self.field_of_view(),
            rendering_path: self.rendering_path(),
            allow_hdr: self.allow_hdr(),
            fog: self.scene_fog(),
        }
    }
}
