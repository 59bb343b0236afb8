use glam::Mat4;
use std::sync::Arc;

use crate::core::camera::{Camera, SceneFog};
use crate::core::command_buffer::SharedCommandBuffer;
use crate::core::material::uniforms;
use crate::core::types::{CameraEvent, DepthTextureMode, RenderingPath, TextureId};
use crate::error::Result;
use crate::gpu::GraphicsDevice;

/// In-memory camera that records what the stack asks of it and replays
/// attached command buffers on demand.
pub struct SoftwareCamera {
    width: u32,
    height: u32,
    base_projection: Mat4,
    projection: Mat4,
    orthographic: bool,
    near_clip: f32,
    far_clip: f32,
    field_of_view: f32,
    rendering_path: RenderingPath,
    allow_hdr: bool,
    fog: SceneFog,
    depth_mode: DepthTextureMode,
    buffers: Vec<(CameraEvent, SharedCommandBuffer)>,
    buffers_added: usize,
    buffers_removed: usize,
    depth: Option<TextureId>,
    depth_normals: Option<TextureId>,
    motion_vectors: Option<TextureId>,
}

impl SoftwareCamera {
    /// Forward perspective camera with a 60° vertical field of view.
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            width,
            height,
            base_projection: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            orthographic: false,
            near_clip: 0.3,
            far_clip: 1000.0,
            field_of_view: 60.0,
            rendering_path: RenderingPath::Forward,
            allow_hdr: true,
            fog: SceneFog::default(),
            depth_mode: DepthTextureMode::NONE,
            buffers: Vec::new(),
            buffers_added: 0,
            buffers_removed: 0,
            depth: None,
            depth_normals: None,
            motion_vectors: None,
        };
        camera.rebuild_projection();
        camera
    }

    pub fn with_rendering_path(mut self, path: RenderingPath) -> Self {
        self.rendering_path = path;
        self
    }

    pub fn with_fog(mut self, fog: SceneFog) -> Self {
        self.fog = fog;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near_clip = near;
        self.far_clip = far;
        self.rebuild_projection();
        self
    }

    pub fn with_field_of_view(mut self, degrees: f32) -> Self {
        self.field_of_view = degrees;
        self.rebuild_projection();
        self
    }

    pub fn orthographic(mut self) -> Self {
        self.orthographic = true;
        self.rebuild_projection();
        self
    }

    pub fn set_rendering_path(&mut self, path: RenderingPath) {
        self.rendering_path = path;
    }

    /// Auxiliary buffers the host rendered this frame (linear 0..1 depth).
    pub fn set_aux_buffers(
        &mut self,
        depth: Option<TextureId>,
        depth_normals: Option<TextureId>,
        motion_vectors: Option<TextureId>,
    ) {
        self.depth = depth;
        self.depth_normals = depth_normals;
        self.motion_vectors = motion_vectors;
    }

    pub fn attached_buffers(&self) -> &[(CameraEvent, SharedCommandBuffer)] {
        &self.buffers
    }

    pub fn attached_at(&self, event: CameraEvent) -> usize {
        self.buffers.iter().filter(|(at, _)| *at == event).count()
    }

    pub fn buffers_added(&self) -> usize {
        self.buffers_added
    }

    pub fn buffers_removed(&self) -> usize {
        self.buffers_removed
    }

    /// Whether the current projection differs from the camera's own.
    pub fn is_jittered(&self) -> bool {
        self.projection != self.base_projection
    }

    /// Binds the auxiliary buffers requested through the depth texture mode
    /// as camera globals.
    pub fn publish_aux_buffers(&self, device: &mut dyn GraphicsDevice) {
        let mode = self.depth_mode;
        let bindings = [
            (uniforms::CAMERA_DEPTH_TEXTURE, DepthTextureMode::DEPTH, self.depth),
            (
                uniforms::CAMERA_DEPTH_NORMALS_TEXTURE,
                DepthTextureMode::DEPTH_NORMALS,
                self.depth_normals,
            ),
            (
                uniforms::CAMERA_MOTION_VECTORS_TEXTURE,
                DepthTextureMode::MOTION_VECTORS,
                self.motion_vectors,
            ),
        ];
        for (name, flag, texture) in bindings {
            let bound = if mode.contains(flag) { texture } else { None };
            device.set_global_texture(name, bound);
        }
    }

    /// Replays every buffer attached at `event` against `target`.
    pub fn render_event(
        &self,
        event: CameraEvent,
        device: &mut dyn GraphicsDevice,
        target: TextureId,
    ) -> Result<()> {
        self.publish_aux_buffers(device);
        for (_, buffer) in self.buffers.iter().filter(|(at, _)| *at == event) {
            let buffer = buffer.lock();
            device.execute_command_buffer(&buffer, target)?;
        }
        Ok(())
    }

    fn rebuild_projection(&mut self) {
        let aspect = self.width.max(1) as f32 / self.height.max(1) as f32;
        self.base_projection = if self.orthographic {
            let half_height = 5.0;
            Mat4::orthographic_rh(
                -half_height * aspect,
                half_height * aspect,
                -half_height,
                half_height,
                self.near_clip,
                self.far_clip,
            )
        } else {
            Mat4::perspective_rh(
                self.field_of_view.to_radians(),
                aspect,
                self.near_clip,
                self.far_clip,
            )
        };
        self.projection = self.base_projection;
    }
}

impl Camera for SoftwareCamera {
    fn pixel_width(&self) -> u32 {
        self.width
    }

    fn pixel_height(&self) -> u32 {
        self.height
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn reset_projection_matrix(&mut self) {
        self.projection = self.base_projection;
    }

    fn depth_texture_mode(&self) -> DepthTextureMode {
        self.depth_mode
    }

    fn set_depth_texture_mode(&mut self, mode: DepthTextureMode) {
        self.depth_mode = mode;
    }

    fn add_command_buffer(&mut self, event: CameraEvent, buffer: SharedCommandBuffer) {
        self.buffers_added += 1;
        self.buffers.push((event, buffer));
    }

    fn remove_command_buffer(&mut self, event: CameraEvent, buffer: &SharedCommandBuffer) {
        let before = self.buffers.len();
        self.buffers
            .retain(|(at, attached)| !(*at == event && Arc::ptr_eq(attached, buffer)));
        self.buffers_removed += before - self.buffers.len();
    }

    fn is_orthographic(&self) -> bool {
        self.orthographic
    }

    fn near_clip_plane(&self) -> f32 {
        self.near_clip
    }

    fn far_clip_plane(&self) -> f32 {
        self.far_clip
    }

    fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    fn rendering_path(&self) -> RenderingPath {
        self.rendering_path
    }

    fn allow_hdr(&self) -> bool {
        self.allow_hdr
    }

    fn scene_fog(&self) -> SceneFog {
        self.fog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command_buffer::shared_command_buffer;

    #[test]
    fn removing_a_buffer_matches_identity_and_event() {
        let mut camera = SoftwareCamera::new(8, 8);
        let first = shared_command_buffer("first");
        let second = shared_command_buffer("second");
        camera.add_command_buffer(CameraEvent::BeforeImageEffects, first.clone());
        camera.add_command_buffer(CameraEvent::BeforeImageEffects, second.clone());

        camera.remove_command_buffer(CameraEvent::AfterEverything, &first);
        assert_eq!(camera.attached_buffers().len(), 2);

        camera.remove_command_buffer(CameraEvent::BeforeImageEffects, &first);
        assert_eq!(camera.attached_buffers().len(), 1);
        assert!(Arc::ptr_eq(&camera.attached_buffers()[0].1, &second));
        assert_eq!(camera.buffers_removed(), 1);
    }

    #[test]
    fn reset_restores_own_projection() {
        let mut camera = SoftwareCamera::new(16, 9);
        let own = camera.projection_matrix();
        camera.set_projection_matrix(Mat4::IDENTITY);
        assert!(camera.is_jittered());
        camera.reset_projection_matrix();
        assert_eq!(camera.projection_matrix(), own);
    }
}
