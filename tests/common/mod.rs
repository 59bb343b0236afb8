#![allow(dead_code)]

use std::sync::Arc;

use postfx_stack::{
    CameraEvent, CompositeReport, GraphicsDevice, PostProcessingProfile, PostProcessingStack,
    SoftwareCamera, SoftwareDevice, TextureDesc, TextureFormat, TextureId, Vec4,
};

pub const WIDTH: u32 = 16;
pub const HEIGHT: u32 = 12;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Device, camera and a source/destination pair for one view.
pub struct Scene {
    pub device: SoftwareDevice,
    pub camera: SoftwareCamera,
    pub source: TextureId,
    pub destination: TextureId,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_device(SoftwareDevice::new())
    }

    pub fn with_device(mut device: SoftwareDevice) -> Self {
        init_logging();
        let desc = TextureDesc::new(WIDTH, HEIGHT, TextureFormat::RgbaFloat);
        let source = device
            .upload_with(desc, |x, y| gradient(x, y, 0.0))
            .expect("source");
        let destination = device.create_texture(desc, "destination").expect("destination");

        let depth_desc = TextureDesc::new(WIDTH, HEIGHT, TextureFormat::RFloat);
        let depth = device
            .upload_with(depth_desc, |x, _| Vec4::splat(0.05 + x as f32 / WIDTH as f32 * 0.5))
            .expect("depth");
        let mut camera = SoftwareCamera::new(WIDTH, HEIGHT);
        camera.set_aux_buffers(Some(depth), None, None);

        Self {
            device,
            camera,
            source,
            destination,
        }
    }

    /// Replaces the source contents with a gradient shifted by `phase`.
    pub fn repaint(&mut self, phase: f32) {
        let desc = self.device.texture_desc(self.source).expect("source desc");
        let fresh = self
            .device
            .upload_with(desc, |x, y| gradient(x, y, phase))
            .expect("repaint");
        self.device.blit(Some(fresh), self.source, None, 0).expect("copy");
        self.device.destroy_texture(fresh);
    }

    /// Runs one full camera frame through `stack`.
    pub fn frame(&mut self, stack: &mut PostProcessingStack) -> CompositeReport {
        stack.on_pre_cull(&mut self.device, Some(&mut self.camera));
        stack
            .on_pre_render(&mut self.device, &mut self.camera)
            .expect("pre-render");
        for event in [
            CameraEvent::BeforeReflections,
            CameraEvent::BeforeImageEffectsOpaque,
            CameraEvent::AfterImageEffectsOpaque,
            CameraEvent::BeforeImageEffects,
        ] {
            self.camera
                .render_event(event, &mut self.device, self.source)
                .expect("camera event");
        }
        let report = stack
            .on_render_image(&mut self.device, self.source, self.destination)
            .expect("composite");
        stack.on_post_render(&mut self.camera);
        report
    }

    pub fn read(&self, texture: TextureId) -> Vec<Vec4> {
        self.device.read_texture(texture).expect("read")
    }
}

pub fn gradient(x: u32, y: u32, phase: f32) -> Vec4 {
    let u = x as f32 / WIDTH as f32;
    let v = y as f32 / HEIGHT as f32;
    Vec4::new(u + phase, v, (u * v + phase * 0.5).fract(), 1.0)
}

pub fn stack_with(profile: PostProcessingProfile) -> PostProcessingStack {
    PostProcessingStack::new().with_profile(Arc::new(profile))
}

/// Every effect that can run together in one forward camera.
pub fn everything() -> PostProcessingProfile {
    let mut profile = PostProcessingProfile::default();
    profile.ambient_occlusion.enabled = true;
    profile.motion_blur.enabled = true;
    profile.eye_adaptation.enabled = true;
    profile.depth_of_field.enabled = true;
    profile.bloom.enabled = true;
    profile.chromatic_aberration.enabled = true;
    profile.color_grading.enabled = true;
    profile.grain.enabled = true;
    profile.vignette.enabled = true;
    profile.dithering.enabled = true;
    profile.antialiasing.enabled = true;
    profile
}
