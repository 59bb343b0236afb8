use postfx_stack::*;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let mut device = SoftwareDevice::new();
    let mut camera = SoftwareCamera::new(32, 32);
    let desc = TextureDesc::new(32, 32, TextureFormat::RgbaHalf);
    let source = device.upload_with(desc, |x, y| Vec4::new(x as f32 / 32.0, y as f32 / 32.0, 0.25, 1.0))?;
    let destination = device.create_texture(desc, "backbuffer")?;

    let mut day = PostProcessingProfile::default();
    day.bloom.enabled = true;
    day.grain.enabled = true;

    let mut night = PostProcessingProfile::default();
    night.grain.enabled = true;
    night.vignette.enabled = true;
    night.ambient_occlusion.enabled = true;

    let mut stack = PostProcessingStack::new();
    for (frame, profile) in [Arc::new(day), Arc::new(night)].into_iter().enumerate() {
        stack.set_profile(profile);
        stack.on_pre_cull(&mut device, Some(&mut camera));
        stack.on_pre_render(&mut device, &mut camera)?;
        camera.render_event(CameraEvent::BeforeImageEffectsOpaque, &mut device, source)?;
        let report = stack.on_render_image(&mut device, source, destination)?;
        stack.on_post_render(&mut camera);

        println!("Frame {frame}:");
        for transition in stack.last_transitions() {
            println!("  {} {:?}", transition.kind, transition.transition);
        }
        println!(
            "  {} command buffer(s), {} composite pass(es)",
            stack.command_buffers().len(),
            report.composite_passes
        );
    }

    stack.teardown(&mut device, Some(&mut camera));
    Ok(())
}
