use postfx_stack::*;
use std::sync::Arc;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 36;

fn main() -> Result<()> {
    env_logger::init();

    let mut device = SoftwareDevice::new();
    let mut camera = SoftwareCamera::new(WIDTH, HEIGHT);

    let desc = TextureDesc::new(WIDTH, HEIGHT, TextureFormat::RgbaHalf);
    let source = device.upload_with(desc, |x, y| {
        let u = x as f32 / WIDTH as f32;
        let v = y as f32 / HEIGHT as f32;
        // A bright strip near the top so bloom has something to catch.
        let highlight = if v < 0.1 { 4.0 } else { 0.0 };
        Vec4::new(u + highlight, v + highlight, 0.5 + highlight, 1.0)
    })?;
    let destination = device.create_texture(desc, "backbuffer")?;

    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    profile.color_grading.enabled = true;
    profile.vignette.enabled = true;
    profile.antialiasing.enabled = true;

    let mut stack = PostProcessingStack::new().with_profile(Arc::new(profile));
    stack.on_pre_cull(&mut device, Some(&mut camera));
    stack.on_pre_render(&mut device, &mut camera)?;
    let report = stack.on_render_image(&mut device, source, destination)?;
    stack.on_post_render(&mut camera);

    println!("Active effects: {:?}", stack.effects().active_kinds());
    println!("Composite: {report:?}");
    let pixels = device.read_texture(destination)?;
    println!("Top-left texel after post-processing: {:?}", pixels[0]);
    stack.profiler().report();

    stack.teardown(&mut device, Some(&mut camera));
    println!("Live textures after teardown: {}", device.live_textures());
    Ok(())
}
