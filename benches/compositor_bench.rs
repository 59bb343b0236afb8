use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use postfx_stack::*;
use std::hint::black_box;
use std::sync::Arc;

struct View {
    device: SoftwareDevice,
    camera: SoftwareCamera,
    source: TextureId,
    destination: TextureId,
}

fn prepare_view(size: u32) -> View {
    let mut device = SoftwareDevice::new();
    let desc = TextureDesc::new(size, size, TextureFormat::RgbaHalf);
    let source = device
        .upload_with(desc, |x, y| {
            let u = x as f32 / size as f32;
            let v = y as f32 / size as f32;
            Vec4::new(u * 2.0, v, (u * v).sqrt(), 1.0)
        })
        .expect("source");
    let destination = device.create_texture(desc, "destination").expect("destination");
    View {
        device,
        camera: SoftwareCamera::new(size, size),
        source,
        destination,
    }
}

fn uber_profile() -> PostProcessingProfile {
    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    profile.color_grading.enabled = true;
    profile.vignette.enabled = true;
    profile.grain.enabled = true;
    profile.chromatic_aberration.enabled = true;
    profile
}

fn run_frame(stack: &mut PostProcessingStack, view: &mut View) -> CompositeReport {
    stack.on_pre_cull(&mut view.device, Some(&mut view.camera));
    stack
        .on_pre_render(&mut view.device, &mut view.camera)
        .expect("pre-render");
    let report = stack
        .on_render_image(&mut view.device, view.source, view.destination)
        .expect("composite");
    stack.on_post_render(&mut view.camera);
    report
}

fn bench_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite");
    group.sample_size(20);
    for &size in &[64u32, 128, 256] {
        group.bench_with_input(BenchmarkId::new("copy", size), &size, |b, &size| {
            let mut view = prepare_view(size);
            let mut stack =
                PostProcessingStack::new().with_profile(Arc::new(PostProcessingProfile::default()));
            b.iter(|| black_box(run_frame(&mut stack, &mut view)))
        });
        group.bench_with_input(BenchmarkId::new("uber", size), &size, |b, &size| {
            let mut view = prepare_view(size);
            let mut stack = PostProcessingStack::new().with_profile(Arc::new(uber_profile()));
            b.iter(|| black_box(run_frame(&mut stack, &mut view)))
        });
        group.bench_with_input(BenchmarkId::new("uber_fxaa", size), &size, |b, &size| {
            let mut view = prepare_view(size);
            let mut profile = uber_profile();
            profile.antialiasing.enabled = true;
            let mut stack = PostProcessingStack::new().with_profile(Arc::new(profile));
            b.iter(|| black_box(run_frame(&mut stack, &mut view)))
        });
    }
    group.finish();
}

fn bench_color_grading_bake(c: &mut Criterion) {
    c.bench_function("color_grading_rebake", |b| {
        let mut view = prepare_view(32);
        let mut profile = PostProcessingProfile::default();
        profile.color_grading.enabled = true;
        let mut stack = PostProcessingStack::new().with_profile(Arc::new(profile));
        let mut saturation = 1.0;
        b.iter(|| {
            saturation = if saturation > 1.5 { 0.5 } else { saturation + 0.01 };
            stack.edit_profile(|profile| profile.color_grading.basic.saturation = saturation);
            black_box(run_frame(&mut stack, &mut view))
        })
    });
}

criterion_group!(benches, bench_composite, bench_color_grading_bake);
criterion_main!(benches);
