mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{everything, gradient, stack_with, Scene, HEIGHT, WIDTH};
use postfx_stack::config::shaders;
use postfx_stack::core::material::{keywords, uniforms};
use postfx_stack::core::profile::{AntialiasingMethod, DebugMode};
use postfx_stack::{
    ColorSpace, GraphicsDevice, PostEffect, PostProcessingProfile, PostProcessingStack,
    SoftwareDevice, TextureDesc, TextureFormat, Vec4,
};

#[test]
fn idle_stack_copies_the_frame_exactly() {
    let mut scene = Scene::new();
    let mut stack = stack_with(PostProcessingProfile::default());

    let report = scene.frame(&mut stack);

    assert!(report.direct_copy);
    assert!(!report.uber_pass);
    assert_eq!(report.composite_passes, 1);
    assert_eq!(scene.read(scene.destination), scene.read(scene.source));
    assert_eq!(scene.device.blits_with_shader(shaders::UBER), 0);
}

#[test]
fn stack_without_profile_copies_the_frame() {
    let mut scene = Scene::new();
    let mut stack = PostProcessingStack::new();

    let report = scene.frame(&mut stack);

    assert!(report.direct_copy);
    assert_eq!(scene.read(scene.destination), scene.read(scene.source));
}

#[test]
fn bloom_alone_is_one_uber_pass() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    let mut stack = stack_with(profile);

    let report = scene.frame(&mut stack);

    assert!(report.bloom);
    assert!(report.uber_pass);
    assert!(report.uber_contributed);
    assert_eq!(report.composite_passes, 1);
    assert_eq!(scene.device.blits_with_shader(shaders::UBER), 1);
    assert_eq!(scene.device.blits_with_shader(shaders::FXAA), 0);
    assert!(scene.device.blits_with_shader(shaders::BLOOM) >= 3);
}

#[test]
fn every_effect_fits_in_two_composite_passes() {
    let mut scene = Scene::new();
    let mut stack = stack_with(everything());

    for _ in 0..3 {
        scene.device.clear_blit_log();
        let report = scene.frame(&mut stack);
        assert!(report.composite_passes <= 2);
        assert!(report.uber_pass);
        assert!(report.fxaa_pass);
        assert_eq!(scene.device.blits_with_shader(shaders::UBER), 1);
        assert_eq!(scene.device.blits_with_shader(shaders::FXAA), 1);
    }
    assert_eq!(stack.pool_stats().1, 0);
}

#[test]
fn fxaa_carries_grain_and_dithering() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.antialiasing.enabled = true;
    profile.antialiasing.method = AntialiasingMethod::Fxaa;
    profile.grain.enabled = true;
    profile.dithering.enabled = true;
    let mut stack = stack_with(profile);

    let report = scene.frame(&mut stack);

    assert!(report.fxaa_pass);
    assert!(!report.uber_pass);
    assert_eq!(report.composite_passes, 1);
    assert_eq!(scene.device.blits_with_shader(shaders::UBER), 0);

    let materials = stack.materials();
    let fxaa = materials
        .find(shaders::FXAA)
        .and_then(|id| materials.material(id))
        .expect("fxaa material");
    assert!(fxaa.is_keyword_enabled(keywords::GRAIN));
    assert!(fxaa.is_keyword_enabled(keywords::DITHERING));
    assert!(fxaa.vector(uniforms::GRAIN_PARAMS1).is_some());

    let uber = materials
        .find(shaders::UBER)
        .and_then(|id| materials.material(id))
        .expect("uber material");
    assert!(!uber.is_keyword_enabled(keywords::GRAIN));
    assert!(uber.vector(uniforms::GRAIN_PARAMS1).is_none());
}

#[test]
fn gamma_devices_get_the_gamma_keyword() {
    let mut scene = Scene::with_device(SoftwareDevice::new().with_color_space(ColorSpace::Gamma));
    let mut profile = PostProcessingProfile::default();
    profile.vignette.enabled = true;
    let mut stack = stack_with(profile);

    let report = scene.frame(&mut stack);

    assert!(report.uber_pass);
    let materials = stack.materials();
    let uber = materials
        .find(shaders::UBER)
        .and_then(|id| materials.material(id))
        .expect("uber material");
    assert!(uber.is_keyword_enabled(keywords::COLORSPACE_GAMMA));
    assert!(uber.is_keyword_enabled(keywords::VIGNETTE_CLASSIC));
}

#[test]
fn missing_uber_shader_falls_back_to_a_copy() {
    let mut scene = Scene::with_device(SoftwareDevice::new().without_shader(shaders::UBER));
    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    let mut stack = stack_with(profile);

    let report = scene.frame(&mut stack);

    assert!(report.direct_copy);
    assert!(!report.bloom);
    assert_eq!(scene.read(scene.destination), scene.read(scene.source));
}

#[test]
fn depth_of_field_couples_to_taa_only_when_it_runs() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.depth_of_field.enabled = true;
    let mut stack = stack_with(profile.clone());

    let report = scene.frame(&mut stack);
    assert!(report.depth_of_field);
    assert!(!report.taa);
    assert_eq!(stack.effects().depth_of_field.taa_params(), Vec4::ZERO);

    profile.antialiasing.enabled = true;
    profile.antialiasing.method = AntialiasingMethod::Taa;
    let mut coupled = stack_with(profile);
    let report = scene.frame(&mut coupled);
    assert!(report.taa);
    assert!(report.depth_of_field);
    let params = coupled.effects().depth_of_field.taa_params();
    assert_eq!(params.z, 0.85);
    assert_eq!(params.w, 0.0);
}

#[test]
fn depth_of_field_targets_follow_the_source_size() {
    let mut scene = Scene::new();
    let desc = TextureDesc::new(WIDTH * 2, HEIGHT * 2, TextureFormat::RgbaFloat);
    scene.source = scene
        .device
        .upload_with(desc, |x, y| gradient(x, y, 0.0))
        .expect("source");
    scene.destination = scene
        .device
        .create_texture(desc, "destination")
        .expect("destination");
    let mut profile = PostProcessingProfile::default();
    profile.depth_of_field.enabled = true;
    let mut stack = stack_with(profile);

    let report = scene.frame(&mut stack);
    assert!(report.depth_of_field);

    let dof_targets: Vec<_> = scene
        .device
        .blit_log()
        .iter()
        .filter(|blit| blit.shader.as_deref() == Some(shaders::DEPTH_OF_FIELD))
        .map(|blit| (blit.pass, scene.device.texture_desc(blit.destination)))
        .collect();
    let coc = dof_targets
        .iter()
        .find(|(pass, _)| *pass == 0)
        .and_then(|(_, desc)| *desc)
        .expect("coc target");
    assert_eq!((coc.width, coc.height), (WIDTH * 2, HEIGHT * 2));
    let half = dof_targets
        .iter()
        .find(|(pass, _)| *pass == 2)
        .and_then(|(_, desc)| *desc)
        .expect("prefiltered target");
    assert_eq!((half.width, half.height), (WIDTH, HEIGHT));
}

#[test]
fn interrupting_debug_view_stands_down_composite_effects() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.debug_views.enabled = true;
    profile.debug_views.mode = DebugMode::Depth;
    profile.bloom.enabled = true;
    profile.vignette.enabled = true;
    let mut stack = stack_with(profile);

    let report = scene.frame(&mut stack);

    assert!(stack.effects().debug_views.is_active());
    assert!(!stack.effects().bloom.is_active());
    assert!(!report.bloom);
    assert!(report.direct_copy);
    assert_eq!(scene.device.blits_with_shader(shaders::DEBUG_VIEWS), 1);
}

#[test]
fn monitor_sees_the_final_image() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.vignette.enabled = true;
    let mut stack = stack_with(profile);

    let seen: Rc<RefCell<Option<Vec<Vec4>>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    stack.set_monitor(move |device: &dyn GraphicsDevice, texture| {
        *sink.borrow_mut() = device.read_texture(texture).ok();
    });

    let report = scene.frame(&mut stack);

    assert!(report.monitor_invoked);
    let seen = seen.borrow().clone().expect("monitor ran");
    assert_eq!(seen, scene.read(scene.destination));
    assert_eq!(stack.pool_stats().1, 0);
}

#[test]
fn eye_adaptation_debug_overlay_points_at_the_exposure() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.eye_adaptation.enabled = true;
    profile.debug_views.enabled = true;
    profile.debug_views.mode = DebugMode::EyeAdaptation;
    let mut stack = stack_with(profile);

    let report = scene.frame(&mut stack);

    assert!(report.eye_adaptation);
    let exposure = stack.effects().eye_adaptation.current_exposure();
    assert!(exposure.is_some());
    assert_eq!(
        stack.debug_overlay(),
        exposure.map(postfx_stack::DebugOverlay::EyeAdaptation)
    );
}
