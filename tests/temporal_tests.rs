mod common;

use approx::assert_relative_eq;

use common::{stack_with, Scene};
use postfx_stack::core::profile::{AntialiasingMethod, EyeAdaptationType};
use postfx_stack::{EffectKind, GraphicsDevice, PostProcessingProfile};

fn taa_profile() -> PostProcessingProfile {
    let mut profile = PostProcessingProfile::default();
    profile.antialiasing.enabled = true;
    profile.antialiasing.method = AntialiasingMethod::Taa;
    profile
}

#[test]
fn reset_taa_matches_a_fresh_first_frame() {
    let mut warm = Scene::new();
    let mut stack = stack_with(taa_profile());
    warm.frame(&mut stack);
    warm.repaint(0.3);
    warm.frame(&mut stack);

    stack.reset_temporal_effects();
    warm.repaint(0.6);
    let report = warm.frame(&mut stack);
    assert!(report.taa);
    let after_reset = warm.read(warm.destination);

    let mut cold = Scene::new();
    cold.repaint(0.6);
    let mut fresh = stack_with(taa_profile());
    cold.frame(&mut fresh);

    assert_eq!(after_reset, cold.read(cold.destination));
}

#[test]
fn taa_keeps_one_history_target() {
    let mut scene = Scene::new();
    let mut stack = stack_with(taa_profile());
    for _ in 0..4 {
        scene.frame(&mut stack);
    }
    assert_eq!(stack.history().count_for(EffectKind::TemporalAntialiasing), 1);

    stack.edit_profile(|profile| profile.antialiasing.enabled = false);
    scene.frame(&mut stack);
    assert_eq!(stack.history().count_for(EffectKind::TemporalAntialiasing), 0);
}

#[test]
fn motion_blur_ring_fills_and_resets() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.motion_blur.enabled = true;
    profile.motion_blur.frame_blending = 0.5;
    let mut stack = stack_with(profile);

    for expected in 1..=6 {
        scene.frame(&mut stack);
        assert_eq!(stack.effects().motion_blur.recorded_frames(), expected.min(4));
    }
    assert_eq!(stack.history().count_for(EffectKind::MotionBlur), 4);

    stack.reset_temporal_effects();
    assert_eq!(stack.effects().motion_blur.recorded_frames(), 0);
}

#[test]
fn fixed_eye_adaptation_settles_immediately() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.eye_adaptation.enabled = true;
    profile.eye_adaptation.adaptation_type = EyeAdaptationType::Fixed;
    let mut stack = stack_with(profile);

    scene.frame(&mut stack);
    let first = stack
        .effects()
        .eye_adaptation
        .current_exposure()
        .expect("exposure");
    let first = scene.device.read_texture(first).expect("read")[0].x;

    scene.frame(&mut stack);
    let second = stack
        .effects()
        .eye_adaptation
        .current_exposure()
        .expect("exposure");
    let second = scene.device.read_texture(second).expect("read")[0].x;

    assert!(first > 0.0);
    assert_relative_eq!(first, second, max_relative = 1e-5);
}

#[test]
fn color_grading_bakes_once_until_settings_change() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.color_grading.enabled = true;
    let mut stack = stack_with(profile);
    let lut_shader = postfx_stack::config::shaders::LUT_GENERATOR;

    scene.frame(&mut stack);
    scene.frame(&mut stack);
    assert_eq!(scene.device.blits_with_shader(lut_shader), 1);

    stack.edit_profile(|profile| profile.color_grading.basic.saturation = 0.5);
    scene.frame(&mut stack);
    assert_eq!(scene.device.blits_with_shader(lut_shader), 2);
    assert_eq!(stack.history().count_for(EffectKind::ColorGrading), 1);
}
