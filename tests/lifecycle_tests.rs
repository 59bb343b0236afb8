mod common;

use std::sync::Arc;

use common::{everything, stack_with, Scene};
use postfx_stack::core::profile::AntialiasingMethod;
use postfx_stack::PostEffect;
use postfx_stack::{
    Camera, CameraEvent, DepthTextureMode, EffectKind, Mat4, PostProcessingProfile,
    PostProcessingStack, RenderContextKind, RenderingPath, StateTransition, Transition,
};

fn enabled(kind: EffectKind) -> StateTransition {
    StateTransition {
        kind,
        transition: Transition::Enabled,
    }
}

fn disabled(kind: EffectKind) -> StateTransition {
    StateTransition {
        kind,
        transition: Transition::Disabled,
    }
}

#[test]
fn transitions_fire_once_per_change() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    let mut stack = stack_with(profile);

    scene.frame(&mut stack);
    assert_eq!(stack.last_transitions(), &[enabled(EffectKind::Bloom)]);

    scene.frame(&mut stack);
    assert!(stack.last_transitions().is_empty());

    stack.edit_profile(|profile| profile.bloom.enabled = false);
    scene.frame(&mut stack);
    assert_eq!(stack.last_transitions(), &[disabled(EffectKind::Bloom)]);
    assert!(stack.effect_states().enabled_kinds().is_empty());
}

#[test]
fn swapping_profiles_disables_everything_first() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    profile.vignette.enabled = true;
    let mut stack = stack_with(profile.clone());
    scene.frame(&mut stack);

    stack.set_profile(Arc::new(profile));
    scene.frame(&mut stack);
    assert_eq!(
        stack.last_transitions(),
        &[
            disabled(EffectKind::Bloom),
            disabled(EffectKind::Vignette),
            enabled(EffectKind::Bloom),
            enabled(EffectKind::Vignette),
        ]
    );

    let same = Arc::clone(stack.profile().expect("profile"));
    stack.set_profile(same);
    scene.frame(&mut stack);
    assert!(stack.last_transitions().is_empty());
}

#[test]
fn editing_a_freshly_swapped_profile_keeps_the_swap() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    let mut stack = stack_with(profile.clone());
    scene.frame(&mut stack);

    stack.set_profile(Arc::new(profile));
    stack.edit_profile(|profile| profile.vignette.enabled = true);
    scene.frame(&mut stack);
    assert_eq!(
        stack.last_transitions(),
        &[
            disabled(EffectKind::Bloom),
            enabled(EffectKind::Bloom),
            enabled(EffectKind::Vignette),
        ]
    );

    stack.edit_profile(|profile| profile.vignette.enabled = false);
    scene.frame(&mut stack);
    assert_eq!(stack.last_transitions(), &[disabled(EffectKind::Vignette)]);
}

#[test]
fn requested_buffers_follow_active_effects() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.ambient_occlusion.enabled = true;
    profile.motion_blur.enabled = true;
    let mut stack = stack_with(profile);

    scene.frame(&mut stack);
    let mode = scene.camera.depth_texture_mode();
    assert!(mode.contains(DepthTextureMode::DEPTH));
    assert!(mode.contains(DepthTextureMode::DEPTH_NORMALS));
    assert!(mode.contains(DepthTextureMode::MOTION_VECTORS));

    stack.edit_profile(|profile| {
        profile.ambient_occlusion.enabled = false;
        profile.motion_blur.enabled = false;
    });
    scene.frame(&mut stack);
    assert_eq!(scene.camera.depth_texture_mode(), DepthTextureMode::NONE);
}

#[test]
fn occlusion_moves_events_with_the_rendering_path() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.ambient_occlusion.enabled = true;
    profile.ambient_occlusion.ambient_only = true;
    let mut stack = stack_with(profile);

    scene.frame(&mut stack);
    assert_eq!(scene.camera.attached_at(CameraEvent::BeforeImageEffectsOpaque), 1);
    assert_eq!(
        stack.command_buffers().event_of(EffectKind::AmbientOcclusion),
        Some(CameraEvent::BeforeImageEffectsOpaque)
    );

    scene.camera.set_rendering_path(RenderingPath::Deferred);
    scene.frame(&mut stack);
    assert_eq!(scene.camera.attached_at(CameraEvent::BeforeImageEffectsOpaque), 0);
    assert_eq!(scene.camera.attached_at(CameraEvent::BeforeReflections), 1);
    assert_eq!(stack.command_buffers().created(), 2);
    assert_eq!(stack.command_buffers().removed(), 1);
    assert_eq!(scene.camera.buffers_removed(), 1);

    scene.frame(&mut stack);
    assert_eq!(stack.command_buffers().created(), 2);
}

#[test]
fn disabled_command_buffer_effects_detach() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.ambient_occlusion.enabled = true;
    let mut stack = stack_with(profile);

    scene.frame(&mut stack);
    assert_eq!(scene.camera.attached_buffers().len(), 1);

    stack.edit_profile(|profile| profile.ambient_occlusion.enabled = false);
    scene.frame(&mut stack);
    assert!(scene.camera.attached_buffers().is_empty());
    assert!(stack.command_buffers().is_empty());
}

#[test]
fn teardown_releases_every_resource() {
    let mut scene = Scene::new();
    let baseline = scene.device.live_textures();
    let mut stack = stack_with(everything());

    scene.frame(&mut stack);
    scene.frame(&mut stack);
    assert!(scene.device.live_textures() > baseline);
    assert!(!stack.history().is_empty());

    stack.teardown(&mut scene.device, Some(&mut scene.camera));

    assert_eq!(scene.device.live_textures(), baseline);
    assert!(stack.history().is_empty());
    assert!(stack.materials().is_empty());
    assert_eq!(stack.pool_stats().0 + stack.pool_stats().1, 0);
    assert!(scene.camera.attached_buffers().is_empty());
    assert_eq!(scene.camera.depth_texture_mode(), DepthTextureMode::NONE);
    assert!(stack
        .last_transitions()
        .iter()
        .all(|transition| transition.transition == Transition::Disabled));
    assert!(stack.effect_states().enabled_kinds().is_empty());
}

#[test]
fn preview_context_never_jitters_or_blurs_motion() {
    let mut scene = Scene::new();
    let mut profile = everything();
    profile.antialiasing.method = AntialiasingMethod::Taa;
    let mut stack = stack_with(profile);
    stack.set_render_context(RenderContextKind::Preview);

    stack.on_pre_cull(&mut scene.device, Some(&mut scene.camera));
    assert!(!scene.camera.is_jittered());
    assert!(!stack.is_camera_jittered());

    stack
        .on_pre_render(&mut scene.device, &mut scene.camera)
        .expect("pre-render");
    assert!(!stack.command_buffers().contains(EffectKind::MotionBlur));
    assert_eq!(scene.camera.attached_at(CameraEvent::BeforeImageEffects), 0);

    let report = stack
        .on_render_image(&mut scene.device, scene.source, scene.destination)
        .expect("composite");
    assert!(!report.depth_of_field);
    assert!(!report.taa);
    assert_eq!(stack.history().count_for(EffectKind::TemporalAntialiasing), 0);
    stack.on_post_render(&mut scene.camera);
}

#[test]
fn preview_context_skips_the_taa_resolve() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.antialiasing.enabled = true;
    profile.antialiasing.method = AntialiasingMethod::Taa;
    let mut stack = stack_with(profile);
    stack.set_render_context(RenderContextKind::Preview);

    for _ in 0..2 {
        let report = scene.frame(&mut stack);
        assert!(!report.taa);
        assert!(report.direct_copy);
    }
    assert!(stack.effects().taa.is_active());
    assert_eq!(stack.history().count_for(EffectKind::TemporalAntialiasing), 0);
    assert_eq!(scene.read(scene.destination), scene.read(scene.source));
}

#[test]
fn primary_taa_jitters_until_post_render() {
    let mut scene = Scene::new();
    let own = scene.camera.projection_matrix();
    let mut profile = PostProcessingProfile::default();
    profile.antialiasing.enabled = true;
    profile.antialiasing.method = AntialiasingMethod::Taa;
    let mut stack = stack_with(profile);

    stack.on_pre_cull(&mut scene.device, Some(&mut scene.camera));
    assert!(scene.camera.is_jittered());

    stack.on_post_render(&mut scene.camera);
    assert!(!scene.camera.is_jittered());
    assert_eq!(scene.camera.projection_matrix(), own);
}

#[test]
fn custom_jitter_function_builds_the_projection() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.antialiasing.enabled = true;
    profile.antialiasing.method = AntialiasingMethod::Taa;
    let mut stack = stack_with(profile);
    stack.set_jitter_function(|offset| Mat4::from_translation(offset.extend(0.0)));

    stack.on_pre_cull(&mut scene.device, Some(&mut scene.camera));
    let jitter = stack.effects().taa.jitter();
    assert_eq!(
        scene.camera.projection_matrix(),
        Mat4::from_translation(jitter.extend(0.0))
    );
}

#[test]
fn pre_cull_without_camera_skips_the_frame() {
    let mut scene = Scene::new();
    let mut profile = PostProcessingProfile::default();
    profile.bloom.enabled = true;
    let mut stack = stack_with(profile);

    stack.on_pre_cull(&mut scene.device, None);
    assert!(stack.frame_info().is_none());
    assert!(stack.last_transitions().is_empty());

    let report = stack
        .on_render_image(&mut scene.device, scene.source, scene.destination)
        .expect("composite");
    assert!(report.direct_copy);
}

#[test]
fn fresh_stack_has_nothing_attached() {
    let stack = PostProcessingStack::default();
    assert!(stack.command_buffers().is_empty());
    assert!(stack.history().is_empty());
    assert!(stack.debug_overlay().is_none());
}
