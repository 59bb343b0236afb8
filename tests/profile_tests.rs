mod common;

use std::sync::Arc;

use common::Scene;
use postfx_stack::core::profile::{AntialiasingMethod, FxaaPreset, Tonemapper, VignetteMode};
use postfx_stack::{EffectKind, PostFxError, PostProcessingProfile, PostProcessingStack};

const PROFILE: &str = r#"{
    "antialiasing": { "enabled": true, "method": "Fxaa", "fxaa_preset": "Quality" },
    "bloom": { "enabled": true, "intensity": 1.5 },
    "color_grading": { "enabled": true, "tonemapping": { "tonemapper": "Neutral" } },
    "vignette": { "enabled": true, "mode": "Classic", "intensity": 0.3 }
}"#;

#[test]
fn json_profile_drives_the_stack() {
    let profile = PostProcessingProfile::from_json(PROFILE).expect("profile");
    assert_eq!(profile.antialiasing.method, AntialiasingMethod::Fxaa);
    assert_eq!(profile.antialiasing.fxaa_preset, FxaaPreset::Quality);
    assert_eq!(profile.color_grading.tonemapping.tonemapper, Tonemapper::Neutral);
    assert_eq!(profile.vignette.mode, VignetteMode::Classic);
    assert_eq!(profile.bloom.threshold, 1.1);

    let mut scene = Scene::new();
    let mut stack = PostProcessingStack::new().with_profile(Arc::new(profile));
    let report = scene.frame(&mut stack);

    assert_eq!(
        stack.effects().active_kinds(),
        vec![
            EffectKind::Bloom,
            EffectKind::ColorGrading,
            EffectKind::Vignette,
            EffectKind::Fxaa
        ]
    );
    assert!(report.uber_pass && report.fxaa_pass);
    assert_eq!(report.composite_passes, 2);
}

#[test]
fn profile_survives_a_json_round_trip() {
    let profile = PostProcessingProfile::from_json(PROFILE).expect("profile");
    let json = profile.to_json().expect("serialize");
    let back = PostProcessingProfile::from_json(&json).expect("reparse");
    assert_eq!(profile, back);
}

#[test]
fn malformed_json_is_a_profile_error() {
    let err = PostProcessingProfile::from_json("{ \"bloom\": 3 }").unwrap_err();
    assert!(matches!(err, PostFxError::Profile(_)));
}
