//! Animation System Tests
//!
//! Tests for:
//! - KeyframeTrack linear/step/cubic interpolation
//! - KeyframeCursor sequential access and binary search fallback
//! - AnimationAction loop modes (Once, Loop, PingPong)
//! - AnimationClip duration
//! - AnimationMixer binding and node updates

use std::f32::consts::PI;
use std::sync::Arc;

use glam::{Quat, Vec3};

use people::animation::action::{AnimationAction, LoopMode};
use people::animation::binding::TargetPath;
use people::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use people::animation::mixer::AnimationMixer;
use people::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use people::animation::values::Interpolatable;
use people::scene::Scene;

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn sample(track: &KeyframeTrack<f32>, t: f32, cursor: &mut KeyframeCursor) -> f32 {
    track.sample_with_cursor(t, cursor).expect("non-empty track")
}

// ============================================================================
// KeyframeTrack: Linear Interpolation
// ============================================================================

#[test]
fn track_linear_f32_midpoint() {
    let track = KeyframeTrack::new(vec![0.0, 1.0], vec![0.0_f32, 10.0], InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    let val = sample(&track, 0.5, &mut cursor);
    assert!(approx(val, 5.0), "Expected 5.0, got {val}");
}

#[test]
fn track_linear_f32_exact_keyframe() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(sample(&track, 0.0, &mut cursor), 0.0));
    assert!(approx(sample(&track, 1.0, &mut cursor), 10.0));
    assert!(approx(sample(&track, 2.0, &mut cursor), 20.0));
}

#[test]
fn track_linear_clamps_outside_range() {
    let track = KeyframeTrack::new(vec![1.0, 2.0], vec![10.0_f32, 20.0], InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    assert!(approx(sample(&track, 5.0, &mut cursor), 20.0));
    assert!(approx(sample(&track, 0.5, &mut cursor), 10.0));
    assert!(approx(track.sample(0.0).unwrap(), 10.0));
    assert!(approx(track.sample(9.0).unwrap(), 20.0));
}

#[test]
fn track_linear_vec3() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Vec3::ZERO, Vec3::new(10.0, 20.0, 30.0)],
        InterpolationMode::Linear,
    );

    let val = track.sample(0.5).unwrap();
    assert!(val.abs_diff_eq(Vec3::new(5.0, 10.0, 15.0), EPSILON));
}

#[test]
fn track_linear_quat_slerp() {
    let q0 = Quat::IDENTITY;
    let q1 = Quat::from_rotation_y(PI / 2.0);

    let track = KeyframeTrack::new(vec![0.0, 1.0], vec![q0, q1], InterpolationMode::Linear);

    let val = track.sample(0.5).unwrap();
    let angle = val.angle_between(q0.slerp(q1, 0.5));
    assert!(angle < 0.01, "Quaternion slerp mismatch: angle={angle}");
    assert!(val.is_normalized());
}

#[test]
fn empty_track_samples_nothing() {
    let track: KeyframeTrack<f32> = KeyframeTrack::new(vec![], vec![], InterpolationMode::Linear);
    let mut cursor = KeyframeCursor::default();

    assert!(track.is_empty());
    assert!(track.sample(0.0).is_none());
    assert!(track.sample_with_cursor(0.0, &mut cursor).is_none());
    assert!(approx(track.end_time(), 0.0));
}

// ============================================================================
// KeyframeTrack: Step Interpolation
// ============================================================================

#[test]
fn track_step_holds_value() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 100.0, 200.0],
        InterpolationMode::Step,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(sample(&track, 0.0, &mut cursor), 0.0));
    assert!(approx(sample(&track, 0.99, &mut cursor), 0.0));
    assert!(approx(sample(&track, 1.0, &mut cursor), 100.0));
    assert!(approx(sample(&track, 1.5, &mut cursor), 100.0));
    assert!(approx(sample(&track, 2.0, &mut cursor), 200.0));
}

// ============================================================================
// KeyframeTrack: Cubic Spline Interpolation
// ============================================================================

#[test]
fn track_cubic_f32_endpoints() {
    // [in_tangent, value, out_tangent] per keyframe
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 0.0, 1.0, 1.0, 10.0, 0.0],
        InterpolationMode::CubicSpline,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(sample(&track, 0.0, &mut cursor), 0.0));
    assert!(approx(sample(&track, 1.0, &mut cursor), 10.0));
}

#[test]
fn track_cubic_zero_tangents_is_symmetric() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 0.0, 0.0, 0.0, 10.0, 0.0],
        InterpolationMode::CubicSpline,
    );

    let mid = track.sample(0.5).unwrap();
    assert!(approx(mid, 5.0), "got {mid}");

    // Ease-in: slower than linear near the start
    let early = track.sample(0.25).unwrap();
    assert!(early < 2.5, "got {early}");
}

// ============================================================================
// KeyframeCursor
// ============================================================================

#[test]
fn cursor_sequential_forward() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 20.0, 30.0, 40.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    for i in 0..=20 {
        let t = i as f32 * 0.2;
        let val = sample(&track, t, &mut cursor);
        assert!(approx(val, t * 10.0), "t={t}: got {val}");
    }
    assert_eq!(cursor.last_index, 4);
}

#[test]
fn cursor_forward_then_jump_back() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        (0..9).map(|i| i as f32 * 10.0).collect(),
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(sample(&track, 7.5, &mut cursor), 75.0));

    // Farther back than the scan window: binary search
    assert!(approx(sample(&track, 0.5, &mut cursor), 5.0));
    assert_eq!(cursor.last_index, 0);
}

#[test]
fn cursor_matches_stateless_sample() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 5.0, 20.0, 15.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    for i in 0..=40 {
        let t = i as f32 * 0.1;
        let with_cursor = sample(&track, t, &mut cursor);
        let stateless = track.sample(t).unwrap();
        assert!(approx(with_cursor, stateless), "t={t}: {with_cursor} != {stateless}");
    }
}

#[test]
fn cursor_single_keyframe() {
    let track = KeyframeTrack::new(vec![0.0], vec![42.0_f32], InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    assert!(approx(sample(&track, 5.0, &mut cursor), 42.0));
}

#[test]
fn interpolatable_f32_linear() {
    assert!(approx(f32::interpolate_linear(0.0, 10.0, 0.25), 2.5));
}

// ============================================================================
// AnimationAction Loop Modes
// ============================================================================

fn make_simple_clip(duration: f32) -> Arc<AnimationClip> {
    let track = Track {
        meta: TrackMeta {
            node_name: "Bone".to_string(),
            target: TargetPath::Translation,
        },
        data: TrackData::Vector3(KeyframeTrack::new(
            vec![0.0, duration],
            vec![Vec3::ZERO, Vec3::new(duration, 0.0, 0.0)],
            InterpolationMode::Linear,
        )),
    };
    Arc::new(AnimationClip::new("Walk".to_string(), vec![track]))
}

#[test]
fn action_starts_stopped() {
    let action = AnimationAction::new(make_simple_clip(1.0));
    assert!(!action.is_playing());
    assert!(!action.is_running());
    assert_eq!(action.loop_mode, LoopMode::Loop);
}

#[test]
fn action_stopped_does_not_advance() {
    let mut action = AnimationAction::new(make_simple_clip(2.0));
    action.update(0.5);
    assert!(approx(action.time, 0.0));
}

#[test]
fn action_loop_mode_once() {
    let mut action = AnimationAction::new(make_simple_clip(2.0));
    action.loop_mode = LoopMode::Once;
    action.play();

    action.update(1.5);
    assert!(approx(action.time, 1.5));

    action.update(1.0);
    assert!(approx(action.time, 2.0), "Once should clamp at the end");
    assert!(action.paused);
    assert!(action.is_playing());
}

#[test]
fn action_loop_mode_loop() {
    let mut action = AnimationAction::new(make_simple_clip(2.0));
    action.play();

    action.update(2.5);
    assert!(approx(action.time, 0.5), "got {}", action.time);
}

#[test]
fn action_loop_reverse_playback() {
    let mut action = AnimationAction::new(make_simple_clip(2.0));
    action.time_scale = -1.0;
    action.play();

    action.update(0.5);
    assert!(approx(action.time, 1.5), "got {}", action.time);
}

#[test]
fn action_ping_pong() {
    let mut action = AnimationAction::new(make_simple_clip(2.0));
    action.loop_mode = LoopMode::PingPong;
    action.play();

    action.update(2.5);
    assert!(approx(action.time, 1.5), "got {}", action.time);
}

#[test]
fn action_paused_no_update() {
    let mut action = AnimationAction::new(make_simple_clip(2.0));
    action.play();
    action.paused = true;

    action.update(1.0);
    assert!(approx(action.time, 0.0));
}

#[test]
fn action_time_scale() {
    let mut action = AnimationAction::new(make_simple_clip(4.0));
    action.loop_mode = LoopMode::Once;
    action.time_scale = 2.0;
    action.play();

    action.update(1.0);
    assert!(approx(action.time, 2.0));
}

#[test]
fn action_stop_rewinds() {
    let mut action = AnimationAction::new(make_simple_clip(2.0));
    action.play().update(1.0);
    action.stop();

    assert!(approx(action.time, 0.0));
    assert!(!action.is_playing());
}

// ============================================================================
// AnimationClip
// ============================================================================

#[test]
fn clip_duration_is_last_keyframe() {
    let short = Track {
        meta: TrackMeta {
            node_name: "A".to_string(),
            target: TargetPath::Scale,
        },
        data: TrackData::Vector3(KeyframeTrack::new(
            vec![0.0, 1.0],
            vec![Vec3::ONE, Vec3::ONE],
            InterpolationMode::Linear,
        )),
    };
    let long = Track {
        meta: TrackMeta {
            node_name: "B".to_string(),
            target: TargetPath::Rotation,
        },
        data: TrackData::Quaternion(KeyframeTrack::new(
            vec![0.0, 3.5],
            vec![Quat::IDENTITY, Quat::IDENTITY],
            InterpolationMode::Step,
        )),
    };

    let clip = AnimationClip::new("Mixed".to_string(), vec![short, long]);
    assert!(approx(clip.duration, 3.5));
}

#[test]
fn clip_empty_tracks_zero_duration() {
    let clip = AnimationClip::new("Empty".to_string(), vec![]);
    assert!(approx(clip.duration, 0.0));
}

// ============================================================================
// AnimationMixer
// ============================================================================

#[test]
fn mixer_binds_by_name_under_root() {
    let mut scene = Scene::new();
    let root = scene.add_group("character");
    let bone = scene.create_node_with_name("Bone");
    scene.attach(bone, root);

    // Same name outside the root is ignored
    let outside = scene.add_group("Bone");

    let mut mixer = AnimationMixer::new(root);
    let index = mixer.clip_action(&scene, make_simple_clip(2.0));

    let action = mixer.action(index).unwrap();
    assert_eq!(action.bindings.len(), 1);
    assert_eq!(action.bindings[0].node_handle, bone);
    assert_ne!(action.bindings[0].node_handle, outside);
}

#[test]
fn mixer_reuses_action_for_same_clip() {
    let mut scene = Scene::new();
    let root = scene.add_group("root");
    let clip = make_simple_clip(1.0);

    let mut mixer = AnimationMixer::new(root);
    let first = mixer.clip_action(&scene, clip.clone());
    let second = mixer.clip_action(&scene, clip);
    let other = mixer.clip_action(&scene, make_simple_clip(1.0));

    assert_eq!(first, second);
    assert_eq!(other, 1);
    assert_eq!(mixer.actions().len(), 2);
}

#[test]
fn mixer_update_writes_transforms() {
    let mut scene = Scene::new();
    let root = scene.add_group("root");
    let bone = scene.create_node_with_name("Bone");
    scene.attach(bone, root);

    let mut mixer = AnimationMixer::new(root);
    let index = mixer.clip_action(&scene, make_simple_clip(2.0));

    // Not playing yet: node stays put
    mixer.update(0.5, &mut scene);
    assert!(scene.get_node(bone).unwrap().transform.position.abs_diff_eq(Vec3::ZERO, EPSILON));

    mixer.action_mut(index).unwrap().play();
    mixer.update(0.5, &mut scene);
    let pos = scene.get_node(bone).unwrap().transform.position;
    assert!(pos.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), EPSILON), "got {pos}");
}

#[test]
fn mixer_half_weight_blends_with_current_value() {
    let mut scene = Scene::new();
    let root = scene.add_group("root");
    let bone = scene.create_node_with_name("Bone");
    scene.attach(bone, root);

    let mut mixer = AnimationMixer::new(root);
    let index = mixer.clip_action(&scene, make_simple_clip(2.0));
    let action = mixer.action_mut(index).unwrap();
    action.weight = 0.5;
    action.play();

    mixer.update(1.0, &mut scene);
    let pos = scene.get_node(bone).unwrap().transform.position;
    assert!(pos.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), EPSILON), "got {pos}");
}

#[test]
fn stop_all_actions() {
    let mut scene = Scene::new();
    let root = scene.add_group("root");
    let mut mixer = AnimationMixer::new(root);
    let a = mixer.clip_action(&scene, make_simple_clip(1.0));
    mixer.action_mut(a).unwrap().play();

    mixer.stop_all_actions();
    assert!(mixer.actions().iter().all(|a| !a.is_playing()));
}
