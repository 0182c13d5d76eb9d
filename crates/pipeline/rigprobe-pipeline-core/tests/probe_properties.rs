use rigprobe_animation_core::{Clip, EvalError, GraphEvent, Skeleton};
use rigprobe_api_core::blend::angle_delta_degrees;
use rigprobe_api_core::{ModifyMode, Vec3};
use rigprobe_pipeline::{Controls, Pipeline, PipelineConfig};
use rigprobe_test_fixtures::pipelines;

const DT: f32 = 1.0 / 60.0;

fn start(fixture: &str, initial: Controls) -> Pipeline {
    let (config, skeleton, clip): (PipelineConfig, Skeleton, Clip) =
        pipelines::load_all(fixture).expect("pipeline fixture");
    Pipeline::start(config.with_initial(initial), skeleton, clip).expect("start pipeline")
}

fn controls(mode: ModifyMode, target: Vec3, blend: f32) -> Controls {
    Controls {
        mode,
        target,
        blend,
    }
}

fn assert_vec_close(a: Vec3, b: Vec3) {
    assert!((a - b).abs().max_element() < 1e-4, "{a:?} != {b:?}");
}

fn assert_degrees_close(a: Vec3, b: Vec3, tol: f32) {
    for (x, y) in [(a.x, b.x), (a.y, b.y), (a.z, b.z)] {
        assert!(angle_delta_degrees(x, y).abs() < tol, "{a:?} != {b:?}");
    }
}

#[test]
fn full_blend_observes_target_on_generic_skeleton() {
    let scale = Vec3::new(1.0, 2.0, 1.0);
    let mut p = start("head-generic", controls(ModifyMode::Scale, scale, 1.0));
    assert_vec_close(p.step(DT).unwrap().observed.value, scale);

    let offset = Vec3::new(0.1, -0.2, 0.3);
    p.store().publish_controls(controls(ModifyMode::Position, offset, 1.0));
    assert_vec_close(p.step(DT).unwrap().observed.value, offset);

    let euler = Vec3::new(30.0, 45.0, 10.0);
    p.store().publish_controls(controls(ModifyMode::Rotation, euler, 1.0));
    let frame = p.step(DT).unwrap();
    assert_degrees_close(frame.observed.value, euler, 1e-2);
    assert!(frame.report.unwrap().matches);
}

#[test]
fn zero_blend_observes_pre_tick_value() {
    let mut p = start("head-generic", controls(ModifyMode::Scale, Vec3::splat(3.0), 0.0));
    assert_vec_close(p.step(DT).unwrap().observed.value, Vec3::ONE);

    p.store().set_mode(ModifyMode::Position);
    assert_vec_close(p.step(DT).unwrap().observed.value, Vec3::ZERO);

    p.store().set_mode(ModifyMode::Rotation);
    assert_degrees_close(p.step(DT).unwrap().observed.value, Vec3::ZERO, 1e-3);
}

#[test]
fn none_mode_observes_zero() {
    let mut p = start("head-generic", controls(ModifyMode::None, Vec3::splat(5.0), 0.7));
    for _ in 0..3 {
        let frame = p.step(DT).unwrap();
        assert_eq!(frame.observed.value, Vec3::ZERO);
        assert!(frame.report.unwrap().matches);
    }
}

#[test]
fn full_blend_twice_equals_once() {
    let target = Vec3::new(0.0, 90.0, 0.0);
    let mut p = start("head-generic", controls(ModifyMode::Rotation, target, 1.0));
    let once = p.step(DT).unwrap().observed.value;
    let twice = p.step(DT).unwrap().observed.value;
    assert_degrees_close(once, twice, 1e-3);
    assert_degrees_close(once, target, 1e-2);
}

#[test]
fn rotation_takes_the_short_way_round() {
    let mut p = start(
        "head-generic",
        controls(ModifyMode::Rotation, Vec3::new(0.0, 350.0, 0.0), 0.5),
    );
    let observed = p.step(DT).unwrap().observed.value;
    assert!((observed.y - 355.0).abs() < 1e-2, "got {observed:?}");
    assert_degrees_close(Vec3::new(observed.x, 0.0, observed.z), Vec3::ZERO, 1e-3);
}

#[test]
fn half_position_blend_on_generic_skeleton() {
    let mut p = start(
        "head-generic",
        controls(ModifyMode::Position, Vec3::new(0.0, 1.0, 0.0), 0.5),
    );
    let frame = p.step(DT).unwrap();
    assert_vec_close(frame.observed.value, Vec3::new(0.0, 0.5, 0.0));
    assert_eq!(frame.written.tick, frame.observed.tick);
    assert!(frame.report.unwrap().matches);
}

#[test]
fn humanoid_drops_position_and_scale_writes() {
    let mut p = start(
        "head-humanoid",
        controls(ModifyMode::Position, Vec3::new(0.0, 1.0, 0.0), 0.5),
    );
    let frame = p.step(DT).unwrap();
    assert_vec_close(frame.written.value, Vec3::new(0.0, 0.5, 0.0));
    assert_vec_close(frame.observed.value, Vec3::ZERO);
    let report = frame.report.unwrap();
    assert!(!report.matches);
    assert!(report.is_dropped_write());
    assert!(frame
        .events
        .iter()
        .any(|e| matches!(e, GraphEvent::WriteDropped { .. })));

    p.store().publish_controls(controls(ModifyMode::Scale, Vec3::splat(2.0), 1.0));
    assert_vec_close(p.step(DT).unwrap().observed.value, Vec3::ONE);
}

#[test]
fn humanoid_keeps_rotation_writes() {
    let target = Vec3::new(0.0, 40.0, 0.0);
    let mut p = start("head-humanoid", controls(ModifyMode::Rotation, target, 1.0));
    let frame = p.step(DT).unwrap();
    assert_degrees_close(frame.observed.value, target, 1e-2);
    assert!(frame.report.unwrap().matches);
}

#[test]
fn invalid_mode_aborts_the_tick() {
    let mut p = start("head-generic", controls(ModifyMode::Scale, Vec3::ONE, 1.0));
    p.step(DT).unwrap();
    let before = p.store().observed();

    p.store().set_mode_raw(7);
    let err = p.step(DT).unwrap_err();
    let eval = err
        .downcast_ref::<EvalError>()
        .expect("evaluation error in chain");
    assert_eq!(eval.invalid_mode(), Some(7));
    assert_eq!(p.store().observed(), before);

    p.store().set_mode(ModifyMode::None);
    assert_eq!(p.step(DT).unwrap().observed.value, Vec3::ZERO);
}

#[test]
fn failed_first_tick_still_reports_playback() {
    let mut p = start(
        "head-humanoid",
        controls(ModifyMode::Position, Vec3::new(0.0, 1.0, 0.0), 1.0),
    );
    p.store().set_mode_raw(7);
    assert!(p.step(DT).is_err());

    p.store().set_mode(ModifyMode::Position);
    let frame = p.step(DT).unwrap();
    assert!(frame
        .events
        .iter()
        .any(|e| matches!(e, GraphEvent::Played { .. })));
    assert!(frame
        .events
        .iter()
        .any(|e| matches!(e, GraphEvent::WriteDropped { .. })));
}

#[test]
fn non_finite_blend_leaves_the_bone_untouched() {
    let mut p = start(
        "head-generic",
        controls(ModifyMode::Position, Vec3::new(0.0, 1.0, 0.0), 1.0),
    );
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        p.store().set_blend(bad);
        let frame = p.step(DT).unwrap();
        assert!((0.0..=1.0).contains(&frame.controls.blend));
        assert_vec_close(frame.observed.value, Vec3::ZERO);
        assert!(p
            .pose()
            .unwrap()
            .iter()
            .all(|(_, t)| t.translation.is_finite() && t.rotation.is_finite()));
    }
}

#[test]
fn first_frame_reports_playback() {
    let mut p = start("head-generic", Controls::default());
    let frame = p.step(DT).unwrap();
    assert_eq!(frame.step, 1);
    assert_eq!(frame.ticks, 1);
    assert!(frame
        .events
        .iter()
        .any(|e| matches!(e, GraphEvent::Played { .. })));
    assert!(p.pose().is_some());
}

#[test]
fn fixed_rate_decouples_inner_ticks() {
    let mut p = start(
        "head-fixed-rate",
        controls(ModifyMode::Scale, Vec3::splat(2.0), 1.0),
    );
    let idle = p.step(0.01).unwrap();
    assert_eq!(idle.ticks, 0);
    assert!(idle.report.is_none());

    let one = p.step(0.01).unwrap();
    assert_eq!(one.ticks, 1);
    assert_eq!(one.tick, 1);

    let capped = p.step(1.0).unwrap();
    assert_eq!(capped.ticks, 4);
    assert_eq!(capped.tick, 5);
    assert_vec_close(capped.observed.value, Vec3::splat(2.0));
}
