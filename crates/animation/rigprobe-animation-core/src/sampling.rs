//! Track/clip sampling and graph-time to clip-time mapping.
//!
//! Model:
//! - Each Track has ordered Keypoints with normalized stamps in [0,1].
//! - Between two keypoints, vectors lerp and quaternions slerp (shortest arc).
//! - Before the first / after the last keypoint the end value is held.

use crate::binding::ClipBindings;
use crate::clip::{Clip, KeyValue, Keypoint, Track};
use crate::config::LoopMode;
use crate::pose::Pose;
use crate::skeleton::Skeleton;
use rigprobe_api_core::blend::{lerp_vec3, slerp_quat};
use rigprobe_api_core::TransformChannel;

/// Find the segment [i, i+1] that contains normalized time u, and return (i, i+1, local_t),
/// where local_t is normalized to [0, 1] between points[i].stamp .. points[i+1].stamp.
/// Edge cases:
/// - If u <= first.stamp, returns (0, 0, 0) and caller should pick points[0].
/// - If u >= last.stamp, returns (last, last, 0) and caller should pick points[last].
fn find_segment(points: &[Keypoint], u: f32) -> (usize, usize, f32) {
    let n = points.len();
    if n <= 1 || u <= points[0].stamp {
        return (0, 0, 0.0);
    }
    if u >= points[n - 1].stamp {
        return (n - 1, n - 1, 0.0);
    }
    // first keypoint strictly after u
    let hi = points.partition_point(|p| p.stamp <= u).min(n - 1);
    let lo = hi - 1;
    let t0 = points[lo].stamp;
    let t1 = points[hi].stamp;
    let denom = (t1 - t0).max(f32::EPSILON);
    (lo, hi, ((u - t0) / denom).clamp(0.0, 1.0))
}

fn interpolate(a: &KeyValue, b: &KeyValue, t: f32) -> KeyValue {
    match (a, b) {
        (KeyValue::Vec3(a), KeyValue::Vec3(b)) => KeyValue::Vec3(lerp_vec3(*a, *b, t)),
        (KeyValue::Quat(a), KeyValue::Quat(b)) => KeyValue::Quat(slerp_quat(*a, *b, t)),
        // validate_basic rejects mixed tracks; hold the left key if one slips through
        (left, _) => *left,
    }
}

/// Sample a single track at normalized time u ∈ [0,1]. Empty tracks yield `None`.
pub fn sample_track(track: &Track, u: f32) -> Option<KeyValue> {
    let points = &track.points;
    match points.len() {
        0 => None,
        1 => Some(points[0].value),
        _ => {
            let (i0, i1, lt) = find_segment(points, u.clamp(0.0, 1.0));
            if i0 == i1 {
                return Some(points[i0].value);
            }
            Some(interpolate(&points[i0].value, &points[i1].value, lt))
        }
    }
}

fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let period = 2.0 * span;
    let m = fmod(t, period);
    if m <= span {
        m
    } else {
        period - m
    }
}

/// Map graph time (seconds) into clip time (seconds) under a loop mode.
pub fn clip_time(time: f32, duration: f32, mode: LoopMode) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    match mode {
        LoopMode::Once => time.clamp(0.0, duration),
        LoopMode::Loop => fmod(time, duration),
        LoopMode::PingPong => ping_pong(time, duration),
    }
}

/// Write every bound track of `clip` at normalized time `u` into `pose`.
///
/// Channels the skeleton does not carry for a bone (humanoid-mapped translation
/// and scale) are skipped; those bones keep their rest values.
pub fn sample_clip_into(
    clip: &Clip,
    bindings: &ClipBindings,
    skeleton: &Skeleton,
    u: f32,
    pose: &mut Pose,
) {
    for row in &bindings.rows {
        let Some(track) = clip.tracks.get(row.track_idx as usize) else {
            continue;
        };
        if !skeleton.channel_is_writable(row.bone, track.channel) {
            continue;
        }
        let (Some(value), Some(local)) = (sample_track(track, u), pose.get_mut(row.bone)) else {
            continue;
        };
        match (track.channel, value) {
            (TransformChannel::Translation, KeyValue::Vec3(v)) => local.translation = v,
            (TransformChannel::Scale, KeyValue::Vec3(v)) => local.scale = v,
            (TransformChannel::Rotation, KeyValue::Quat(q)) => local.rotation = q,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigprobe_api_core::{BonePath, Quat, Vec3};

    fn key(stamp: f32, v: Vec3) -> Keypoint {
        Keypoint {
            stamp,
            value: KeyValue::Vec3(v),
        }
    }

    fn scale_track(points: Vec<Keypoint>) -> Track {
        Track {
            bone: BonePath::parse("Head").unwrap(),
            channel: TransformChannel::Scale,
            points,
        }
    }

    #[test]
    fn holds_ends_and_lerps_between() {
        let t = scale_track(vec![
            key(0.25, Vec3::ZERO),
            key(0.75, Vec3::new(2.0, 4.0, 6.0)),
        ]);
        assert_eq!(sample_track(&t, 0.0), Some(KeyValue::Vec3(Vec3::ZERO)));
        assert_eq!(
            sample_track(&t, 1.0),
            Some(KeyValue::Vec3(Vec3::new(2.0, 4.0, 6.0)))
        );
        match sample_track(&t, 0.5) {
            Some(KeyValue::Vec3(v)) => assert!((v - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5),
            other => panic!("unexpected sample {other:?}"),
        }
    }

    #[test]
    fn picks_correct_segment_with_many_keys() {
        let t = scale_track(vec![
            key(0.0, Vec3::ZERO),
            key(0.5, Vec3::ONE),
            key(1.0, Vec3::splat(3.0)),
        ]);
        match sample_track(&t, 0.75) {
            Some(KeyValue::Vec3(v)) => assert!((v - Vec3::splat(2.0)).length() < 1e-5),
            other => panic!("unexpected sample {other:?}"),
        }
        assert_eq!(sample_track(&scale_track(vec![]), 0.5), None);
    }

    #[test]
    fn rotation_tracks_slerp() {
        let t = Track {
            bone: BonePath::parse("Head").unwrap(),
            channel: TransformChannel::Rotation,
            points: vec![
                Keypoint {
                    stamp: 0.0,
                    value: KeyValue::Quat(Quat::IDENTITY),
                },
                Keypoint {
                    stamp: 1.0,
                    value: KeyValue::Quat(Quat::from_rotation_y(1.0)),
                },
            ],
        };
        match sample_track(&t, 0.5) {
            Some(KeyValue::Quat(q)) => assert!(q.dot(Quat::from_rotation_y(0.5)).abs() > 0.9999),
            other => panic!("unexpected sample {other:?}"),
        }
    }

    #[test]
    fn loop_modes_map_time() {
        assert_eq!(clip_time(2.5, 2.0, LoopMode::Once), 2.0);
        assert!((clip_time(2.5, 2.0, LoopMode::Loop) - 0.5).abs() < 1e-6);
        assert!((clip_time(2.5, 2.0, LoopMode::PingPong) - 1.5).abs() < 1e-6);
        assert_eq!(clip_time(1.0, 0.0, LoopMode::Loop), 0.0);
    }
}
