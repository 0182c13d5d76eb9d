//! Keyframed skeletal clip data model.

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use rigprobe_api_core::{BonePath, Quat, TransformChannel, Vec3};

/// Keyframe payload. Rotation tracks carry quaternions (x, y, z, w); translation
/// and scale tracks carry vectors.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum KeyValue {
    Vec3(Vec3),
    Quat(Quat),
}

/// A single keypoint in normalized time [0..1].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    /// Normalized time in [0,1] within the clip duration.
    pub stamp: f32,
    pub value: KeyValue,
}

/// A track animating one channel of one bone.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub bone: BonePath,
    pub channel: TransformChannel,
    pub points: Vec<Keypoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Duration in milliseconds (authoritative for mapping normalized stamps to seconds).
    #[serde(rename = "duration")]
    pub duration_ms: u32,
}

impl Clip {
    /// A clip with no tracks: sampling it yields the rest pose.
    pub fn empty(name: impl Into<String>, duration_ms: u32) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
            duration_ms,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        self.duration_ms as f32 / 1000.0
    }

    /// Validate basic invariants (monotonic stamps in [0,1], non-zero duration,
    /// payload kind matching the channel).
    pub fn validate_basic(&self) -> Result<(), EvalError> {
        let invalid = |reason: String| EvalError::InvalidClip {
            name: self.name.clone(),
            reason,
        };
        if self.duration_ms == 0 {
            return Err(invalid("duration must be > 0 ms".into()));
        }
        for track in &self.tracks {
            let mut last = -f32::INFINITY;
            for p in &track.points {
                if !p.stamp.is_finite() || p.stamp < 0.0 || p.stamp > 1.0 {
                    return Err(invalid(format!(
                        "keypoint stamp must be in [0,1] and finite for '{}'",
                        track.bone
                    )));
                }
                if p.stamp < last {
                    return Err(invalid(format!(
                        "keypoint stamps must be non-decreasing for '{}'",
                        track.bone
                    )));
                }
                last = p.stamp;

                let kind_ok = matches!(
                    (track.channel, p.value),
                    (TransformChannel::Rotation, KeyValue::Quat(_))
                        | (TransformChannel::Translation, KeyValue::Vec3(_))
                        | (TransformChannel::Scale, KeyValue::Vec3(_))
                );
                if !kind_ok {
                    return Err(invalid(format!(
                        "{} track for '{}' has a mismatched keyframe payload",
                        track.channel, track.bone
                    )));
                }
            }
        }
        Ok(())
    }
}
