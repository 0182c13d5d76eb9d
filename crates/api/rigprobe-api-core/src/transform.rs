//! Local (parent-relative) joint transforms.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blend::{lerp_vec3, slerp_quat};

/// One of the three TRS channels of a local transform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformChannel {
    Translation,
    Rotation,
    Scale,
}

impl fmt::Display for TransformChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransformChannel::Translation => "translation",
            TransformChannel::Rotation => "rotation",
            TransformChannel::Scale => "scale",
        };
        f.write_str(s)
    }
}

/// Joint transform relative to its parent, split to TRS.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalTransform {
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default = "identity_rotation")]
    pub rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn identity_rotation() -> Quat {
    Quat::IDENTITY
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    /// TRS blend: translation/scale lerp, rotation shortest-arc slerp.
    pub fn blend(&self, other: &LocalTransform, t: f32) -> LocalTransform {
        LocalTransform {
            translation: lerp_vec3(self.translation, other.translation, t),
            rotation: slerp_quat(self.rotation, other.rotation, t),
            scale: lerp_vec3(self.scale, other.scale, t),
        }
    }
}
