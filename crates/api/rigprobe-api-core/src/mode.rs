//! Which local transform component the bone stages operate on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::transform::TransformChannel;

/// Selects the transform component written and read back by the bone stages.
///
/// The discriminants are stable: hosts that only carry a byte (inspector fields,
/// shared cells) store `as_u8()` and convert back with `TryFrom<u8>`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ModifyMode {
    #[default]
    None = 0,
    Scale = 1,
    Rotation = 2,
    Position = 3,
}

impl ModifyMode {
    pub const ALL: [ModifyMode; 4] = [
        ModifyMode::None,
        ModifyMode::Scale,
        ModifyMode::Rotation,
        ModifyMode::Position,
    ];

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The transform channel touched by this mode, `None` for `ModifyMode::None`.
    pub fn channel(self) -> Option<TransformChannel> {
        match self {
            ModifyMode::None => None,
            ModifyMode::Scale => Some(TransformChannel::Scale),
            ModifyMode::Rotation => Some(TransformChannel::Rotation),
            ModifyMode::Position => Some(TransformChannel::Translation),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModifyMode::None => "none",
            ModifyMode::Scale => "scale",
            ModifyMode::Rotation => "rotation",
            ModifyMode::Position => "position",
        }
    }
}

impl TryFrom<u8> for ModifyMode {
    type Error = ApiError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(ModifyMode::None),
            1 => Ok(ModifyMode::Scale),
            2 => Ok(ModifyMode::Rotation),
            3 => Ok(ModifyMode::Position),
            other => Err(ApiError::InvalidMode(other)),
        }
    }
}

impl From<ModifyMode> for u8 {
    fn from(mode: ModifyMode) -> Self {
        mode.as_u8()
    }
}

impl fmt::Display for ModifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ModifyMode::None),
            "scale" => Ok(ModifyMode::Scale),
            "rotation" => Ok(ModifyMode::Rotation),
            "position" => Ok(ModifyMode::Position),
            other => Err(format!("unknown modify mode '{other}'")),
        }
    }
}
