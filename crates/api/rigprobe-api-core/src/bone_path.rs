//! BonePath parsing and formatting.
//!
//! Grammar (simple, engine-agnostic):
//!   ancestor/.../bone
//! - '/' separates joint names from the skeleton root down to the target bone
//! - the last segment is the bone the path points at
//!   Examples:
//!   "Armature/Hips/Spine/Head" -> ancestors=["Armature","Hips","Spine"], bone="Head"
//!   "Head" -> ancestors=[], bone="Head" (matched by name anywhere in the skeleton)
//!
//! Hosts resolve a BonePath into a stream handle once, when the pipeline is assembled.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BonePath {
    /// Joint names from the root down to (excluding) the target bone
    pub ancestors: Vec<String>,
    /// Target bone name
    pub bone: String,
}

impl BonePath {
    pub fn new(ancestors: Vec<String>, bone: impl Into<String>) -> Self {
        Self {
            ancestors,
            bone: bone.into(),
        }
    }

    /// Parse a path string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        let invalid = |reason: &'static str| ApiError::InvalidPath {
            path: s.to_string(),
            reason,
        };

        if s.is_empty() {
            return Err(invalid("empty path"));
        }
        let mut parts: Vec<&str> = s.split('/').collect();
        if parts.iter().any(|seg| seg.is_empty()) {
            return Err(invalid("empty segment"));
        }
        if parts
            .iter()
            .any(|seg| seg.chars().any(|c| c.is_whitespace() && c != ' '))
        {
            return Err(invalid("segment contains control whitespace"));
        }
        if parts.iter().any(|seg| seg.trim() != *seg) {
            return Err(invalid("segment has leading or trailing spaces"));
        }

        let bone = parts.pop().ok_or_else(|| invalid("missing bone name"))?;
        Ok(BonePath {
            ancestors: parts.into_iter().map(str::to_string).collect(),
            bone: bone.to_string(),
        })
    }

    /// True when the path is only a bone name and should be matched anywhere.
    pub fn is_name_only(&self) -> bool {
        self.ancestors.is_empty()
    }

    pub fn bone_name(&self) -> &str {
        &self.bone
    }

    /// All segments, root first, target last.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.ancestors
            .iter()
            .map(|s| s.as_str())
            .chain(std::iter::once(self.bone.as_str()))
    }

    /// Number of segments including the target bone.
    pub fn depth(&self) -> usize {
        self.ancestors.len() + 1
    }

    /// Append a child bone, producing the child's path.
    pub fn child(&self, name: impl Into<String>) -> BonePath {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.bone.clone());
        BonePath {
            ancestors,
            bone: name.into(),
        }
    }
}

impl fmt::Display for BonePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in &self.ancestors {
            f.write_str(a)?;
            f.write_str("/")?;
        }
        f.write_str(&self.bone)
    }
}

impl FromStr for BonePath {
    type Err = ApiError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BonePath::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for BonePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BonePath {
    fn deserialize<D>(deserializer: D) -> Result<BonePath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BonePath::parse(&s).map_err(de::Error::custom)
    }
}
