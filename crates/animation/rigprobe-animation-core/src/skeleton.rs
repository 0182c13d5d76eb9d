//! Skeleton hierarchy and the per-kind channel policy.
//!
//! A `Humanoid` skeleton carries its mapped bones in muscle space: only the
//! rotation channel of a mapped bone survives into the stream. Translation and
//! scale writes to those bones are discarded by the host, exactly like clip
//! translation/scale keys on them. Unmapped bones and `Generic` skeletons keep
//! full TRS.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::ids::BoneId;
use crate::pose::Pose;
use rigprobe_api_core::{BonePath, LocalTransform, TransformChannel};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkeletonKind {
    #[default]
    Generic,
    Humanoid,
}

/// Serialized bone description; parents are referenced by name and must be listed first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneDef {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub rest: LocalTransform,
    /// Part of the humanoid avatar mapping (ignored on generic skeletons).
    #[serde(default)]
    pub humanoid: bool,
}

impl BoneDef {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            rest: LocalTransform::IDENTITY,
            humanoid: false,
        }
    }

    pub fn with_rest(mut self, rest: LocalTransform) -> Self {
        self.rest = rest;
        self
    }

    pub fn mapped(mut self) -> Self {
        self.humanoid = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonDef {
    pub name: String,
    #[serde(default)]
    pub kind: SkeletonKind,
    pub bones: Vec<BoneDef>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    pub id: BoneId,
    pub name: String,
    pub parent: Option<BoneId>,
    pub rest: LocalTransform,
    pub humanoid: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "SkeletonDef")]
pub struct Skeleton {
    name: String,
    kind: SkeletonKind,
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
}

impl Skeleton {
    pub fn new(name: impl Into<String>, kind: SkeletonKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bones: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Build a skeleton from a definition, validating names and parent order.
    pub fn from_def(def: SkeletonDef) -> Result<Self, EvalError> {
        let mut skeleton = Skeleton::new(def.name, def.kind);
        for bone in def.bones {
            skeleton.add_bone(bone)?;
        }
        Ok(skeleton)
    }

    /// Append a bone. Its parent (if any) must already exist and names must be unique.
    pub fn add_bone(&mut self, def: BoneDef) -> Result<BoneId, EvalError> {
        let invalid = |reason: String| EvalError::InvalidSkeleton {
            name: self.name.clone(),
            reason,
        };
        if def.name.is_empty() || def.name.contains('/') {
            return Err(invalid(format!("bone name '{}' is not a valid segment", def.name)));
        }
        if self.by_name.contains_key(&def.name) {
            return Err(invalid(format!("duplicate bone name '{}'", def.name)));
        }
        let parent = match def.parent.as_deref() {
            Some(p) => Some(
                *self
                    .by_name
                    .get(p)
                    .ok_or_else(|| invalid(format!("parent '{p}' of '{}' is not declared before it", def.name)))?,
            ),
            None => None,
        };

        let id = BoneId(self.bones.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.bones.push(Bone {
            id,
            name: def.name,
            parent,
            rest: def.rest,
            humanoid: def.humanoid,
        });
        Ok(id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SkeletonKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn bones(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    pub fn find_by_name(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    /// Resolve a path. Name-only paths match anywhere; otherwise the segments must
    /// spell the full chain from a root bone.
    pub fn resolve(&self, path: &BonePath) -> Option<BoneId> {
        let id = self.find_by_name(path.bone_name())?;
        if path.is_name_only() {
            return Some(id);
        }
        let chain = self.path_of(id)?;
        (chain == *path).then_some(id)
    }

    /// Full root-to-bone path of a joint.
    pub fn path_of(&self, id: BoneId) -> Option<BonePath> {
        let bone = self.bone(id)?;
        let mut ancestors = Vec::new();
        let mut cursor = bone.parent;
        while let Some(p) = cursor {
            let parent = self.bone(p)?;
            ancestors.push(parent.name.clone());
            cursor = parent.parent;
        }
        ancestors.reverse();
        Some(BonePath::new(ancestors, bone.name.clone()))
    }

    /// Whether the stream keeps values written to `channel` on this bone.
    pub fn channel_is_writable(&self, id: BoneId, channel: TransformChannel) -> bool {
        match (self.kind, self.bone(id)) {
            (_, None) => false,
            (SkeletonKind::Generic, Some(_)) => true,
            (SkeletonKind::Humanoid, Some(bone)) => {
                !bone.humanoid || channel == TransformChannel::Rotation
            }
        }
    }

    pub fn rest_pose(&self) -> Pose {
        Pose::new(self.bones.iter().map(|b| b.rest).collect())
    }
}

impl TryFrom<SkeletonDef> for Skeleton {
    type Error = EvalError;

    fn try_from(def: SkeletonDef) -> Result<Self, Self::Error> {
        Skeleton::from_def(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigprobe_api_core::Vec3;

    fn biped(kind: SkeletonKind) -> Skeleton {
        let mut s = Skeleton::new("biped", kind);
        s.add_bone(BoneDef::new("Armature", None)).unwrap();
        s.add_bone(BoneDef::new("Hips", Some("Armature")).mapped())
            .unwrap();
        s.add_bone(BoneDef::new("Spine", Some("Hips")).mapped())
            .unwrap();
        s.add_bone(
            BoneDef::new("Head", Some("Spine"))
                .with_rest(LocalTransform::from_translation(Vec3::new(0.0, 0.5, 0.0)))
                .mapped(),
        )
        .unwrap();
        s.add_bone(BoneDef::new("HeadProp", Some("Head"))).unwrap();
        s
    }

    #[test]
    fn resolves_full_and_name_only_paths() {
        let s = biped(SkeletonKind::Generic);
        let head = s.find_by_name("Head").unwrap();
        assert_eq!(
            s.resolve(&BonePath::parse("Armature/Hips/Spine/Head").unwrap()),
            Some(head)
        );
        assert_eq!(s.resolve(&BonePath::parse("Head").unwrap()), Some(head));
        assert_eq!(s.resolve(&BonePath::parse("Hips/Head").unwrap()), None);
        assert_eq!(s.resolve(&BonePath::parse("Tail").unwrap()), None);
        assert_eq!(
            s.path_of(head).unwrap().to_string(),
            "Armature/Hips/Spine/Head"
        );
    }

    #[test]
    fn rejects_duplicates_and_forward_parents() {
        let mut s = Skeleton::new("bad", SkeletonKind::Generic);
        s.add_bone(BoneDef::new("A", None)).unwrap();
        assert!(matches!(
            s.add_bone(BoneDef::new("A", None)),
            Err(EvalError::InvalidSkeleton { .. })
        ));
        assert!(matches!(
            s.add_bone(BoneDef::new("B", Some("C"))),
            Err(EvalError::InvalidSkeleton { .. })
        ));
        assert!(s.add_bone(BoneDef::new("a/b", None)).is_err());
    }

    #[test]
    fn humanoid_mapped_bones_only_keep_rotation() {
        let s = biped(SkeletonKind::Humanoid);
        let head = s.find_by_name("Head").unwrap();
        let prop = s.find_by_name("HeadProp").unwrap();
        assert!(s.channel_is_writable(head, TransformChannel::Rotation));
        assert!(!s.channel_is_writable(head, TransformChannel::Translation));
        assert!(!s.channel_is_writable(head, TransformChannel::Scale));
        assert!(s.channel_is_writable(prop, TransformChannel::Scale));

        let g = biped(SkeletonKind::Generic);
        assert!(g.channel_is_writable(head, TransformChannel::Scale));
    }

    #[test]
    fn deserializes_from_def_json() {
        let json = r#"{
            "name": "tiny",
            "kind": "humanoid",
            "bones": [
                { "name": "Hips", "humanoid": true },
                { "name": "Head", "parent": "Hips", "rest": { "translation": [0.0, 1.0, 0.0] } }
            ]
        }"#;
        let s: Skeleton = serde_json::from_str(json).expect("parse skeleton");
        assert_eq!(s.kind(), SkeletonKind::Humanoid);
        assert_eq!(s.len(), 2);
        let pose = s.rest_pose();
        assert_eq!(pose.len(), 2);

        let bad = r#"{ "name": "bad", "bones": [ { "name": "Head", "parent": "Hips" } ] }"#;
        assert!(serde_json::from_str::<Skeleton>(bad).is_err());
    }
}
