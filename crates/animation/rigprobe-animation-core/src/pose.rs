//! Per-bone local transforms for one evaluation.

use serde::{Deserialize, Serialize};

use crate::ids::BoneId;
use rigprobe_api_core::LocalTransform;

/// Local transforms indexed by `BoneId`, one entry per skeleton bone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    locals: Vec<LocalTransform>,
}

impl Pose {
    pub fn new(locals: Vec<LocalTransform>) -> Self {
        Self { locals }
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn get(&self, bone: BoneId) -> Option<&LocalTransform> {
        self.locals.get(bone.index())
    }

    pub fn get_mut(&mut self, bone: BoneId) -> Option<&mut LocalTransform> {
        self.locals.get_mut(bone.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoneId, &LocalTransform)> {
        self.locals
            .iter()
            .enumerate()
            .map(|(i, t)| (BoneId(i as u32), t))
    }

    /// Overwrite this pose with `other` (same skeleton) without reallocating.
    pub fn copy_from(&mut self, other: &Pose) {
        self.locals.clear();
        self.locals.extend_from_slice(&other.locals);
    }

    /// Blend every bone toward `other` by `weight` (0 keeps self, 1 takes other).
    pub fn blend_toward(&mut self, other: &Pose, weight: f32) {
        for (mine, theirs) in self.locals.iter_mut().zip(other.locals.iter()) {
            *mine = mine.blend(theirs, weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigprobe_api_core::Vec3;

    #[test]
    fn blend_toward_weights() {
        let rest = Pose::new(vec![LocalTransform::IDENTITY; 2]);
        let mut moved = Pose::new(vec![
            LocalTransform::from_translation(Vec3::new(2.0, 0.0, 0.0)),
            LocalTransform::IDENTITY,
        ]);
        moved.blend_toward(&rest, 0.25);
        let t = moved.get(BoneId(0)).unwrap().translation;
        assert!((t.x - 1.5).abs() < 1e-6);
        assert!(moved.get(BoneId(2)).is_none());
    }
}
