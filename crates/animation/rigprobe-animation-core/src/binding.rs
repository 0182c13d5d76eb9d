//! Binding of clip tracks to skeleton bones.
//!
//! Tracks name bones by `BonePath`; the graph resolves them once when a clip is
//! added (prebind) and keeps the resolved rows. Unresolved tracks are skipped.

use crate::clip::Clip;
use crate::ids::BoneId;
use crate::skeleton::Skeleton;
use rigprobe_api_core::BonePath;

/// Trait for resolving bone paths to bone ids.
pub trait BoneResolver {
    fn resolve_bone(&self, path: &BonePath) -> Option<BoneId>;
}

impl BoneResolver for Skeleton {
    fn resolve_bone(&self, path: &BonePath) -> Option<BoneId> {
        self.resolve(path)
    }
}

/// One resolved track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingRow {
    pub track_idx: u32,
    pub bone: BoneId,
}

/// Resolved tracks of one clip.
#[derive(Clone, Debug, Default)]
pub struct ClipBindings {
    pub rows: Vec<BindingRow>,
    pub unresolved: Vec<BonePath>,
}

impl ClipBindings {
    pub fn prebind(clip: &Clip, resolver: &dyn BoneResolver) -> Self {
        let mut out = ClipBindings::default();
        for (idx, track) in clip.tracks.iter().enumerate() {
            match resolver.resolve_bone(&track.bone) {
                Some(bone) => out.rows.push(BindingRow {
                    track_idx: idx as u32,
                    bone,
                }),
                None => {
                    log::warn!(
                        "clip '{}': track bone '{}' does not resolve; track skipped",
                        clip.name,
                        track.bone
                    );
                    out.unresolved.push(track.bone.clone());
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
