//! Per-tick jobs inserted between the clip source and the graph output.

pub mod read;
pub mod write;

use std::sync::Arc;

use rigprobe_animation_core::{AnimationJob, TransformStreamHandle};

use crate::store::ParameterStore;

pub use read::BoneReadStage;
pub use write::BoneWriteStage;

/// The fixed probe chain: write the bone, then read it back.
pub fn probe_stages(
    handle: TransformStreamHandle,
    store: &Arc<ParameterStore>,
) -> Vec<Box<dyn AnimationJob>> {
    vec![
        Box::new(BoneWriteStage::new(handle, Arc::clone(store))),
        Box::new(BoneReadStage::new(handle, Arc::clone(store))),
    ]
}
