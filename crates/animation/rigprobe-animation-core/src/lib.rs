//! rigprobe Animation Core (engine-agnostic)
//!
//! Reference evaluation host: skeletons with a humanoid channel policy, keyframed
//! clips, per-evaluation streams with bound transform handles, the job callback
//! contract, and a playable graph that chains a clip into script jobs.

pub mod binding;
pub mod clip;
pub mod config;
pub mod error;
pub mod graph;
pub mod ids;
pub mod job;
pub mod outputs;
pub mod pose;
pub mod sampling;
pub mod skeleton;
pub mod stream;

// Re-exports for consumers (pipeline, adapters)
pub use binding::{BindingRow, BoneResolver, ClipBindings};
pub use clip::{Clip, KeyValue, Keypoint, Track};
pub use config::{GraphConfig, LoopMode};
pub use error::EvalError;
pub use graph::{PlayableGraph, PlayableInput};
pub use ids::{BoneId, GraphId, PlayableId};
pub use job::AnimationJob;
pub use outputs::{GraphEvent, Outputs};
pub use pose::Pose;
pub use sampling::{clip_time, sample_track};
pub use skeleton::{Bone, BoneDef, Skeleton, SkeletonDef, SkeletonKind};
pub use stream::{AnimationStream, TransformStreamHandle};
pub use rigprobe_api_core::{BonePath, LocalTransform, ModifyMode, TransformChannel};
