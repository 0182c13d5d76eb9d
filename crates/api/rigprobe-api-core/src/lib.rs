//! rigprobe-api-core: shared value primitives (engine-agnostic)

pub mod blend;
pub mod bone_path;
pub mod error;
pub mod mode;
pub mod transform;

pub use bone_path::BonePath;
pub use error::ApiError;
pub use mode::ModifyMode;
pub use transform::{LocalTransform, TransformChannel};

pub use glam::{Quat, Vec3};
