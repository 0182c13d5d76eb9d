use std::sync::Arc;

use rigprobe_animation_core::{AnimationJob, AnimationStream, EvalError, TransformStreamHandle};
use rigprobe_api_core::blend::euler_degrees_from_quat;
use rigprobe_api_core::{ModifyMode, Vec3};

use crate::store::ParameterStore;

/// Reads the mode's component back after the write stage and publishes it.
/// Rotation comes back as Euler degrees in [0, 360). Never writes to the stream.
pub struct BoneReadStage {
    handle: TransformStreamHandle,
    store: Arc<ParameterStore>,
}

impl BoneReadStage {
    pub fn new(handle: TransformStreamHandle, store: Arc<ParameterStore>) -> Self {
        Self { handle, store }
    }
}

impl AnimationJob for BoneReadStage {
    fn name(&self) -> &str {
        "bone-read"
    }

    fn process_animation(&mut self, stream: &mut AnimationStream<'_>) -> Result<(), EvalError> {
        let tick = stream.tick();
        let h = self.handle;
        let observed = match self.store.tick_controls(tick).mode()? {
            ModifyMode::None => Vec3::ZERO,
            ModifyMode::Scale => h.get_local_scale(stream)?,
            ModifyMode::Rotation => euler_degrees_from_quat(h.get_local_rotation(stream)?),
            ModifyMode::Position => h.get_local_position(stream)?,
        };
        self.store.publish_observed(observed, tick);
        Ok(())
    }
}
