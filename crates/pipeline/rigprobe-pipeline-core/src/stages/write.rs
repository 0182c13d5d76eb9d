use std::sync::Arc;

use rigprobe_animation_core::{AnimationJob, AnimationStream, EvalError, TransformStreamHandle};
use rigprobe_api_core::blend::{
    euler_degrees_from_quat, lerp_vec3, quat_from_euler_degrees, slerp_quat,
};
use rigprobe_api_core::{ModifyMode, Vec3};

use crate::store::ParameterStore;

/// Moves one bone component from its current value toward the store's target.
///
/// - Scale, Position: component-wise lerp.
/// - Rotation: shortest-arc slerp toward the target Euler angles (degrees).
///
/// The value handed to the stream is also published to the store as "written",
/// whether or not the host keeps it.
pub struct BoneWriteStage {
    handle: TransformStreamHandle,
    store: Arc<ParameterStore>,
}

impl BoneWriteStage {
    pub fn new(handle: TransformStreamHandle, store: Arc<ParameterStore>) -> Self {
        Self { handle, store }
    }
}

impl AnimationJob for BoneWriteStage {
    fn name(&self) -> &str {
        "bone-write"
    }

    fn process_animation(&mut self, stream: &mut AnimationStream<'_>) -> Result<(), EvalError> {
        let tick = stream.tick();
        let controls = self.store.tick_controls(tick);
        let h = self.handle;
        let t = controls.blend;

        let written = match controls.mode()? {
            ModifyMode::None => Vec3::ZERO,
            ModifyMode::Scale => {
                let next = lerp_vec3(h.get_local_scale(stream)?, controls.target, t);
                h.set_local_scale(stream, next)?;
                next
            }
            ModifyMode::Rotation => {
                let goal = quat_from_euler_degrees(controls.target);
                let next = slerp_quat(h.get_local_rotation(stream)?, goal, t);
                h.set_local_rotation(stream, next)?;
                euler_degrees_from_quat(next)
            }
            ModifyMode::Position => {
                let next = lerp_vec3(h.get_local_position(stream)?, controls.target, t);
                h.set_local_position(stream, next)?;
                next
            }
        };
        self.store.publish_written(written, tick);
        Ok(())
    }
}
