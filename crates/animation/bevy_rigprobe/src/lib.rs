//! Bevy adapter for the rigprobe bone write/read pipeline.
//!
//! Frame order:
//! - Update: start pipelines for new probes, push `BoneProbe` controls into the store
//! - PostUpdate: step each pipeline, apply its output pose to the bone entities
//! - Last: copy the observed value back into `BoneProbe`, stop pipelines of removed probes

use bevy::prelude::*;

pub mod components;
pub mod resources;
pub mod systems;

pub use components::{BoneProbe, ProbeSetup, ProbeStatus};
pub use resources::{ProbePipelines, ProbeRuntime};

pub struct RigprobePlugin;

impl Plugin for RigprobePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProbePipelines>()
            .add_systems(
                Update,
                (systems::start_probes_system, systems::push_controls_system).chain(),
            )
            .add_systems(
                PostUpdate,
                (systems::evaluate_probes_system, systems::apply_pose_system).chain(),
            )
            .add_systems(
                Last,
                (systems::readback_system, systems::stop_removed_probes_system).chain(),
            );
    }
}
