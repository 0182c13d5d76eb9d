use bevy::prelude::*;
use rigprobe_animation_core::{Clip, Skeleton};
use rigprobe_api_core::ModifyMode;
use rigprobe_pipeline::{PipelineConfig, ProbeReport};

/// Inspector surface for one probed bone. Put it on the root entity of a rig
/// whose descendants carry `Name`s matching the skeleton's bones.
///
/// `mode`, `bone_value` and `alpha` are pushed into the pipeline every frame;
/// `bone_value_for_read` is filled from the read stage at the end of the frame.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct BoneProbe {
    pub mode: ModifyMode,
    pub bone_value: Vec3,
    /// Blend factor in [0, 1].
    pub alpha: f32,
    pub bone_value_for_read: Vec3,
}

impl Default for BoneProbe {
    fn default() -> Self {
        Self {
            mode: ModifyMode::None,
            bone_value: Vec3::ZERO,
            alpha: 1.0,
            bone_value_for_read: Vec3::ZERO,
        }
    }
}

impl BoneProbe {
    pub fn new(mode: ModifyMode, bone_value: Vec3, alpha: f32) -> Self {
        Self {
            mode,
            bone_value,
            alpha,
            ..Default::default()
        }
    }
}

/// Data needed to start the pipeline for a `BoneProbe`; consumed on start.
#[derive(Component, Debug, Clone)]
pub struct ProbeSetup {
    pub config: PipelineConfig,
    pub skeleton: Skeleton,
    pub clip: Clip,
}

/// Outcome of the most recent pipeline step for a probe.
#[derive(Component, Debug, Clone, Default)]
pub struct ProbeStatus {
    pub step: u64,
    pub report: Option<ProbeReport>,
    pub dropped_writes: usize,
    pub error: Option<String>,
}
