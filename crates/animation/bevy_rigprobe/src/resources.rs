use bevy::prelude::*;
use std::collections::HashMap;

use rigprobe_animation_core::BoneId;
use rigprobe_pipeline::Pipeline;

/// A running pipeline and the entities its skeleton bones were bound to.
pub struct ProbeRuntime {
    pub pipeline: Pipeline,
    pub bones: HashMap<BoneId, Entity>,
}

/// Running pipelines keyed by the entity carrying the `BoneProbe`.
#[derive(Resource, Default)]
pub struct ProbePipelines {
    pub by_entity: HashMap<Entity, ProbeRuntime>,
}

impl ProbePipelines {
    pub fn get(&self, entity: Entity) -> Option<&Pipeline> {
        self.by_entity.get(&entity).map(|r| &r.pipeline)
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}
