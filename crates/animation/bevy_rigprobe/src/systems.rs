use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::{BoneProbe, ProbeSetup, ProbeStatus};
use crate::resources::{ProbePipelines, ProbeRuntime};
use rigprobe_animation_core::{BoneId, GraphEvent, Skeleton};
use rigprobe_pipeline::{Controls, Pipeline};

/// Map skeleton bones to entities by walking `root` and its descendants and
/// matching `Name`s. Bones without a matching entity are left unbound.
fn bind_bones(
    root: Entity,
    skeleton: &Skeleton,
    names: &Query<&Name>,
    children: &Query<&Children>,
) -> HashMap<BoneId, Entity> {
    fn walk(
        e: Entity,
        out: &mut HashMap<String, Entity>,
        names: &Query<&Name>,
        children: &Query<&Children>,
    ) {
        if let Ok(name) = names.get(e) {
            out.entry(name.as_str().to_string()).or_insert(e);
        }
        if let Ok(cs) = children.get(e) {
            for &c in cs.iter() {
                walk(c, out, names, children);
            }
        }
    }

    let mut by_name = HashMap::new();
    walk(root, &mut by_name, names, children);

    let mut bones = HashMap::new();
    for bone in skeleton.bones() {
        match by_name.get(&bone.name) {
            Some(&e) => {
                bones.insert(bone.id, e);
            }
            None => log::debug!("bone '{}' has no entity under {root:?}", bone.name),
        }
    }
    bones
}

/// Start a pipeline for every probe that just received a `ProbeSetup`.
pub fn start_probes_system(
    mut commands: Commands,
    added: Query<(Entity, &ProbeSetup, &BoneProbe), Added<ProbeSetup>>,
    names: Query<&Name>,
    children: Query<&Children>,
    mut pipelines: ResMut<ProbePipelines>,
) {
    for (entity, setup, probe) in added.iter() {
        let bones = bind_bones(entity, &setup.skeleton, &names, &children);
        let config = setup.config.clone().with_initial(controls_of(probe));
        let mut status = ProbeStatus::default();
        match Pipeline::start(config, setup.skeleton.clone(), setup.clip.clone()) {
            Ok(pipeline) => {
                if let Some(mut old) = pipelines
                    .by_entity
                    .insert(entity, ProbeRuntime { pipeline, bones })
                {
                    old.pipeline.stop();
                }
            }
            Err(err) => {
                log::error!("failed to start probe on {entity:?}: {err:#}");
                status.error = Some(format!("{err:#}"));
            }
        }
        commands
            .entity(entity)
            .remove::<ProbeSetup>()
            .insert(status);
    }
}

fn controls_of(probe: &BoneProbe) -> Controls {
    Controls {
        mode: probe.mode,
        target: probe.bone_value,
        blend: probe.alpha,
    }
}

/// Outer tick: publish each probe's controls as one snapshot.
pub fn push_controls_system(probes: Query<(Entity, &BoneProbe)>, pipelines: Res<ProbePipelines>) {
    for (entity, probe) in probes.iter() {
        if let Some(pipeline) = pipelines.get(entity) {
            pipeline.store().publish_controls(controls_of(probe));
        }
    }
}

/// Step every pipeline with the frame delta.
pub fn evaluate_probes_system(
    time: Res<Time>,
    mut pipelines: ResMut<ProbePipelines>,
    mut statuses: Query<&mut ProbeStatus>,
) {
    let dt = time.delta_seconds();
    for (entity, runtime) in pipelines.by_entity.iter_mut() {
        let result = runtime.pipeline.step(dt);
        let Ok(mut status) = statuses.get_mut(*entity) else {
            continue;
        };
        match result {
            Ok(frame) => {
                status.step = frame.step;
                status.dropped_writes = frame
                    .events
                    .iter()
                    .filter(|e| matches!(e, GraphEvent::WriteDropped { .. }))
                    .count();
                if frame.report.is_some() {
                    status.report = frame.report;
                }
                status.error = None;
            }
            Err(err) => {
                log::error!("probe on {entity:?}: {err:#}");
                status.error = Some(format!("{err:#}"));
            }
        }
    }
}

/// Copy the output pose onto the bound bone entities.
pub fn apply_pose_system(pipelines: Res<ProbePipelines>, mut transforms: Query<&mut Transform>) {
    for runtime in pipelines.by_entity.values() {
        let Some(pose) = runtime.pipeline.pose() else {
            continue;
        };
        for (bone, local) in pose.iter() {
            let Some(&entity) = runtime.bones.get(&bone) else {
                continue;
            };
            if let Ok(mut tf) = transforms.get_mut(entity) {
                tf.translation = local.translation;
                tf.rotation = local.rotation;
                tf.scale = local.scale;
            }
        }
    }
}

/// Publish the read stage's value back into the inspector component.
pub fn readback_system(pipelines: Res<ProbePipelines>, mut probes: Query<(Entity, &mut BoneProbe)>) {
    for (entity, mut probe) in probes.iter_mut() {
        if let Some(pipeline) = pipelines.get(entity) {
            let observed = pipeline.store().observed().value;
            if probe.bone_value_for_read != observed {
                probe.bone_value_for_read = observed;
            }
        }
    }
}

/// Tear down pipelines whose `BoneProbe` was removed or whose entity was despawned.
pub fn stop_removed_probes_system(
    mut removed: RemovedComponents<BoneProbe>,
    mut pipelines: ResMut<ProbePipelines>,
) {
    for entity in removed.read() {
        if let Some(mut runtime) = pipelines.by_entity.remove(&entity) {
            runtime.pipeline.stop();
        }
    }
}
