//! Per-evaluation stream access.
//!
//! An `AnimationStream` exists only for the duration of one job callback; a
//! `TransformStreamHandle` is a plain `Copy` token and can only touch bone data
//! through a stream borrow.

use crate::error::EvalError;
use crate::ids::{BoneId, GraphId};
use crate::outputs::GraphEvent;
use crate::pose::Pose;
use crate::skeleton::Skeleton;
use rigprobe_api_core::{LocalTransform, Quat, TransformChannel, Vec3};

/// Handle to one bone's local transform, bound on a specific graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransformStreamHandle {
    graph: GraphId,
    bone: BoneId,
}

impl TransformStreamHandle {
    pub(crate) fn new(graph: GraphId, bone: BoneId) -> Self {
        Self { graph, bone }
    }

    pub fn graph(&self) -> GraphId {
        self.graph
    }

    pub fn bone(&self) -> BoneId {
        self.bone
    }

    /// True when the handle was bound on the graph that owns `stream`.
    pub fn is_valid(&self, stream: &AnimationStream<'_>) -> bool {
        self.graph == stream.graph && stream.skeleton.bone(self.bone).is_some()
    }

    fn check(&self, stream: &AnimationStream<'_>) -> Result<(), EvalError> {
        if self.graph != stream.graph {
            return Err(EvalError::InvalidHandle {
                bone: self.bone,
                bound: self.graph,
                used: stream.graph,
            });
        }
        Ok(())
    }

    pub fn get_local_transform(&self, stream: &AnimationStream<'_>) -> Result<LocalTransform, EvalError> {
        self.check(stream)?;
        stream
            .pose
            .get(self.bone)
            .copied()
            .ok_or_else(|| EvalError::BoneNotFound(format!("{:?}", self.bone)))
    }

    pub fn get_local_position(&self, stream: &AnimationStream<'_>) -> Result<Vec3, EvalError> {
        Ok(self.get_local_transform(stream)?.translation)
    }

    pub fn get_local_rotation(&self, stream: &AnimationStream<'_>) -> Result<Quat, EvalError> {
        Ok(self.get_local_transform(stream)?.rotation)
    }

    pub fn get_local_scale(&self, stream: &AnimationStream<'_>) -> Result<Vec3, EvalError> {
        Ok(self.get_local_transform(stream)?.scale)
    }

    pub fn set_local_position(&self, stream: &mut AnimationStream<'_>, value: Vec3) -> Result<(), EvalError> {
        self.write(stream, TransformChannel::Translation, |t| t.translation = value)
    }

    pub fn set_local_rotation(&self, stream: &mut AnimationStream<'_>, value: Quat) -> Result<(), EvalError> {
        self.write(stream, TransformChannel::Rotation, |t| t.rotation = value)
    }

    pub fn set_local_scale(&self, stream: &mut AnimationStream<'_>, value: Vec3) -> Result<(), EvalError> {
        self.write(stream, TransformChannel::Scale, |t| t.scale = value)
    }

    /// Writes a channel unless the skeleton does not carry it for this bone, in
    /// which case the value is discarded and a `WriteDropped` event is raised.
    /// The caller is not told; this mirrors hosts that ignore such writes.
    fn write(
        &self,
        stream: &mut AnimationStream<'_>,
        channel: TransformChannel,
        apply: impl FnOnce(&mut LocalTransform),
    ) -> Result<(), EvalError> {
        self.check(stream)?;
        if !stream.skeleton.channel_is_writable(self.bone, channel) {
            log::trace!("tick {}: {channel} write on {:?} dropped", stream.tick, self.bone);
            stream.events.push(GraphEvent::WriteDropped {
                bone: self.bone,
                channel,
                tick: stream.tick,
            });
            return Ok(());
        }
        let local = stream
            .pose
            .get_mut(self.bone)
            .ok_or_else(|| EvalError::BoneNotFound(format!("{:?}", self.bone)))?;
        apply(local);
        Ok(())
    }
}

/// Mutable view of the pose flowing through a graph during one evaluation.
pub struct AnimationStream<'a> {
    graph: GraphId,
    skeleton: &'a Skeleton,
    pose: &'a mut Pose,
    events: &'a mut Vec<GraphEvent>,
    delta_time: f32,
    tick: u64,
}

impl<'a> AnimationStream<'a> {
    pub fn new(
        graph: GraphId,
        skeleton: &'a Skeleton,
        pose: &'a mut Pose,
        events: &'a mut Vec<GraphEvent>,
        delta_time: f32,
        tick: u64,
    ) -> Self {
        Self {
            graph,
            skeleton,
            pose,
            events,
            delta_time,
            tick,
        }
    }

    pub fn graph(&self) -> GraphId {
        self.graph
    }

    pub fn skeleton(&self) -> &Skeleton {
        self.skeleton
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Index of the evaluation this stream belongs to (first evaluation is 1).
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pose(&self) -> &Pose {
        self.pose
    }
}
