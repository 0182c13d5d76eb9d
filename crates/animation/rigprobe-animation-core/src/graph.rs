//! PlayableGraph: ownership of the skeleton, clip and script playables, plus
//! time advance and the per-tick evaluation chain.
//!
//! Topology is a single chain: every script playable has at most one input,
//! and evaluation walks from the output back to the first playable, then runs
//! the chain forward (clip sample → script jobs in order).

use crate::binding::ClipBindings;
use crate::clip::Clip;
use crate::config::{GraphConfig, LoopMode};
use crate::error::EvalError;
use crate::ids::{GraphId, IdAllocator, PlayableId};
use crate::job::AnimationJob;
use crate::outputs::{GraphEvent, Outputs};
use crate::pose::Pose;
use crate::sampling::{clip_time, sample_clip_into};
use crate::skeleton::Skeleton;
use crate::stream::{AnimationStream, TransformStreamHandle};
use rigprobe_api_core::BonePath;

/// Weighted link from an upstream playable into a script.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlayableInput {
    pub source: PlayableId,
    pub weight: f32,
}

enum Node {
    Clip {
        clip: Clip,
        bindings: ClipBindings,
    },
    Script {
        job: Box<dyn AnimationJob>,
        input: Option<PlayableInput>,
    },
}

impl Node {
    fn input(&self) -> Option<PlayableInput> {
        match self {
            Node::Clip { .. } => None,
            Node::Script { input, .. } => *input,
        }
    }
}

pub struct PlayableGraph {
    id: GraphId,
    config: GraphConfig,
    skeleton: Skeleton,
    ids: IdAllocator,
    nodes: Vec<Node>,
    output: Option<PlayableId>,
    rest: Pose,
    pose: Pose,
    playing: bool,
    destroyed: bool,
    time: f32,
    tick: u64,
    pending: Vec<GraphEvent>,
    outputs: Outputs,
}

impl PlayableGraph {
    pub fn new(config: GraphConfig, skeleton: Skeleton) -> Self {
        let id = GraphId::next();
        let rest = skeleton.rest_pose();
        log::info!(
            "{id} '{}' created on skeleton '{}' ({} bones, {:?})",
            config.name,
            skeleton.name(),
            skeleton.len(),
            skeleton.kind()
        );
        Self {
            id,
            config,
            skeleton,
            ids: IdAllocator::new(),
            nodes: Vec::new(),
            output: None,
            pose: rest.clone(),
            rest,
            playing: false,
            destroyed: false,
            time: 0.0,
            tick: 0,
            pending: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn is_valid(&self) -> bool {
        !self.destroyed
    }

    pub fn is_playing(&self) -> bool {
        self.playing && !self.destroyed
    }

    /// Graph time in seconds (before loop mapping).
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Number of completed evaluations.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Pose produced by the most recent evaluation (rest pose before the first).
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Events of the most recent evaluation (or of `destroy`).
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    fn ensure_alive(&self) -> Result<(), EvalError> {
        if self.destroyed {
            return Err(EvalError::Destroyed(self.config.name.clone()));
        }
        Ok(())
    }

    fn node(&self, id: PlayableId) -> Result<&Node, EvalError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(EvalError::UnknownPlayable(id))
    }

    /// Bind a stream handle to a bone. Handles stay valid for the graph's lifetime.
    pub fn bind_stream_transform(&self, path: &BonePath) -> Result<TransformStreamHandle, EvalError> {
        self.ensure_alive()?;
        let bone = self
            .skeleton
            .resolve(path)
            .ok_or_else(|| EvalError::BoneNotFound(path.to_string()))?;
        log::debug!("{} bound stream handle '{path}' -> {bone:?}", self.id);
        Ok(TransformStreamHandle::new(self.id, bone))
    }

    /// Add a clip playable. The clip is validated and its tracks are bound once here.
    pub fn add_clip(&mut self, clip: Clip) -> Result<PlayableId, EvalError> {
        self.ensure_alive()?;
        clip.validate_basic()?;
        let bindings = ClipBindings::prebind(&clip, &self.skeleton);
        log::debug!(
            "{} clip '{}': {} tracks bound, {} unresolved",
            self.id,
            clip.name,
            bindings.rows.len(),
            bindings.unresolved.len()
        );
        let id = self.ids.alloc_playable();
        self.nodes.push(Node::Clip { clip, bindings });
        Ok(id)
    }

    pub fn add_script(&mut self, job: Box<dyn AnimationJob>) -> Result<PlayableId, EvalError> {
        self.ensure_alive()?;
        log::debug!("{} script playable '{}' added", self.id, job.name());
        let id = self.ids.alloc_playable();
        self.nodes.push(Node::Script { job, input: None });
        Ok(id)
    }

    /// Connect `source` as the (single) input of script `target`, replacing any previous input.
    pub fn connect(&mut self, source: PlayableId, target: PlayableId, weight: f32) -> Result<(), EvalError> {
        self.ensure_alive()?;
        self.node(source)?;
        if !matches!(self.node(target)?, Node::Script { .. }) {
            return Err(EvalError::NotAScript(target));
        }
        // target must not already feed source
        let mut cursor = Some(source);
        while let Some(id) = cursor {
            if id == target {
                return Err(EvalError::Cycle {
                    upstream: source,
                    downstream: target,
                });
            }
            cursor = self.node(id)?.input().map(|i| i.source);
        }
        if let Some(Node::Script { input, .. }) = self.nodes.get_mut(target.0 as usize) {
            *input = Some(PlayableInput {
                source,
                weight: weight.clamp(0.0, 1.0),
            });
        }
        Ok(())
    }

    pub fn set_output(&mut self, source: PlayableId) -> Result<(), EvalError> {
        self.ensure_alive()?;
        self.node(source)?;
        self.output = Some(source);
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), EvalError> {
        self.ensure_alive()?;
        if !self.playing {
            self.playing = true;
            self.pending.push(GraphEvent::Played { graph: self.id });
            log::info!("{} '{}' playing", self.id, self.config.name);
        }
        Ok(())
    }

    /// Pause time advance; evaluation keeps producing the pose at the current time.
    pub fn stop(&mut self) -> Result<(), EvalError> {
        self.ensure_alive()?;
        if self.playing {
            self.playing = false;
            self.pending.push(GraphEvent::Stopped { graph: self.id });
            log::info!("{} '{}' stopped", self.id, self.config.name);
        }
        Ok(())
    }

    /// Playables from the first upstream node to the output, in evaluation order.
    fn chain(&self) -> Result<Vec<PlayableId>, EvalError> {
        let mut chain = Vec::new();
        let mut cursor = Some(self.output.ok_or(EvalError::NoOutput)?);
        while let Some(id) = cursor {
            chain.push(id);
            cursor = self.node(id)?.input().map(|i| i.source);
        }
        chain.reverse();
        Ok(chain)
    }

    fn clip_duration(&self, chain: &[PlayableId]) -> Option<f32> {
        chain.iter().find_map(|id| match self.nodes.get(id.0 as usize) {
            Some(Node::Clip { clip, .. }) => Some(clip.duration_seconds()),
            _ => None,
        })
    }

    /// Advance time by `dt` (if playing) and evaluate the chain once.
    ///
    /// A job error aborts the tick: remaining jobs are skipped and the pose keeps
    /// whatever was written so far. Events raised before the error are held back
    /// and delivered by the next successful evaluation.
    pub fn evaluate(&mut self, dt: f32) -> Result<&Outputs, EvalError> {
        self.ensure_alive()?;
        let chain = self.chain()?;
        self.outputs.clear();
        self.outputs.events.append(&mut self.pending);
        self.tick += 1;

        let duration = self.clip_duration(&chain);
        if self.playing {
            let before = self.time;
            self.time += dt.max(0.0) * self.config.speed;
            if let Some(d) = duration.filter(|d| *d > 0.0) {
                let wrapped = (self.time / d).floor() != (before / d).floor();
                if wrapped && self.config.loop_mode != LoopMode::Once {
                    self.outputs.events.push(GraphEvent::Looped {
                        graph: self.id,
                        tick: self.tick,
                    });
                }
            }
        }
        log::trace!("{} tick {} t={:.4}s", self.id, self.tick, self.time);

        if let Err(err) = self.run_chain(&chain, dt) {
            self.pending.append(&mut self.outputs.events);
            log::debug!(
                "{} tick {} aborted; {} event(s) held for the next tick",
                self.id,
                self.tick,
                self.pending.len()
            );
            return Err(err);
        }

        let dropped = self.outputs.dropped_writes();
        if dropped > 0 {
            log::warn!("{} tick {}: host dropped {dropped} write(s)", self.id, self.tick);
        }
        Ok(&self.outputs)
    }

    fn run_chain(&mut self, chain: &[PlayableId], dt: f32) -> Result<(), EvalError> {
        let PlayableGraph {
            id,
            config,
            skeleton,
            nodes,
            rest,
            pose,
            time,
            tick,
            outputs,
            ..
        } = self;

        pose.copy_from(rest);
        for &pid in chain {
            let Some(node) = nodes.get_mut(pid.0 as usize) else {
                return Err(EvalError::UnknownPlayable(pid));
            };
            match node {
                Node::Clip { clip, bindings } => {
                    let d = clip.duration_seconds();
                    let u = clip_time(*time, d, config.loop_mode) / d;
                    sample_clip_into(clip, bindings, skeleton, u, pose);
                }
                Node::Script { job, input } => {
                    match input {
                        Some(i) if i.weight < 1.0 => {
                            let upstream = std::mem::replace(pose, rest.clone());
                            pose.blend_toward(&upstream, i.weight);
                        }
                        Some(_) => {}
                        None => pose.copy_from(rest),
                    }
                    let mut stream =
                        AnimationStream::new(*id, skeleton, pose, &mut outputs.events, dt, *tick);
                    if config.apply_root_motion {
                        job.process_root_motion(&mut stream)?;
                    }
                    job.process_animation(&mut stream)?;
                }
            }
        }
        Ok(())
    }

    /// Release all playables. Idempotent; returns `false` if already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            log::debug!("{} '{}' already destroyed", self.id, self.config.name);
            return false;
        }
        self.destroyed = true;
        self.playing = false;
        self.nodes.clear();
        self.output = None;
        self.ids.reset();
        self.pending.clear();
        self.outputs.clear();
        self.outputs
            .events
            .push(GraphEvent::Destroyed { graph: self.id });
        log::info!("{} '{}' destroyed", self.id, self.config.name);
        true
    }
}

impl std::fmt::Debug for PlayableGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayableGraph")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("playables", &self.nodes.len())
            .field("output", &self.output)
            .field("playing", &self.playing)
            .field("destroyed", &self.destroyed)
            .field("time", &self.time)
            .field("tick", &self.tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{KeyValue, Keypoint, Track};
    use crate::skeleton::{BoneDef, SkeletonKind};
    use rigprobe_api_core::{TransformChannel, Vec3};

    struct Nudge {
        handle: TransformStreamHandle,
        calls: u32,
    }

    impl AnimationJob for Nudge {
        fn name(&self) -> &str {
            "nudge"
        }

        fn process_animation(&mut self, stream: &mut AnimationStream<'_>) -> Result<(), EvalError> {
            self.calls += 1;
            let p = self.handle.get_local_position(stream)?;
            self.handle.set_local_position(stream, p + Vec3::X)
        }
    }

    fn skeleton() -> Skeleton {
        let mut s = Skeleton::new("s", SkeletonKind::Generic);
        s.add_bone(BoneDef::new("Root", None)).unwrap();
        s
    }

    fn ramp_clip() -> Clip {
        let mut clip = Clip::empty("ramp", 1000);
        clip.tracks.push(Track {
            bone: BonePath::parse("Root").unwrap(),
            channel: TransformChannel::Translation,
            points: vec![
                Keypoint {
                    stamp: 0.0,
                    value: KeyValue::Vec3(Vec3::ZERO),
                },
                Keypoint {
                    stamp: 1.0,
                    value: KeyValue::Vec3(Vec3::new(0.0, 10.0, 0.0)),
                },
            ],
        });
        clip
    }

    #[test]
    fn clip_then_script_in_order() {
        let mut g = PlayableGraph::new(GraphConfig::default(), skeleton());
        let handle = g
            .bind_stream_transform(&BonePath::parse("Root").unwrap())
            .unwrap();
        let clip = g.add_clip(ramp_clip()).unwrap();
        let job = g.add_script(Box::new(Nudge { handle, calls: 0 })).unwrap();
        g.connect(clip, job, 1.0).unwrap();
        g.set_output(job).unwrap();
        g.play().unwrap();

        let out = g.evaluate(0.5).unwrap();
        assert!(matches!(out.events[0], GraphEvent::Played { .. }));
        let t = g.pose().get(handle.bone()).unwrap().translation;
        assert!((t - Vec3::new(1.0, 5.0, 0.0)).length() < 1e-4);
        assert_eq!(g.tick(), 1);
    }

    #[test]
    fn loops_and_reports() {
        let mut g = PlayableGraph::new(GraphConfig::default(), skeleton());
        let clip = g.add_clip(ramp_clip()).unwrap();
        g.set_output(clip).unwrap();
        g.play().unwrap();
        g.evaluate(0.75).unwrap();
        let out = g.evaluate(0.5).unwrap();
        assert!(out
            .events
            .iter()
            .any(|e| matches!(e, GraphEvent::Looped { .. })));
        let y = g.pose().get(crate::ids::BoneId(0)).unwrap().translation.y;
        assert!((y - 2.5).abs() < 1e-3);
    }

    fn looped_count(out: &Outputs) -> usize {
        out.events
            .iter()
            .filter(|e| matches!(e, GraphEvent::Looped { .. }))
            .count()
    }

    fn playing_ramp(loop_mode: LoopMode) -> PlayableGraph {
        let cfg = GraphConfig {
            loop_mode,
            ..GraphConfig::default()
        };
        let mut g = PlayableGraph::new(cfg, skeleton());
        let clip = g.add_clip(ramp_clip()).unwrap();
        g.set_output(clip).unwrap();
        g.play().unwrap();
        g
    }

    fn root_y(g: &PlayableGraph) -> f32 {
        g.pose().get(crate::ids::BoneId(0)).unwrap().translation.y
    }

    #[test]
    fn once_holds_the_last_frame_without_looping() {
        let mut g = playing_ramp(LoopMode::Once);
        assert_eq!(looped_count(g.evaluate(0.75).unwrap()), 0);
        assert_eq!(looped_count(g.evaluate(0.5).unwrap()), 0);
        assert!((root_y(&g) - 10.0).abs() < 1e-3);
        assert_eq!(looped_count(g.evaluate(1.0).unwrap()), 0);
        assert!((root_y(&g) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn ping_pong_reports_each_reversal() {
        let mut g = playing_ramp(LoopMode::PingPong);
        assert_eq!(looped_count(g.evaluate(0.75).unwrap()), 0);

        // t = 1.25: turned around at the end
        assert_eq!(looped_count(g.evaluate(0.5).unwrap()), 1);
        assert!((root_y(&g) - 7.5).abs() < 1e-3);

        assert_eq!(looped_count(g.evaluate(0.5).unwrap()), 0);

        // t = 2.25: turned around at the start
        assert_eq!(looped_count(g.evaluate(0.5).unwrap()), 1);
        assert!((root_y(&g) - 2.5).abs() < 1e-3);
    }

    #[test]
    fn stop_pauses_time_but_keeps_evaluating() {
        let mut g = playing_ramp(LoopMode::Loop);
        g.evaluate(0.25).unwrap();
        g.stop().unwrap();
        g.stop().unwrap();

        let out = g.evaluate(0.5).unwrap();
        let stopped = out
            .events
            .iter()
            .filter(|e| matches!(e, GraphEvent::Stopped { .. }))
            .count();
        assert_eq!(stopped, 1);
        assert!(!g.is_playing());
        assert_eq!(g.time(), 0.25);
        assert_eq!(g.tick(), 2);
        assert!((root_y(&g) - 2.5).abs() < 1e-3);

        g.play().unwrap();
        g.evaluate(0.25).unwrap();
        assert_eq!(g.time(), 0.5);
    }

    struct Flaky {
        handle: TransformStreamHandle,
        fail: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    impl AnimationJob for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn process_animation(&mut self, stream: &mut AnimationStream<'_>) -> Result<(), EvalError> {
            self.handle.set_local_position(stream, Vec3::Y)?;
            if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
                return Err(rigprobe_api_core::ApiError::InvalidMode(7).into());
            }
            Ok(())
        }
    }

    #[test]
    fn failed_tick_hands_its_events_to_the_next_one() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let mut s = Skeleton::new("h", SkeletonKind::Humanoid);
        s.add_bone(BoneDef::new("Root", None).mapped()).unwrap();
        let mut g = PlayableGraph::new(GraphConfig::default(), s);
        let handle = g
            .bind_stream_transform(&BonePath::parse("Root").unwrap())
            .unwrap();
        let fail = Arc::new(AtomicBool::new(true));
        let job = g
            .add_script(Box::new(Flaky {
                handle,
                fail: Arc::clone(&fail),
            }))
            .unwrap();
        g.set_output(job).unwrap();
        g.play().unwrap();

        let err = g.evaluate(0.1).unwrap_err();
        assert_eq!(err.invalid_mode(), Some(7));

        fail.store(false, Ordering::Relaxed);
        let events = g.evaluate(0.1).unwrap().events.clone();
        assert!(matches!(events[0], GraphEvent::Played { .. }));
        let dropped_ticks: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                GraphEvent::WriteDropped { tick, .. } => Some(*tick),
                _ => None,
            })
            .collect();
        assert_eq!(dropped_ticks, vec![1, 2]);

        let again = g.evaluate(0.1).unwrap();
        assert!(!again
            .events
            .iter()
            .any(|e| matches!(e, GraphEvent::Played { .. })));
    }

    #[test]
    fn rejects_cycles_and_non_script_targets() {
        let mut g = PlayableGraph::new(GraphConfig::default(), skeleton());
        let handle = g
            .bind_stream_transform(&BonePath::parse("Root").unwrap())
            .unwrap();
        let clip = g.add_clip(ramp_clip()).unwrap();
        let a = g.add_script(Box::new(Nudge { handle, calls: 0 })).unwrap();
        let b = g.add_script(Box::new(Nudge { handle, calls: 0 })).unwrap();
        g.connect(a, b, 1.0).unwrap();
        assert!(matches!(g.connect(b, a, 1.0), Err(EvalError::Cycle { .. })));
        assert!(matches!(g.connect(a, clip, 1.0), Err(EvalError::NotAScript(_))));
        assert!(matches!(
            g.connect(PlayableId(99), a, 1.0),
            Err(EvalError::UnknownPlayable(_))
        ));
    }

    #[test]
    fn no_output_and_destroyed() {
        let mut g = PlayableGraph::new(GraphConfig::default(), skeleton());
        assert!(matches!(g.evaluate(0.1), Err(EvalError::NoOutput)));
        assert!(g.destroy());
        assert!(!g.destroy());
        assert!(!g.is_valid());
        assert!(matches!(g.evaluate(0.1), Err(EvalError::Destroyed(_))));
        assert!(g
            .bind_stream_transform(&BonePath::parse("Root").unwrap())
            .is_err());
    }

    struct Hooks {
        log: std::sync::Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    impl AnimationJob for Hooks {
        fn name(&self) -> &str {
            "hooks"
        }

        fn process_root_motion(&mut self, _: &mut AnimationStream<'_>) -> Result<(), EvalError> {
            self.log.lock().unwrap().push("root");
            Ok(())
        }

        fn process_animation(&mut self, _: &mut AnimationStream<'_>) -> Result<(), EvalError> {
            self.log.lock().unwrap().push("anim");
            Ok(())
        }
    }

    #[test]
    fn root_motion_hook_runs_first_when_enabled() {
        for (apply, expected) in [(false, vec!["anim"]), (true, vec!["root", "anim"])] {
            let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
            let cfg = GraphConfig {
                apply_root_motion: apply,
                ..GraphConfig::default()
            };
            let mut g = PlayableGraph::new(cfg, skeleton());
            let job = g
                .add_script(Box::new(Hooks {
                    log: std::sync::Arc::clone(&log),
                }))
                .unwrap();
            g.set_output(job).unwrap();
            g.evaluate(0.1).unwrap();
            assert_eq!(*log.lock().unwrap(), expected);
            // not playing: time stays put
            assert_eq!(g.time(), 0.0);
        }
    }

    #[test]
    fn missing_bone_is_reported() {
        let g = PlayableGraph::new(GraphConfig::default(), skeleton());
        assert!(matches!(
            g.bind_stream_transform(&BonePath::parse("Tail").unwrap()),
            Err(EvalError::BoneNotFound(p)) if p == "Tail"
        ));
    }
}
