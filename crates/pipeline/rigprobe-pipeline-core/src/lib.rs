//! rigprobe-pipeline
//!
//! Bone write/read probe over the rigprobe evaluation host. A `Pipeline` owns
//! one playable graph (clip → write stage → read stage → output) and the
//! `ParameterStore` shared with whatever drives the controls.

pub mod assembly;
pub mod config;
pub mod diagnostics;
pub mod scheduler;
pub mod stages;
pub mod store;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use rigprobe_animation_core::{
    AnimationJob, Clip, GraphEvent, PlayableGraph, Pose, Skeleton, TransformStreamHandle,
};

pub use crate::assembly::{assemble, Assembly};
pub use crate::config::PipelineConfig;
pub use crate::diagnostics::{DiagnosticsCfg, ProbeReport};
pub use crate::scheduler::{Clock, Schedule, TickPlan};
pub use crate::stages::{probe_stages, BoneReadStage, BoneWriteStage};
pub use crate::store::{ControlPatch, ControlSnapshot, Controls, Observation, ParameterStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFrame {
    /// Outer step counter (first step is 1).
    pub step: u64,
    pub dt: f32,
    /// Inner ticks evaluated during this step.
    pub ticks: u32,
    /// Graph tick of the last inner evaluation.
    pub tick: u64,
    pub controls: ControlSnapshot,
    pub written: Observation,
    pub observed: Observation,
    /// Present when at least one inner tick ran.
    pub report: Option<ProbeReport>,
    /// Graph events since the last returned frame, including those raised by
    /// ticks of a step that failed.
    pub events: Vec<GraphEvent>,
}

#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    store: Arc<ParameterStore>,
    graph: Option<PlayableGraph>,
    handle: TransformStreamHandle,
    clock: Clock,
    steps: u64,
    carried: Vec<GraphEvent>,
}

impl Pipeline {
    /// Create the store, assemble the graph around `config.bone` and start playback.
    pub fn start(config: PipelineConfig, skeleton: Skeleton, clip: Clip) -> Result<Self> {
        Self::start_with_stages(config, skeleton, clip, probe_stages)
    }

    fn start_with_stages<F>(
        config: PipelineConfig,
        skeleton: Skeleton,
        clip: Clip,
        stages: F,
    ) -> Result<Self>
    where
        F: FnOnce(TransformStreamHandle, &Arc<ParameterStore>) -> Vec<Box<dyn AnimationJob>>,
    {
        let store = Arc::new(ParameterStore::new(config.initial));
        let Assembly { graph, handle, .. } = assemble(
            config.graph.clone(),
            skeleton,
            clip,
            &config.bone,
            |handle| stages(handle, &store),
        )
        .with_context(|| format!("assembling pipeline '{}'", config.name))?;

        log::info!(
            "pipeline '{}' started on bone '{}' ({:?})",
            config.name,
            config.bone,
            config.schedule
        );
        Ok(Self {
            config,
            store,
            graph: Some(graph),
            handle,
            clock: Clock::new(),
            steps: 0,
            carried: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Shared handle for the control surface.
    pub fn store(&self) -> Arc<ParameterStore> {
        Arc::clone(&self.store)
    }

    pub fn handle(&self) -> TransformStreamHandle {
        self.handle
    }

    pub fn graph(&self) -> Option<&PlayableGraph> {
        self.graph.as_ref()
    }

    /// Output pose of the last inner tick; `None` once stopped.
    pub fn pose(&self) -> Option<&Pose> {
        self.graph.as_ref().map(PlayableGraph::pose)
    }

    pub fn is_running(&self) -> bool {
        self.graph.is_some()
    }

    /// Run one outer frame: zero or more inner ticks per the schedule.
    ///
    /// An `InvalidMode` (or any evaluation error) aborts the current inner tick
    /// and is returned; callers can `downcast_ref::<EvalError>()` it. Events
    /// raised before the error arrive with the next successful frame.
    pub fn step(&mut self, dt: f32) -> Result<PipelineFrame> {
        let Some(graph) = self.graph.as_mut() else {
            bail!("pipeline '{}' is stopped", self.config.name);
        };
        self.steps += 1;
        let plan = self.config.schedule.plan(&mut self.clock, dt);

        for _ in 0..plan.ticks {
            let next = graph.tick() + 1;
            let out = graph.evaluate(plan.tick_dt).with_context(|| {
                format!(
                    "pipeline '{}' step {} tick {next}",
                    self.config.name, self.steps
                )
            })?;
            self.carried.extend(out.events.iter().cloned());
        }
        let events = std::mem::take(&mut self.carried);
        let tick = graph.tick();
        log::trace!(
            "pipeline '{}' step {}: {} inner tick(s)",
            self.config.name,
            self.steps,
            plan.ticks
        );

        // the controls the stages actually used on the last inner tick
        let controls = if plan.ticks > 0 {
            self.store.tick_controls(tick)
        } else {
            self.store.controls()
        };
        let written = self.store.written();
        let observed = self.store.observed();
        let report = (plan.ticks > 0).then(|| {
            ProbeReport::new(&controls, written, observed, self.config.diagnostics.tolerance)
        });
        if let Some(report) = &report {
            diagnostics::log_report(&self.config.diagnostics, &self.config.name, self.steps, report);
        }

        Ok(PipelineFrame {
            step: self.steps,
            dt,
            ticks: plan.ticks,
            tick,
            controls,
            written,
            observed,
            report,
            events,
        })
    }

    /// Destroy the graph, then release the store. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        let Some(mut graph) = self.graph.take() else {
            log::debug!("pipeline '{}' already stopped", self.config.name);
            return false;
        };
        graph.destroy();
        drop(graph);
        self.store.release();
        log::info!(
            "pipeline '{}' stopped after {} step(s)",
            self.config.name,
            self.steps
        );
        true
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
