use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rigprobe_animation_core::GraphConfig;
use rigprobe_api_core::BonePath;

use crate::diagnostics::DiagnosticsCfg;
use crate::scheduler::Schedule;
use crate::store::Controls;

/// Everything `Pipeline::start` needs besides the skeleton and clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    /// Bone to probe: a full `Root/.../Bone` path or a bare bone name.
    pub bone: BonePath,
    pub schedule: Schedule,
    /// Controls published into the store at start.
    pub initial: Controls,
    pub graph: GraphConfig,
    pub diagnostics: DiagnosticsCfg,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "rigprobe".to_string(),
            bone: BonePath::new(Vec::new(), "Head"),
            schedule: Schedule::default(),
            initial: Controls::default(),
            graph: GraphConfig::default(),
            diagnostics: DiagnosticsCfg::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("pipeline config deserialize")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn with_bone(mut self, bone: BonePath) -> Self {
        self.bone = bone;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_initial(mut self, initial: Controls) -> Self {
        self.initial = initial;
        self
    }
}
