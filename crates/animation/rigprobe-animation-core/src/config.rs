//! Core configuration for rigprobe-animation-core.

use serde::{Deserialize, Serialize};

/// How graph time maps onto clip time once it passes the clip's end.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    Once,
    #[default]
    Loop,
    PingPong,
}

/// Configuration for a playable graph.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphConfig {
    /// Display name used in logs and events.
    pub name: String,
    pub loop_mode: LoopMode,
    /// Playback speed multiplier applied to `dt`.
    pub speed: f32,
    /// Invoke each job's root-motion hook before its pose hook.
    pub apply_root_motion: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: "rigprobe".to_string(),
            loop_mode: LoopMode::Loop,
            speed: 1.0,
            apply_root_motion: false,
        }
    }
}
