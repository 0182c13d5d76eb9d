use serde::{Deserialize, Serialize};

use rigprobe_api_core::blend::angle_delta_degrees;
use rigprobe_api_core::{ModifyMode, Vec3};

use crate::store::{ControlSnapshot, Observation};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsCfg {
    pub enabled: bool,
    /// Max per-component difference between written and observed values
    /// (degrees for rotation, units otherwise).
    pub tolerance: f32,
    /// Log a report every N outer steps (not inner ticks); 0 disables periodic logging.
    pub log_every_n_steps: u64,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        DiagnosticsCfg {
            enabled: true,
            tolerance: 1e-3,
            log_every_n_steps: 0,
        }
    }
}

/// Written-vs-read comparison for one inner tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub tick: u64,
    /// `None` when the raw mode byte is not a valid mode.
    pub mode: Option<ModifyMode>,
    pub target: Vec3,
    pub blend: f32,
    /// What the write stage handed to the stream.
    pub expected: Vec3,
    /// What the read stage saw afterwards.
    pub observed: Vec3,
    pub matches: bool,
}

impl ProbeReport {
    pub fn new(
        controls: &ControlSnapshot,
        written: Observation,
        observed: Observation,
        tolerance: f32,
    ) -> Self {
        let mode = controls.mode().ok();
        let same_tick = written.tick == observed.tick;
        let matches = same_tick && values_match(mode, written.value, observed.value, tolerance);
        Self {
            tick: observed.tick,
            mode,
            target: controls.target,
            blend: controls.blend,
            expected: written.value,
            observed: observed.value,
            matches,
        }
    }

    /// The host kept something other than what was written.
    pub fn is_dropped_write(&self) -> bool {
        !self.matches && matches!(self.mode, Some(m) if m != ModifyMode::None)
    }
}

fn values_match(mode: Option<ModifyMode>, a: Vec3, b: Vec3, tolerance: f32) -> bool {
    match mode {
        Some(ModifyMode::Rotation) => [(a.x, b.x), (a.y, b.y), (a.z, b.z)]
            .into_iter()
            .all(|(x, y)| angle_delta_degrees(x, y).abs() <= tolerance),
        Some(_) => (a - b).abs().max_element() <= tolerance,
        None => false,
    }
}

/// Log the report per the config: periodic `info!`, and `warn!` whenever the
/// observed value differs from the written one.
pub fn log_report(cfg: &DiagnosticsCfg, name: &str, step: u64, report: &ProbeReport) {
    if !cfg.enabled {
        return;
    }
    if report.is_dropped_write() {
        log::warn!(
            "{name}: tick {} {:?} wrote {:?} but read back {:?}; host discarded the write",
            report.tick,
            report.mode,
            report.expected,
            report.observed
        );
    }
    if cfg.log_every_n_steps > 0 && step % cfg.log_every_n_steps == 0 {
        log::info!(
            "{name}: step {step} tick {} mode={:?} target={:?} blend={} written={:?} observed={:?} match={}",
            report.tick,
            report.mode,
            report.target,
            report.blend,
            report.expected,
            report.observed,
            report.matches
        );
    }
}
