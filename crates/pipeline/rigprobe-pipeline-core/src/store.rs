use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use rigprobe_api_core::{ApiError, ModifyMode, Vec3};

/// Typed control values as authored in configs and UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub mode: ModifyMode,
    pub target: Vec3,
    pub blend: f32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            mode: ModifyMode::None,
            target: Vec3::ZERO,
            blend: 1.0,
        }
    }
}

/// Control values as the stages see them.
///
/// The mode stays a raw byte so that a value outside `ModifyMode` written by an
/// untyped host control reaches the stages and is rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub mode: u8,
    pub target: Vec3,
    pub blend: f32,
}

impl ControlSnapshot {
    pub fn mode(&self) -> Result<ModifyMode, ApiError> {
        ModifyMode::try_from(self.mode)
    }
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Controls::default().into()
    }
}

impl From<Controls> for ControlSnapshot {
    fn from(c: Controls) -> Self {
        Self {
            mode: c.mode.as_u8(),
            target: c.target,
            blend: clamp_blend(c.blend),
        }
    }
}

/// Clamp a blend factor to [0, 1]. Non-finite factors become 0 so the write
/// stage leaves the bone at its pre-tick value.
pub fn clamp_blend(blend: f32) -> f32 {
    if blend.is_finite() {
        blend.clamp(0.0, 1.0)
    } else {
        log::warn!("non-finite blend factor {blend}; using 0");
        0.0
    }
}

/// Partial control update, e.g. `{"mode":"scale","target":[1,2,1],"blend":0.5}`.
/// Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPatch {
    pub mode: Option<ModifyMode>,
    pub target: Option<Vec3>,
    pub blend: Option<f32>,
}

impl ControlPatch {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("control patch deserialize")
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.target.is_none() && self.blend.is_none()
    }
}

/// A value published by a stage together with the inner tick that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub value: Vec3,
    pub tick: u64,
}

#[derive(Debug, Default)]
struct Latched {
    tick: u64,
    controls: ControlSnapshot,
}

/// Session-lifetime cells shared (behind an `Arc`) by the host controls and the
/// pipeline stages.
///
/// Each cell sits behind its own `RwLock`, so a control publish is one snapshot
/// and an inner tick never sees a half-written set of controls. The first stage
/// to run in a tick latches the controls; later stages of the same tick read the
/// latched copy even if the host publishes in between.
///
/// After `release` every getter returns defaults and every setter is ignored.
#[derive(Debug)]
pub struct ParameterStore {
    controls: RwLock<Option<ControlSnapshot>>,
    latched: RwLock<Option<Latched>>,
    written: RwLock<Option<Observation>>,
    observed: RwLock<Option<Observation>>,
}

impl ParameterStore {
    pub fn new(initial: Controls) -> Self {
        Self {
            controls: RwLock::new(Some(initial.into())),
            latched: RwLock::new(None),
            written: RwLock::new(Some(Observation::default())),
            observed: RwLock::new(Some(Observation::default())),
        }
    }

    fn update_controls(&self, what: &str, f: impl FnOnce(&mut ControlSnapshot)) {
        match self.controls.write().as_mut() {
            Some(c) => f(c),
            None => log::warn!("parameter store released; {what} ignored"),
        }
    }

    /// Replace mode, target and blend in one write.
    pub fn publish_controls(&self, controls: Controls) {
        self.update_controls("publish_controls", |c| *c = controls.into());
    }

    pub fn set_mode(&self, mode: ModifyMode) {
        self.update_controls("set_mode", |c| c.mode = mode.as_u8());
    }

    /// Store a mode byte without validating it.
    pub fn set_mode_raw(&self, raw: u8) {
        self.update_controls("set_mode_raw", |c| c.mode = raw);
    }

    pub fn set_target(&self, target: Vec3) {
        self.update_controls("set_target", |c| c.target = target);
    }

    /// Clamped to [0, 1]; NaN and infinities store 0.
    pub fn set_blend(&self, blend: f32) {
        self.update_controls("set_blend", |c| c.blend = clamp_blend(blend));
    }

    pub fn apply_patch(&self, patch: ControlPatch) {
        if patch.is_empty() {
            return;
        }
        self.update_controls("apply_patch", |c| {
            if let Some(mode) = patch.mode {
                c.mode = mode.as_u8();
            }
            if let Some(target) = patch.target {
                c.target = target;
            }
            if let Some(blend) = patch.blend {
                c.blend = clamp_blend(blend);
            }
        });
    }

    pub fn controls(&self) -> ControlSnapshot {
        (*self.controls.read()).unwrap_or_default()
    }

    pub fn mode_raw(&self) -> u8 {
        self.controls().mode
    }

    pub fn target(&self) -> Vec3 {
        self.controls().target
    }

    pub fn blend(&self) -> f32 {
        self.controls().blend
    }

    /// Controls for inner tick `tick`: the first call of a tick latches the
    /// current snapshot, later calls in the same tick return that same copy.
    pub fn tick_controls(&self, tick: u64) -> ControlSnapshot {
        let current = *self.controls.read();
        let Some(current) = current else {
            return ControlSnapshot::default();
        };
        let mut latched = self.latched.write();
        match latched.as_ref() {
            Some(l) if l.tick == tick => l.controls,
            _ => {
                *latched = Some(Latched {
                    tick,
                    controls: current,
                });
                current
            }
        }
    }

    /// Value the write stage committed on `tick`, in the mode's units.
    pub fn publish_written(&self, value: Vec3, tick: u64) {
        match self.written.write().as_mut() {
            Some(w) => *w = Observation { value, tick },
            None => log::warn!("parameter store released; written value dropped"),
        }
    }

    pub fn written(&self) -> Observation {
        (*self.written.read()).unwrap_or_default()
    }

    /// Value the read stage saw after the write stage ran on `tick`.
    pub fn publish_observed(&self, value: Vec3, tick: u64) {
        match self.observed.write().as_mut() {
            Some(o) => *o = Observation { value, tick },
            None => log::warn!("parameter store released; observation dropped"),
        }
    }

    pub fn observed(&self) -> Observation {
        (*self.observed.read()).unwrap_or_default()
    }

    /// Drop every cell. Returns `false` (and does nothing) if already released.
    pub fn release(&self) -> bool {
        let had = self.controls.write().take().is_some();
        self.latched.write().take();
        self.written.write().take();
        self.observed.write().take();
        if had {
            log::debug!("parameter store released");
        } else {
            log::debug!("parameter store already released");
        }
        had
    }

    pub fn is_released(&self) -> bool {
        self.controls.read().is_none()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(Controls::default())
    }
}
