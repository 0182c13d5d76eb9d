use serde::{Deserialize, Serialize};

/// How outer `Pipeline::step(dt)` calls map onto inner graph evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    /// One inner tick per step, evaluated with the step's `dt`.
    #[default]
    Lockstep,
    /// Accumulate `dt` and run one inner tick per elapsed `step_seconds`.
    FixedRate {
        step_seconds: f32,
        #[serde(default = "default_max_ticks")]
        max_ticks_per_step: u32,
    },
}

fn default_max_ticks() -> u32 {
    8
}

/// Inner ticks to run for one outer step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickPlan {
    pub ticks: u32,
    pub tick_dt: f32,
}

/// Time carried between outer steps by rate-decoupled schedules.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    accumulator: f32,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Schedule {
    pub fn fixed_rate(hz: f32) -> Self {
        Schedule::FixedRate {
            step_seconds: 1.0 / hz.max(f32::EPSILON),
            max_ticks_per_step: default_max_ticks(),
        }
    }

    pub fn plan(&self, clock: &mut Clock, dt: f32) -> TickPlan {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        match *self {
            Schedule::Lockstep => TickPlan { ticks: 1, tick_dt: dt },
            Schedule::FixedRate {
                step_seconds,
                max_ticks_per_step,
            } => {
                if step_seconds <= 0.0 || !step_seconds.is_finite() {
                    log::debug!("fixed-rate schedule with step {step_seconds}s; running lockstep");
                    return TickPlan { ticks: 1, tick_dt: dt };
                }
                clock.accumulator += dt;
                let due = (clock.accumulator / step_seconds).floor() as u32;
                let ticks = due.min(max_ticks_per_step);
                clock.accumulator -= ticks as f32 * step_seconds;
                if due > ticks {
                    log::debug!(
                        "fixed-rate schedule behind by {} tick(s); dropping backlog",
                        due - ticks
                    );
                    clock.accumulator = clock.accumulator.min(step_seconds);
                }
                TickPlan {
                    ticks,
                    tick_dt: step_seconds,
                }
            }
        }
    }
}
