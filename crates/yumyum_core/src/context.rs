//! Per-session mutable state that is not part of any entity.

use crate::config::AppConfig;
use crate::systems::reproduction::ReproductionLimiter;
use serde::{Deserialize, Serialize};
use yumyum_data::EntityKind;

/// Input of one simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Simulated milliseconds elapsed since the previous tick.
    pub dt_ms: f64,
}

impl TickContext {
    pub fn new(dt_ms: f64) -> Self {
        Self { dt_ms }
    }

    /// One frame at the given frame rate.
    pub fn frame(target_fps: u64) -> Self {
        Self {
            dt_ms: 1000.0 / target_fps.max(1) as f64,
        }
    }
}

/// Knobs a control surface may change while the simulation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tunables {
    pub time_scale: f64,
    pub metabolism: f64,
    pub growth_rate: f64,
    pub speed_multiplier: f64,
    pub auto_balance: bool,
    pub min_counts: [usize; EntityKind::COUNT],
}

impl Tunables {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            time_scale: 1.0,
            metabolism: 1.0,
            growth_rate: 1.0,
            speed_multiplier: 1.0,
            auto_balance: config.balance.enabled,
            min_counts: config.balance.min_counts,
        }
    }
}

/// Timers and counters of the running session.
///
/// Everything here is reset together with the entity list.
#[derive(Debug, Clone, Default)]
pub struct SimulationContext {
    pub last_balance_check_ms: f64,
    pub last_meteor_ms: Option<f64>,
    pub last_grass_spawn_ms: f64,
    pub last_sample_ms: Option<f64>,
    pub limiter: ReproductionLimiter,
    /// Ticks since the throttled UI snapshot was last refreshed.
    pub frame_count: u64,
    pub total_reproductions: u64,
}

impl SimulationContext {
    pub fn new(now_ms: f64) -> Self {
        Self {
            last_balance_check_ms: now_ms,
            last_meteor_ms: None,
            last_grass_spawn_ms: now_ms,
            last_sample_ms: None,
            limiter: ReproductionLimiter::new(now_ms),
            frame_count: 0,
            total_reproductions: 0,
        }
    }

    /// Returns true when a stats sample is due and records it as taken.
    pub fn take_sample_slot(&mut self, now_ms: f64, interval_ms: f64) -> bool {
        match self.last_sample_ms {
            Some(t) if now_ms - t < interval_ms => false,
            _ => {
                self.last_sample_ms = Some(now_ms);
                true
            }
        }
    }
}
