use crate::config::AppConfig;
use crate::context::Tunables;
use crate::systems::reproduction;
use yumyum_data::{Entity, EntityId, GameMode};

/// Smoothing scalar for pause and resume.
///
/// Moves toward its target by a fixed step each tick. Every time-dependent
/// system scales by `value`, so at 0 the world is frozen without losing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationRamp {
    pub value: f64,
    pub target: f64,
    pub step: f64,
}

impl AnimationRamp {
    pub fn new(step: f64) -> Self {
        Self {
            value: 0.0,
            target: 0.0,
            step,
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.target = if running { 1.0 } else { 0.0 };
    }

    pub fn is_running(&self) -> bool {
        self.target > 0.0
    }

    /// Running, or still easing out after a stop.
    pub fn is_active(&self) -> bool {
        self.is_running() || self.value > 0.0
    }

    /// Steps toward the target and returns the new value.
    pub fn advance(&mut self) -> f64 {
        if self.value < self.target {
            self.value = (self.value + self.step).min(self.target);
        } else if self.value > self.target {
            self.value = (self.value - self.step).max(self.target);
        }
        self.value
    }

    /// Jumps straight to the target.
    pub fn settle(&mut self) {
        self.value = self.target;
    }
}

/// Inputs of the energy pass.
pub struct EnergyContext<'a> {
    pub config: &'a AppConfig,
    pub tunables: &'a Tunables,
    pub mode: GameMode,
    pub ramp: f64,
    pub now_ms: f64,
}

/// Integrates grass regrowth since the entity's last update.
pub fn grow_grass(entity: &mut Entity, auto_grow_rate: f64, growth_rate: f64, now_ms: f64) {
    let dt_s = ((now_ms - entity.metabolism.last_update_ms) / 1000.0).max(0.0);
    entity.gain_energy(auto_grow_rate * growth_rate * dt_s);
    entity.metabolism.last_update_ms = now_ms;
}

/// Applies one tick of decay. Returns true when the entity starved.
pub fn apply_decay(entity: &mut Entity, speed_multiplier: f64, ramp: f64, metabolism: f64) -> bool {
    let loss = entity.metabolism.decay_rate * speed_multiplier * ramp * metabolism;
    entity.metabolism.energy = (entity.metabolism.energy - loss).max(0.0);
    entity.metabolism.energy <= 0.0
}

/// Regrows grass and drains animals; starved animals are marked `removing`.
///
/// Returns the ids of entities that starved this tick.
pub fn update_energy(entities: &mut [Entity], ctx: &EnergyContext) -> Vec<EntityId> {
    let mut starved = Vec::new();
    for entity in entities.iter_mut().filter(|e| e.is_live()) {
        if entity.kind().is_grass() {
            if ctx.mode == GameMode::Eco {
                let rate = ctx.config.species.grass.auto_grow_rate;
                grow_grass(entity, rate, ctx.tunables.growth_rate, ctx.now_ms);
            }
            continue;
        }
        if ctx.mode == GameMode::Rps {
            continue;
        }
        if apply_decay(
            entity,
            ctx.tunables.speed_multiplier,
            ctx.ramp,
            ctx.tunables.metabolism,
        ) {
            entity.status.removing = true;
            entity.intel.target = None;
            starved.push(entity.id());
        }
    }
    starved
}

/// Raises `wants_to_reproduce` on every live entity that may breed now.
pub fn flag_reproduction_candidates(entities: &mut [Entity], ctx: &EnergyContext) {
    for entity in entities.iter_mut() {
        entity.intel.wants_to_reproduce =
            entity.is_live() && reproduction::is_eligible(entity, ctx.now_ms, ctx.mode, ctx.config);
    }
}
