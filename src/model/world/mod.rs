use crate::model::config::AppConfig;
use crate::model::history::{HistoryLogger, StatsHistory};
use crate::model::snapshot::WorldSnapshot;
use crate::model::spatial_hash::SpatialHash;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use yumyum_core::{AnimationRamp, Metrics, SimulationContext, Tunables};
use yumyum_data::{Entity, EntityId, FieldEffect, GameMode, PopulationStats};

pub mod commands;
pub mod finalize;
pub mod init;
pub mod update;

/// The frame orchestrator: owns every entity and runs the per-tick pipeline.
pub struct World {
    pub width: u16,
    pub height: u16,
    pub tick: u64,
    /// Simulation clock in milliseconds, advanced by each tick's `dt_ms`.
    pub time_ms: f64,
    pub mode: GameMode,
    pub entities: Vec<Entity>,
    /// Children born last tick, inserted at the start of the next one.
    pub pending_births: Vec<Entity>,
    pub config: AppConfig,
    pub tunables: Tunables,
    pub ramp: AnimationRamp,
    pub ctx: SimulationContext,
    pub pop_stats: PopulationStats,
    pub history: StatsHistory,
    pub effect: Option<FieldEffect>,
    pub logger: HistoryLogger,
    pub metrics: Metrics,
    pub rng: ChaCha8Rng,
    pub spatial_hash: SpatialHash,
    id_map: HashMap<EntityId, usize>,
    next_id: EntityId,
    cached_snapshot: Arc<WorldSnapshot>,
    cached_ui_snapshot: Arc<WorldSnapshot>,
}

impl World {
    /// Running, or still easing to a stop.
    pub fn is_active(&self) -> bool {
        self.ramp.is_active()
    }

    pub fn is_running(&self) -> bool {
        self.ramp.is_running()
    }

    /// Latest snapshot, refreshed every tick.
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.cached_snapshot)
    }

    /// Throttled snapshot for slow consumers, refreshed every
    /// `ui_update_interval` ticks.
    pub fn ui_snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.cached_ui_snapshot)
    }

    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    pub fn stats(&self) -> &PopulationStats {
        &self.pop_stats
    }

    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.id_map
            .get(&id)
            .and_then(|&idx| self.entities.get(idx))
            .filter(|e| e.id() == id && e.is_live())
    }

    /// Live entities only.
    pub fn live_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_live())
    }

    /// SHA-256 over the serialized entity list, for comparing runs.
    pub fn state_hash(&self) -> anyhow::Result<String> {
        use sha2::{Digest, Sha256};
        let json = serde_json::to_string(&self.entities)?;
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        hasher.update(self.time_ms.to_le_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yumyum_core::TickContext;
    use yumyum_data::EntityKind;

    fn seeded() -> World {
        let mut config = AppConfig::default();
        config.world.seed = Some(7);
        World::new(config).expect("Failed to create world")
    }

    #[test]
    fn test_new_world_is_stopped_and_empty() {
        let world = seeded();
        assert!(!world.is_active());
        assert!(world.entities.is_empty());
        assert_eq!(world.snapshot().tick, 0);
    }

    #[test]
    fn test_paused_world_only_moves_the_clock() {
        let mut world = seeded();
        let id = world.spawn_at(EntityKind::Bug, 100.0, 100.0).expect("room");
        let before = world.get_entity(id).cloned().expect("bug");
        world.update(&TickContext::new(16.0));
        let after = world.get_entity(id).expect("bug");
        assert_eq!(world.time_ms, 16.0);
        assert_eq!(before.pos(), after.pos());
        assert_eq!(before.metabolism.energy, after.metabolism.energy);
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut world = seeded();
        let h1 = world.state_hash().expect("hash");
        world.spawn_at(EntityKind::Frog, 300.0, 300.0);
        assert_ne!(h1, world.state_hash().expect("hash"));
    }
}
