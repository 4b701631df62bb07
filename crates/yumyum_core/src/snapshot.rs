use serde::{Deserialize, Serialize};
use yumyum_data::{Entity, EntityId, EntityKind, FieldEffect, GameMode, PopulationStats};

/// Colour band of the energy bar.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnergyBand {
    High,
    Medium,
    Low,
}

impl EnergyBand {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 70.0 {
            EnergyBand::High
        } else if percent > 30.0 {
            EnergyBand::Medium
        } else {
            EnergyBand::Low
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub emoji: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub energy: f64,
    pub max_energy: f64,
    pub energy_percent: f64,
    pub energy_band: EnergyBand,
    /// Animals in ECO mode carry a visible energy bar.
    pub show_energy_bar: bool,
    /// Render scale: eating pops larger than reproducing.
    pub scale: f64,
    pub invincible: bool,
    pub eating: bool,
    pub reproducing: bool,
    pub target: Option<EntityId>,
    pub parent_id: Option<EntityId>,
    pub reproduction_count: u32,
}

impl EntitySnapshot {
    pub fn from_entity(e: &Entity, mode: GameMode) -> Self {
        let energy_percent = e.energy_ratio() * 100.0;
        let scale = if e.status.eating {
            1.3
        } else if e.status.reproducing {
            1.2
        } else {
            1.0
        };
        Self {
            id: e.id(),
            kind: e.kind(),
            emoji: e.kind().emoji().to_string(),
            x: e.physics.x,
            y: e.physics.y,
            size: e.physics.size,
            energy: e.metabolism.energy,
            max_energy: e.metabolism.max_energy,
            energy_percent,
            energy_band: EnergyBand::from_percent(energy_percent),
            show_energy_bar: mode == GameMode::Eco && !e.kind().is_grass(),
            scale,
            invincible: e.status.invincible,
            eating: e.status.eating,
            reproducing: e.status.reproducing,
            target: e.intel.target,
            parent_id: e.identity.parent_id,
            reproduction_count: e.metabolism.reproduction_count,
        }
    }
}

/// Read-only view of the world handed to renderers.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub time_ms: f64,
    pub mode: GameMode,
    pub running: bool,
    pub ramp: f64,
    pub width: u16,
    pub height: u16,
    pub entities: Vec<EntitySnapshot>,
    pub stats: PopulationStats,
    pub effect: Option<FieldEffect>,
}

impl WorldSnapshot {
    pub fn empty(width: u16, height: u16, mode: GameMode) -> Self {
        Self {
            tick: 0,
            time_ms: 0.0,
            mode,
            running: false,
            ramp: 0.0,
            width,
            height,
            entities: Vec::new(),
            stats: PopulationStats::default(),
            effect: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::lifecycle::create_entity_with_rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_energy_bar_only_for_eco_animals() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let bug = create_entity_with_rng(1, EntityKind::Bug, 5.0, 6.0, 0.0, &config, &mut rng);
        let grass = create_entity_with_rng(2, EntityKind::Grass, 5.0, 6.0, 0.0, &config, &mut rng);

        let snap = EntitySnapshot::from_entity(&bug, GameMode::Eco);
        assert!(snap.show_energy_bar);
        assert_eq!(snap.energy_band, EnergyBand::Medium);
        assert!(snap.invincible);
        assert!(!EntitySnapshot::from_entity(&bug, GameMode::Rps).show_energy_bar);
        assert!(!EntitySnapshot::from_entity(&grass, GameMode::Eco).show_energy_bar);
    }

    #[test]
    fn test_energy_bands() {
        assert_eq!(EnergyBand::from_percent(71.0), EnergyBand::High);
        assert_eq!(EnergyBand::from_percent(70.0), EnergyBand::Medium);
        assert_eq!(EnergyBand::from_percent(30.0), EnergyBand::Low);
    }
}
