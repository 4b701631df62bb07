use super::entity::{EntityKind, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule set governing predation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Five-tier food chain with energy, starvation and reproduction.
    #[default]
    Eco,
    /// EAGLE → SNAKE → FROG → EAGLE cycle; contact converts instead of killing.
    Rps,
}

impl GameMode {
    /// Kinds the given kind may eat (ECO) or convert (RPS).
    pub fn prey_of(self, kind: EntityKind) -> &'static [EntityKind] {
        match self {
            GameMode::Eco => match kind {
                EntityKind::Grass => &[],
                EntityKind::Bug => &[EntityKind::Grass],
                EntityKind::Frog => &[EntityKind::Bug],
                EntityKind::Snake => &[EntityKind::Frog],
                EntityKind::Eagle => &[EntityKind::Snake],
            },
            GameMode::Rps => match kind {
                EntityKind::Eagle => &[EntityKind::Snake],
                EntityKind::Snake => &[EntityKind::Frog],
                EntityKind::Frog => &[EntityKind::Eagle],
                EntityKind::Grass | EntityKind::Bug => &[],
            },
        }
    }

    /// Kinds that may be placed on the field in this mode.
    pub fn allows(self, kind: EntityKind) -> bool {
        match self {
            GameMode::Eco => true,
            GameMode::Rps => !matches!(kind, EntityKind::Grass | EntityKind::Bug),
        }
    }

    #[inline]
    pub fn preys_on(self, predator: EntityKind, prey: EntityKind) -> bool {
        predator != prey && self.prey_of(predator).contains(&prey)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::Eco => f.write_str("ECO"),
            GameMode::Rps => f.write_str("RPS"),
        }
    }
}

impl FromStr for GameMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eco" => Ok(GameMode::Eco),
            "rps" => Ok(GameMode::Rps),
            other => Err(ParseError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
/// Aggregated statistics for the live population.
pub struct PopulationStats {
    /// Live entity count per kind, indexed by tier.
    pub counts: [usize; EntityKind::COUNT],
    /// Sum of `counts`.
    pub total_entities: usize,
    /// Rounded mean energy over non-grass entities.
    pub average_energy: u32,
    /// Births since the last reset.
    pub total_reproductions: u64,
}

impl PopulationStats {
    pub fn count(&self, kind: EntityKind) -> usize {
        self.counts[kind.index()]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// One point of the rolling time series handed to charting consumers.
pub struct StatsSample {
    #[serde(flatten)]
    pub stats: PopulationStats,
    /// Simulation clock at sampling time.
    pub time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldEffectKind {
    Rain,
    Meteor { x: f64, y: f64, radius: f64 },
    Plague,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A short-lived field-wide visual effect.
pub struct FieldEffect {
    pub kind: FieldEffectKind,
    pub until_ms: f64,
}

impl FieldEffect {
    pub fn is_active(&self, now_ms: f64) -> bool {
        now_ms < self.until_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eco_chain_is_acyclic_ladder() {
        let mode = GameMode::Eco;
        assert!(mode.preys_on(EntityKind::Bug, EntityKind::Grass));
        assert!(mode.preys_on(EntityKind::Eagle, EntityKind::Snake));
        assert!(!mode.preys_on(EntityKind::Grass, EntityKind::Bug));
        assert!(!mode.preys_on(EntityKind::Eagle, EntityKind::Frog));
    }

    #[test]
    fn test_rps_cycle_excludes_grass_and_bug() {
        let mode = GameMode::Rps;
        assert!(mode.preys_on(EntityKind::Eagle, EntityKind::Snake));
        assert!(mode.preys_on(EntityKind::Snake, EntityKind::Frog));
        assert!(mode.preys_on(EntityKind::Frog, EntityKind::Eagle));
        assert!(mode.prey_of(EntityKind::Bug).is_empty());
        assert!(mode.prey_of(EntityKind::Grass).is_empty());
        assert!(!mode.preys_on(EntityKind::Bug, EntityKind::Grass));
        assert!(!mode.allows(EntityKind::Bug));
        assert!(mode.allows(EntityKind::Frog));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("rps".parse::<GameMode>(), Ok(GameMode::Rps));
        assert_eq!("ECO".parse::<GameMode>(), Ok(GameMode::Eco));
        assert!("chess".parse::<GameMode>().is_err());
    }

    #[test]
    fn test_wire_format() {
        let fx = FieldEffect {
            kind: FieldEffectKind::Meteor {
                x: 1.0,
                y: 2.0,
                radius: 3.0,
            },
            until_ms: 10.0,
        };
        let json = serde_json::to_value(fx).unwrap();
        assert_eq!(json["kind"]["type"], "meteor");
        assert_eq!(json["kind"]["radius"], 3.0);
        assert_eq!(serde_json::to_string(&EntityKind::Eagle).unwrap(), "\"EAGLE\"");

        let sample = StatsSample {
            stats: PopulationStats::default(),
            time_ms: 200.0,
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["total_entities"], 0);
        assert_eq!(json["time_ms"], 200.0);
    }
}
