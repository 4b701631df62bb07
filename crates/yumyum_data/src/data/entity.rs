use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of an entity, unique for the lifetime of a world.
pub type EntityId = u64;

/// Errors produced when parsing kinds or modes from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
    #[error("unknown game mode: {0}")]
    UnknownMode(String),
}

/// Trophic classification of an entity.
///
/// The discriminant doubles as the tier index used for stats arrays and for
/// the predation energy bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Grass = 0,
    Bug = 1,
    Frog = 2,
    Snake = 3,
    Eagle = 4,
}

impl EntityKind {
    pub const COUNT: usize = 5;
    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::Grass,
        EntityKind::Bug,
        EntityKind::Frog,
        EntityKind::Snake,
        EntityKind::Eagle,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn is_grass(self) -> bool {
        self == EntityKind::Grass
    }

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Grass => "grass",
            EntityKind::Bug => "bug",
            EntityKind::Frog => "frog",
            EntityKind::Snake => "snake",
            EntityKind::Eagle => "eagle",
        }
    }

    pub fn emoji(self) -> char {
        match self {
            EntityKind::Grass => '🌱',
            EntityKind::Bug => '🐛',
            EntityKind::Frog => '🐸',
            EntityKind::Snake => '🐍',
            EntityKind::Eagle => '🦅',
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grass" | "0" => Ok(EntityKind::Grass),
            "bug" | "1" => Ok(EntityKind::Bug),
            "frog" | "2" => Ok(EntityKind::Frog),
            "snake" | "3" => Ok(EntityKind::Snake),
            "eagle" | "4" => Ok(EntityKind::Eagle),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

/// Identity and classification of an entity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: EntityId,
    /// Only rewritten by RPS conversion.
    pub kind: EntityKind,
    pub parent_id: Option<EntityId>,
}

/// Kinematics of an entity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Physics {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Visual size, also used as the collision diameter.
    pub size: f64,
    pub sight_range: f64,
}

/// Energy state and feeding/breeding history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Metabolism {
    pub energy: f64,
    pub max_energy: f64,
    /// Per-instance decay per tick, varied from the kind's base rate.
    pub decay_rate: f64,
    /// Last time grass growth was integrated.
    pub last_update_ms: f64,
    /// `None` until the first meal or conversion.
    pub last_eat_ms: Option<f64>,
    /// Next-eligible anchor for reproduction; may lie in the future.
    pub last_reproduction_ms: f64,
    pub reproduction_count: u32,
}

/// Pursuit state. `target` is a weak reference resolved by id every tick.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Intel {
    pub target: Option<EntityId>,
    #[serde(skip)]
    pub wants_to_reproduce: bool,
}

/// Timestamps and flags for transient states.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Status {
    pub created_ms: f64,
    pub eating_until_ms: f64,
    pub reproducing_until_ms: f64,
    pub invincible_until_ms: f64,
    /// Soft-deleted: invisible to every query, dropped at the end of the tick.
    pub removing: bool,
    pub invincible: bool,
    pub eating: bool,
    pub reproducing: bool,
}

impl Status {
    /// Recomputes the derived flags from their valid-until timestamps.
    pub fn refresh(&mut self, now_ms: f64) {
        self.eating = now_ms < self.eating_until_ms;
        self.reproducing = now_ms < self.reproducing_until_ms;
        self.invincible = now_ms < self.invincible_until_ms;
    }
}

/// A complete simulated organism (or grass tuft).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    #[serde(flatten)]
    pub identity: Identity,
    pub physics: Physics,
    pub metabolism: Metabolism,
    pub intel: Intel,
    pub status: Status,
}

impl Entity {
    #[inline]
    pub fn id(&self) -> EntityId {
        self.identity.id
    }

    #[inline]
    pub fn kind(&self) -> EntityKind {
        self.identity.kind
    }

    #[inline]
    pub fn pos(&self) -> (f64, f64) {
        (self.physics.x, self.physics.y)
    }

    /// Alive and visible to this tick's queries.
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.status.removing
    }

    pub fn energy_ratio(&self) -> f64 {
        if self.metabolism.max_energy > 0.0 {
            self.metabolism.energy / self.metabolism.max_energy
        } else {
            0.0
        }
    }

    pub fn distance_sq_to(&self, x: f64, y: f64) -> f64 {
        let dx = self.physics.x - x;
        let dy = self.physics.y - y;
        dx * dx + dy * dy
    }

    pub fn distance_sq(&self, other: &Entity) -> f64 {
        self.distance_sq_to(other.physics.x, other.physics.y)
    }

    /// Adds energy, keeping it inside `[0, max_energy]`.
    pub fn gain_energy(&mut self, amount: f64) {
        self.metabolism.energy =
            (self.metabolism.energy + amount).clamp(0.0, self.metabolism.max_energy);
    }
}
