//! Configuration management for simulation parameters.
//!
//! Every tuning constant of the ecosystem lives here, grouped into sections
//! that map to tables of an optional `config.toml`. Missing tables and keys
//! fall back to the defaults below, so an empty file is a valid configuration.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! target_fps = 60
//!
//! [world]
//! width = 1200
//! height = 800
//! seed = 42
//!
//! [reproduction]
//! energy_threshold = 0.8
//! cooldown_ms = 5000.0
//!
//! [balance]
//! enabled = true
//! min_counts = [8, 4, 3, 2, 1]
//! ```

use serde::{Deserialize, Serialize};
use yumyum_data::EntityKind;

/// Field dimensions, population ceilings and spatial indexing.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u16,
    pub height: u16,
    /// Seed for the world RNG; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Edge length of a spatial grid cell in pixels.
    pub cell_size: f64,
    pub max_per_type: usize,
    pub max_total: usize,
    /// Upper bound for natural grass spawning.
    pub max_grass: usize,
    /// Inset kept free by spawn placement heuristics.
    pub spawn_margin: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            seed: None,
            cell_size: 120.0,
            max_per_type: 25,
            max_total: 150,
            max_grass: 40,
            spawn_margin: 50.0,
        }
    }
}

/// Static traits of one entity kind.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesProfile {
    pub speed: f64,
    pub size: f64,
    /// Base energy loss per tick before per-instance variance.
    pub decay_rate: f64,
    pub max_energy: f64,
    pub sight_range: f64,
    /// Energy regained per second (grass only).
    pub auto_grow_rate: f64,
}

impl SpeciesProfile {
    fn new(speed: f64, size: f64, decay_rate: f64, max_energy: f64, sight_range: f64) -> Self {
        Self {
            speed,
            size,
            decay_rate,
            max_energy,
            sight_range,
            auto_grow_rate: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SpeciesConfig {
    pub grass: SpeciesProfile,
    pub bug: SpeciesProfile,
    pub frog: SpeciesProfile,
    pub snake: SpeciesProfile,
    pub eagle: SpeciesProfile,
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            grass: SpeciesProfile {
                auto_grow_rate: 0.015,
                ..SpeciesProfile::new(0.0, 30.0, 0.0, 50.0, 150.0)
            },
            bug: SpeciesProfile::new(0.9, 25.0, 0.012, 70.0, 100.0),
            frog: SpeciesProfile::new(1.0, 35.0, 0.018, 90.0, 130.0),
            snake: SpeciesProfile::new(1.1, 45.0, 0.022, 110.0, 160.0),
            eagle: SpeciesProfile::new(1.2, 50.0, 0.028, 130.0, 180.0),
        }
    }
}

impl SpeciesConfig {
    #[inline]
    pub fn profile(&self, kind: EntityKind) -> &SpeciesProfile {
        match kind {
            EntityKind::Grass => &self.grass,
            EntityKind::Bug => &self.bug,
            EntityKind::Frog => &self.frog,
            EntityKind::Snake => &self.snake,
            EntityKind::Eagle => &self.eagle,
        }
    }
}

/// Energy economy constants.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MetabolismConfig {
    /// Starting energy of a new animal (capped at its maximum).
    pub initial_energy: f64,
    /// Flat energy gained from a kill.
    pub energy_gain: f64,
    /// Extra energy per tier of the prey.
    pub prey_tier_bonus: f64,
    /// Relative spread of the per-instance decay rate at creation.
    pub decay_variance: f64,
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            initial_energy: 50.0,
            energy_gain: 30.0,
            prey_tier_bonus: 4.0,
            decay_variance: 0.1,
        }
    }
}

/// Cooldowns and transient windows, in simulated milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EffectsConfig {
    pub eat_effect_ms: f64,
    pub eat_cooldown_ms: f64,
    /// Fraction of `eat_cooldown_ms` enforced between ECO meals.
    pub eco_cooldown_fraction: f64,
    pub invincibility_ms: f64,
    /// Protection granted to both sides of an RPS conversion.
    pub conversion_invincibility_ms: f64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            eat_effect_ms: 200.0,
            eat_cooldown_ms: 1000.0,
            eco_cooldown_fraction: 0.3,
            invincibility_ms: 500.0,
            conversion_invincibility_ms: 200.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReproductionConfig {
    /// Minimum energy ratio for eligibility.
    pub energy_threshold: f64,
    pub cooldown_ms: f64,
    pub max_per_tick: usize,
    pub max_per_second: usize,
    /// Parent energy after a split, as a fraction of its maximum.
    pub parent_energy_fraction: f64,
    /// Upper bound of the random delay added to the next-eligible time.
    pub cooldown_jitter_ms: f64,
    pub reproducing_effect_ms: f64,
    /// Full width of the square window a child is placed in.
    pub spawn_offset: f64,
    pub spawn_margin: f64,
    pub min_distance: f64,
    pub spawn_attempts: usize,
    /// Relative spread applied to the inherited decay rate.
    pub decay_inheritance_variance: f64,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 0.8,
            cooldown_ms: 5000.0,
            max_per_tick: 2,
            max_per_second: 5,
            parent_energy_fraction: 0.35,
            cooldown_jitter_ms: 2000.0,
            reproducing_effect_ms: 500.0,
            spawn_offset: 100.0,
            spawn_margin: 30.0,
            min_distance: 50.0,
            spawn_attempts: 10,
            decay_inheritance_variance: 0.05,
        }
    }
}

/// Auto-balance and natural grass spawning.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BalanceConfig {
    pub enabled: bool,
    /// Minimum population per kind, indexed by tier; 0 disables top-up.
    pub min_counts: [usize; EntityKind::COUNT],
    pub check_interval_ms: f64,
    /// Grass is never topped up once this many tufts are alive.
    pub grass_soft_cap: usize,
    pub grass_batch: usize,
    pub animal_batch: usize,
    pub max_spawns_per_check: usize,
    pub grass_spacing: f64,
    pub animal_spacing: f64,
    /// Quiet period after an area clear.
    pub meteor_cooldown_ms: f64,
    pub distributed_attempts: usize,
    pub fallback_attempts: usize,
    /// Base interval of natural grass spawning, in frames.
    pub grass_spawn_interval_frames: f64,
    pub grass_spawn_chance: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_counts: [8, 4, 3, 2, 1],
            check_interval_ms: 2000.0,
            grass_soft_cap: 30,
            grass_batch: 2,
            animal_batch: 1,
            max_spawns_per_check: 5,
            grass_spacing: 100.0,
            animal_spacing: 120.0,
            meteor_cooldown_ms: 2000.0,
            distributed_attempts: 20,
            fallback_attempts: 10,
            grass_spawn_interval_frames: 5000.0,
            grass_spawn_chance: 0.15,
        }
    }
}

/// Player-triggered events and inspection.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EventsConfig {
    pub meteor_radius: f64,
    pub meteor_effect_ms: f64,
    pub rain_effect_ms: f64,
    pub rain_grass_count: usize,
    pub rain_frog_count: usize,
    pub rain_min_spacing: f64,
    pub rain_attempts: usize,
    pub plague_fraction: f64,
    pub plague_effect_ms: f64,
    pub placement_min_distance: f64,
    pub placement_attempts: usize,
    pub inspect_radius: f64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            meteor_radius: 100.0,
            meteor_effect_ms: 1000.0,
            rain_effect_ms: 2000.0,
            rain_grass_count: 50,
            rain_frog_count: 20,
            rain_min_spacing: 40.0,
            rain_attempts: 10,
            plague_fraction: 0.3,
            plague_effect_ms: 2500.0,
            placement_min_distance: 50.0,
            placement_attempts: 5,
            inspect_radius: 40.0,
        }
    }
}

/// Weights of the steering drives and collision geometry.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SteeringConfig {
    pub seek_weight: f64,
    pub flee_weight: f64,
    pub separation_weight: f64,
    /// Separation distance as a multiple of the entity size.
    pub separation_factor: f64,
    /// Score penalty per other hunter already chasing a candidate.
    pub competition_penalty: f64,
    pub wander_chance: f64,
    /// Half-width of the random heading perturbation, in radians.
    pub wander_angle: f64,
    /// A target this close to a wall just hit is abandoned.
    pub wall_target_margin: f64,
    /// Contact distance as a multiple of the combined radius.
    pub contact_factor: f64,
    pub push_speed: f64,
    /// Eating events closer than this in squared distance are ties.
    pub tie_window: f64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            seek_weight: 1.0,
            flee_weight: 5.0,
            separation_weight: 2.0,
            separation_factor: 1.5,
            competition_penalty: 30.0,
            wander_chance: 0.015,
            wander_angle: 0.25,
            wall_target_margin: 50.0,
            contact_factor: 1.1,
            push_speed: 0.3,
            tie_window: 50.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RpsConfig {
    /// Speed shared by every kind in RPS mode.
    pub unified_speed: f64,
}

impl Default for RpsConfig {
    fn default() -> Self {
        Self { unified_speed: 1.0 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub species: SpeciesConfig,
    pub metabolism: MetabolismConfig,
    pub effects: EffectsConfig,
    pub reproduction: ReproductionConfig,
    pub balance: BalanceConfig,
    pub events: EventsConfig,
    pub steering: SteeringConfig,
    pub rps: RpsConfig,
    pub target_fps: u64,
    /// Ticks between refreshes of the throttled UI snapshot.
    pub ui_update_interval: u64,
    pub stats_sample_interval_ms: f64,
    pub stats_history_len: usize,
    /// Per-tick change of the animation ramp.
    pub ramp_step: f64,
    /// Collisions are resolved only above this ramp value.
    pub collision_ramp_threshold: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            species: SpeciesConfig::default(),
            metabolism: MetabolismConfig::default(),
            effects: EffectsConfig::default(),
            reproduction: ReproductionConfig::default(),
            balance: BalanceConfig::default(),
            events: EventsConfig::default(),
            steering: SteeringConfig::default(),
            rps: RpsConfig::default(),
            target_fps: 60,
            ui_update_interval: 10,
            stats_sample_interval_ms: 200.0,
            stats_history_len: 100,
            ramp_step: 0.05,
            collision_ramp_threshold: 0.7,
        }
    }
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        // World validation
        anyhow::ensure!(self.world.width > 0, "World width must be positive");
        anyhow::ensure!(self.world.height > 0, "World height must be positive");
        anyhow::ensure!(
            self.world.width <= 10000 && self.world.height <= 10000,
            "World too large (max 10000x10000)"
        );
        anyhow::ensure!(
            self.world.cell_size.is_finite() && self.world.cell_size > 0.0,
            "Cell size must be positive"
        );
        anyhow::ensure!(
            self.world.max_per_type <= self.world.max_total,
            "Per-type ceiling cannot exceed the global ceiling"
        );
        anyhow::ensure!(
            self.world.spawn_margin >= 0.0
                && self.world.spawn_margin * 2.0 < f64::from(self.world.width.min(self.world.height)),
            "Spawn margin must fit inside the field"
        );

        // Species validation
        for kind in EntityKind::ALL {
            let p = self.species.profile(kind);
            anyhow::ensure!(p.speed >= 0.0, "{} speed must be non-negative", kind);
            anyhow::ensure!(p.size > 0.0, "{} size must be positive", kind);
            anyhow::ensure!(p.decay_rate >= 0.0, "{} decay must be non-negative", kind);
            anyhow::ensure!(p.max_energy > 0.0, "{} max energy must be positive", kind);
            anyhow::ensure!(p.sight_range > 0.0, "{} sight range must be positive", kind);
            anyhow::ensure!(
                p.auto_grow_rate >= 0.0,
                "{} auto grow rate must be non-negative",
                kind
            );
        }

        // Metabolism validation
        anyhow::ensure!(
            self.metabolism.initial_energy > 0.0,
            "Initial energy must be positive"
        );
        anyhow::ensure!(
            self.metabolism.energy_gain >= 0.0 && self.metabolism.prey_tier_bonus >= 0.0,
            "Energy gain must be non-negative"
        );
        anyhow::ensure!(
            (0.0..1.0).contains(&self.metabolism.decay_variance),
            "Decay variance must be in [0.0, 1.0)"
        );

        // Effects validation
        anyhow::ensure!(
            self.effects.eat_cooldown_ms >= 0.0
                && self.effects.eat_effect_ms >= 0.0
                && self.effects.invincibility_ms >= 0.0
                && self.effects.conversion_invincibility_ms >= 0.0,
            "Effect durations must be non-negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.effects.eco_cooldown_fraction),
            "ECO cooldown fraction must be in [0.0, 1.0]"
        );

        // Reproduction validation
        anyhow::ensure!(
            self.reproduction.energy_threshold > 0.0 && self.reproduction.energy_threshold <= 1.0,
            "Reproduction threshold must be in (0.0, 1.0]"
        );
        anyhow::ensure!(
            self.reproduction.parent_energy_fraction > 0.0
                && self.reproduction.parent_energy_fraction < self.reproduction.energy_threshold,
            "Parent energy fraction must be positive and below the threshold"
        );
        anyhow::ensure!(
            self.reproduction.cooldown_ms >= 0.0 && self.reproduction.cooldown_jitter_ms >= 0.0,
            "Reproduction cooldowns must be non-negative"
        );
        anyhow::ensure!(
            self.reproduction.max_per_tick <= self.reproduction.max_per_second,
            "Per-tick birth limit cannot exceed the per-second limit"
        );
        anyhow::ensure!(
            (0.0..1.0).contains(&self.reproduction.decay_inheritance_variance),
            "Decay inheritance variance must be in [0.0, 1.0)"
        );
        anyhow::ensure!(
            self.reproduction.spawn_margin >= 0.0
                && self.reproduction.spawn_margin * 2.0
                    < f64::from(self.world.width.min(self.world.height)),
            "Offspring spawn margin must fit inside the field"
        );

        // Balance validation
        anyhow::ensure!(
            self.balance.check_interval_ms > 0.0,
            "Balance check interval must be positive"
        );
        anyhow::ensure!(
            self.balance.min_counts.iter().all(|&c| c <= self.world.max_per_type),
            "Minimum counts cannot exceed the per-type ceiling"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.balance.grass_spawn_chance),
            "Grass spawn chance must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.balance.grass_spawn_interval_frames > 0.0,
            "Grass spawn interval must be positive"
        );

        // Events validation
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.events.plague_fraction),
            "Plague fraction must be in [0.0, 1.0]"
        );
        anyhow::ensure!(self.events.meteor_radius >= 0.0, "Meteor radius must be non-negative");

        anyhow::ensure!(self.rps.unified_speed >= 0.0, "RPS speed must be non-negative");

        anyhow::ensure!(self.target_fps > 0, "Target FPS must be positive");
        anyhow::ensure!(self.target_fps <= 240, "Target FPS too high (max 240)");
        anyhow::ensure!(self.ui_update_interval > 0, "UI update interval must be positive");
        anyhow::ensure!(
            self.stats_sample_interval_ms > 0.0,
            "Stats sample interval must be positive"
        );
        anyhow::ensure!(self.stats_history_len > 0, "Stats history must hold samples");
        anyhow::ensure!(
            self.ramp_step > 0.0 && self.ramp_step <= 1.0,
            "Ramp step must be in (0.0, 1.0]"
        );
        anyhow::ensure!(
            (0.0..1.0).contains(&self.collision_ramp_threshold),
            "Collision ramp threshold must be in [0.0, 1.0)"
        );

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Frame duration implied by `target_fps`.
    #[must_use]
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.target_fps as f64
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.species).as_bytes());
        hasher.update(format!("{:?}", self.metabolism).as_bytes());
        hasher.update(format!("{:?}", self.effects).as_bytes());
        hasher.update(format!("{:?}", self.reproduction).as_bytes());
        hasher.update(format!("{:?}", self.balance).as_bytes());
        hasher.update(format!("{:?}", self.steering).as_bytes());
        hasher.update(format!("{:?}", self.rps).as_bytes());
        hex::encode(hasher.finalize())
    }
}
