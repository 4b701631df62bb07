//! # YumYum Core
//!
//! The simulation engine behind YumYum Eco, a small predator/prey ecosystem.
//!
//! This crate contains the per-tick logic:
//! - Energy economy (grass regrowth, animal metabolism, starvation)
//! - Movement and steering (seek, flee, separation, wall handling)
//! - Food-chain collisions (ECO predation, RPS conversion)
//! - Reproduction with birth rate limits and population ceilings
//! - Auto-balance and spawn placement heuristics
//! - Spatial hashing, statistics and structured logging
//!
//! ## Architecture
//!
//! Entities are plain structs in a flat `Vec`, addressed by index inside a
//! tick and by id across ticks. Systems read borrowed context views and
//! return batches of decisions that the caller applies afterwards, so every
//! system sees one consistent state. All randomness flows through a seeded
//! `ChaCha8Rng` for reproducible runs.
//!
//! ## Example
//!
//! ```
//! use yumyum_core::config::AppConfig;
//! use yumyum_core::lifecycle::create_entity_with_rng;
//! use yumyum_data::EntityKind;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = AppConfig::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let bug = create_entity_with_rng(1, EntityKind::Bug, 100.0, 100.0, 0.0, &config, &mut rng);
//! assert_eq!(bug.metabolism.energy, 50.0);
//! ```

/// Configuration management for simulation parameters
pub mod config;
/// Session timers, tunables and tick input
pub mod context;
/// Live events, the stats time series and the event log
pub mod history;
/// Entity creation and offspring
pub mod lifecycle;
/// Performance metrics collection and logging
pub mod metrics;
/// Renderer-facing world snapshots
pub mod snapshot;
/// Spatial hashing for proximity queries
pub mod spatial_hash;
/// Per-tick simulation systems
pub mod systems;

pub use context::{SimulationContext, TickContext, Tunables};
pub use history::{DeathCause, HistoryLogger, LiveEvent, SpawnSource, StatsHistory};
pub use metrics::{init_logging, Metrics};
pub use snapshot::{EntitySnapshot, WorldSnapshot};
pub use systems::energy::AnimationRamp;
