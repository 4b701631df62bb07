//! Plain data types shared by the YumYum Eco simulation crates.
//!
//! Nothing in here knows about tuning constants or per-tick rules; those live
//! in `yumyum_core`. Types are serde-serializable so snapshots can be handed to
//! renderers or dumped as JSON by the runner.

pub mod data;

pub use data::entity::{
    Entity, EntityId, EntityKind, Identity, Intel, Metabolism, ParseError, Physics, Status,
};
pub use data::environment::{FieldEffect, FieldEffectKind, GameMode, PopulationStats, StatsSample};
