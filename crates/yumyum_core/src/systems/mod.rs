//! Per-tick systems, in pipeline order: energy, action (movement and
//! steering), reproduction, interaction (collisions and eating), balance and
//! stats.

pub mod action;
pub mod balance;
pub mod energy;
pub mod interaction;
pub mod reproduction;
pub mod stats;

use std::collections::HashMap;
use yumyum_data::{Entity, EntityId};

/// Maps every live entity id to its position in `entities`.
pub fn build_id_map(entities: &[Entity]) -> HashMap<EntityId, usize> {
    entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_live())
        .map(|(i, e)| (e.id(), i))
        .collect()
}

/// Resolves a weak reference, treating removed entities as gone.
#[inline]
pub fn resolve<'a>(
    entities: &'a [Entity],
    id_map: &HashMap<EntityId, usize>,
    id: EntityId,
) -> Option<(usize, &'a Entity)> {
    let &idx = id_map.get(&id)?;
    let e = entities.get(idx)?;
    (e.id() == id && e.is_live()).then_some((idx, e))
}
