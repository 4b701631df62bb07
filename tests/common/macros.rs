/// Asserts that an entity with the given ID has at least the specified amount of energy.
#[macro_export]
macro_rules! assert_energy_above {
    ($world:expr, $id:expr, $min_energy:expr) => {
        let entity = $world.get_entity($id).expect("Entity not found in world");
        assert!(
            entity.metabolism.energy > $min_energy,
            "Entity {} energy {} is not above {}",
            $id,
            entity.metabolism.energy,
            $min_energy
        );
    };
}

/// Asserts that an entity with the given ID is NOT present in the world.
#[macro_export]
macro_rules! assert_entity_dead {
    ($world:expr, $id:expr) => {
        let exists = $world.entities.iter().any(|e| e.id() == $id);
        assert!(!exists, "Entity {} should be dead but was found alive", $id);
    };
}

/// Asserts the live count of one kind.
#[macro_export]
macro_rules! assert_population {
    ($world:expr, $kind:expr, $count:expr) => {
        assert_eq!(
            $world.live_entities().filter(|e| e.kind() == $kind).count(),
            $count,
            "Population count mismatch for {}",
            $kind
        );
    };
}

/// Asserts both population ceilings against the live list.
#[macro_export]
macro_rules! assert_within_ceilings {
    ($world:expr) => {
        let max_per_type = $world.config.world.max_per_type;
        let total = $world.live_entities().count();
        assert!(
            total <= $world.config.world.max_total,
            "Total {} exceeds ceiling",
            total
        );
        for kind in yumyum_lib::model::state::EntityKind::ALL {
            let n = $world.live_entities().filter(|e| e.kind() == kind).count();
            assert!(n <= max_per_type, "{} count {} exceeds ceiling", kind, n);
        }
    };
}
