mod common;

use common::{run, WorldBuilder, FRAME};
use yumyum_lib::model::history::{DeathCause, LiveEvent};
use yumyum_lib::model::state::{EntityKind, GameMode};
use yumyum_lib::model::TickContext;

/// Long enough for the spawn invincibility and the ECO meal cooldown to lapse.
const SETTLE: TickContext = TickContext { dt_ms: 600.0 };

#[test]
fn test_bug_targets_nearby_grass() {
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 300.0, 300.0)
        .with_entity(EntityKind::Grass, 380.0, 300.0)
        .running()
        .build();
    world.update(&SETTLE);
    assert_eq!(world.get_entity(1).and_then(|b| b.intel.target), Some(2));
}

#[test]
fn test_bug_eats_grass_on_contact() {
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 300.0, 300.0)
        .with_entity(EntityKind::Grass, 310.0, 300.0)
        .with(|w| {
            w.set_metabolism(0.0);
            w.entities[0].metabolism.energy = 20.0;
        })
        .running()
        .build();

    let events = world.update(&SETTLE);

    assert_entity_dead!(world, 2);
    let bug = world.get_entity(1).expect("bug survives");
    assert_eq!(bug.metabolism.energy, 20.0 + world.config.metabolism.energy_gain);
    assert_eq!(bug.intel.target, None);
    assert!(bug.status.eating);
    assert!(events.iter().any(|e| matches!(
        e,
        LiveEvent::Death { id: 2, cause: DeathCause::Eaten, .. }
    )));
    assert_eq!(world.stats().count(EntityKind::Grass), 0);
}

#[test]
fn test_grass_is_safe_while_invincible() {
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 300.0, 300.0)
        .with_entity(EntityKind::Grass, 310.0, 300.0)
        .running()
        .build();
    // 100 ms in: still inside the 500 ms spawn window.
    world.update(&TickContext::new(100.0));
    assert_population!(world, EntityKind::Grass, 1);
    assert_eq!(world.get_entity(1).and_then(|b| b.intel.target), None);
}

#[test]
fn test_grass_placed_past_the_edge_stays_edible() {
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 1150.0, 400.0)
        .with_entity(EntityKind::Grass, 1205.0, 400.0)
        .with(|w| w.set_metabolism(0.0))
        .running()
        .build();
    let grass_x = world.get_entity(2).map(|g| g.physics.x).expect("grass");
    assert!(grass_x <= f64::from(world.width) - world.config.species.grass.size / 2.0);

    world.update(&SETTLE);
    for _ in 0..300 {
        if world.get_entity(2).is_none() {
            break;
        }
        run(&mut world, 1);
    }
    assert_entity_dead!(world, 2);
}

#[test]
fn test_bug_eventually_catches_distant_grass() {
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 300.0, 300.0)
        .with_entity(EntityKind::Grass, 380.0, 300.0)
        .with(|w| w.set_metabolism(0.0))
        .running()
        .build();
    let mut caught = false;
    for _ in 0..240 {
        if run(&mut world, 1).contains(&2) {
            caught = true;
            break;
        }
    }
    assert!(caught, "bug never reached the grass");
    assert_energy_above!(world, 1, 50.0);
}

#[test]
fn test_prey_is_consumed_once_per_tick() {
    // Two frogs touching the same bug: exactly one of them eats it.
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 400.0, 400.0)
        .with_entity(EntityKind::Frog, 415.0, 400.0)
        .with_entity(EntityKind::Frog, 385.0, 400.0)
        .with(|w| {
            w.set_metabolism(0.0);
            for e in w.entities.iter_mut().skip(1) {
                e.metabolism.energy = 20.0;
            }
        })
        .running()
        .build();

    let events = world.update(&SETTLE);
    let kills = events
        .iter()
        .filter(|e| matches!(e, LiveEvent::Predation { .. }))
        .count();
    assert_eq!(kills, 1);
    assert_entity_dead!(world, 1);
    let fed = world
        .live_entities()
        .filter(|e| e.metabolism.energy > 20.0)
        .count();
    assert_eq!(fed, 1);
}

#[test]
fn test_rps_contact_converts_without_deaths() {
    let mut world = WorldBuilder::new()
        .with_mode(GameMode::Rps)
        .with_entity(EntityKind::Eagle, 500.0, 400.0)
        .with_entity(EntityKind::Snake, 515.0, 400.0)
        .running()
        .build();

    let events = world.update(&SETTLE);

    assert_eq!(world.entities.len(), 2);
    assert!(world.live_entities().all(|e| e.kind() == EntityKind::Eagle));
    assert!(world.live_entities().all(|e| e.status.invincible));
    assert!(events.iter().any(|e| matches!(
        e,
        LiveEvent::Conversion { id: 2, from: EntityKind::Snake, to: EntityKind::Eagle, .. }
    )));
    assert!(!events.iter().any(|e| matches!(e, LiveEvent::Death { .. })));
}

#[test]
fn test_rps_has_no_energy_decay() {
    let mut world = WorldBuilder::new()
        .with_mode(GameMode::Rps)
        .with_entity(EntityKind::Frog, 200.0, 200.0)
        .running()
        .build();
    run(&mut world, 120);
    assert_eq!(world.get_entity(1).expect("frog").metabolism.energy, 50.0);
}

#[test]
fn test_starved_animal_is_skipped_by_collisions() {
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 300.0, 300.0)
        .with_entity(EntityKind::Frog, 310.0, 300.0)
        .with(|w| {
            w.entities[0].metabolism.energy = 1e-6;
            w.entities[1].metabolism.energy = 20.0;
        })
        .running()
        .build();

    let events = world.update(&SETTLE);

    assert!(events.iter().any(|e| matches!(
        e,
        LiveEvent::Death { id: 1, cause: DeathCause::Starvation, .. }
    )));
    assert!(!events.iter().any(|e| matches!(e, LiveEvent::Predation { .. })));
    assert_entity_dead!(world, 1);
    assert!(world.get_entity(2).expect("frog").metabolism.energy < 20.0);

    // Gone for good: the next tick neither moves nor targets it.
    world.update(&FRAME);
    assert_eq!(world.get_entity(2).and_then(|f| f.intel.target), None);
}
