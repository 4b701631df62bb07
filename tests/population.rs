mod common;

use common::{run, WorldBuilder, FRAME};
use yumyum_lib::model::history::{LiveEvent, SpawnSource};
use yumyum_lib::model::state::{EntityKind, GameMode};
use yumyum_lib::model::TickContext;

#[test]
fn test_balance_tops_grass_up_to_minimum() {
    let mut world = WorldBuilder::new()
        .with_config(|c| {
            c.balance.enabled = true;
            c.balance.min_counts = [8, 0, 0, 0, 0];
        })
        .running()
        .build();

    let mut balance_spawns = 0;
    for _ in 0..900 {
        for event in world.update(&FRAME) {
            if matches!(event, LiveEvent::Spawn { source: SpawnSource::Balance, .. }) {
                balance_spawns += 1;
            }
        }
        assert_within_ceilings!(world);
    }
    assert_population!(world, EntityKind::Grass, 8);
    assert_eq!(balance_spawns, 8);
}

#[test]
fn test_balance_respects_ceilings_from_empty_field() {
    let mut world = WorldBuilder::new()
        .with_config(|c| {
            c.balance.enabled = true;
            c.world.max_total = 12;
            c.world.max_per_type = 8;
        })
        .running()
        .build();

    for _ in 0..1500 {
        world.update(&FRAME);
        assert_within_ceilings!(world);
    }
    assert!(world.stats().total_entities > 0);
}

#[test]
fn test_balance_is_held_off_after_meteor() {
    let mut world = WorldBuilder::new()
        .with_config(|c| c.balance.enabled = true)
        .running()
        .build();
    run(&mut world, 90);
    world.trigger_area_clear(600.0, 400.0, 100.0);
    // The check at two seconds falls inside the quiet period.
    run(&mut world, 100);
    assert_eq!(world.stats().total_entities, 0);
    // The one at four seconds does not.
    run(&mut world, 60);
    assert!(world.stats().total_entities > 0);
}

#[test]
fn test_balance_off_in_rps() {
    let mut world = WorldBuilder::new()
        .with_config(|c| c.balance.enabled = true)
        .with_mode(GameMode::Rps)
        .running()
        .build();
    run(&mut world, 400);
    assert_eq!(world.stats().total_entities, 0);
}

#[test]
fn test_natural_grass_grows_without_balance() {
    let mut world = WorldBuilder::new()
        .with_config(|c| c.balance.grass_spawn_chance = 0.15)
        .with(|w| w.set_growth_rate(50.0))
        .running()
        .build();
    run(&mut world, 2000);
    let grass = world.stats().count(EntityKind::Grass);
    assert!(grass > 0);
    assert!(grass <= world.config.world.max_grass);
}

#[test]
fn test_reproduction_waits_for_cooldown_and_energy() {
    let mut world = WorldBuilder::new()
        .with_entity(EntityKind::Bug, 200.0, 200.0)
        .with_entity(EntityKind::Bug, 800.0, 600.0)
        .with(|w| {
            w.set_metabolism(0.0);
            w.entities[0].metabolism.energy = 0.9 * w.entities[0].metabolism.max_energy;
            w.entities[1].metabolism.energy = 0.7 * w.entities[1].metabolism.max_energy;
        })
        .running()
        .build();

    let step = TickContext::new(250.0);
    let mut first_birth_ms = None;
    for _ in 0..40 {
        world.update(&step);
        let parent = world.get_entity(1).expect("parent");
        if parent.metabolism.reproduction_count > 0 && first_birth_ms.is_none() {
            first_birth_ms = Some(world.time_ms);
        }
    }

    let born_at = first_birth_ms.expect("the fit bug never reproduced");
    assert!(born_at >= world.config.reproduction.cooldown_ms);
    assert_eq!(world.get_entity(2).expect("weak bug").metabolism.reproduction_count, 0);
    let parent = world.get_entity(1).expect("parent");
    assert_eq!(parent.metabolism.energy, 0.35 * parent.metabolism.max_energy);
    let child = world
        .live_entities()
        .find(|e| e.identity.parent_id == Some(1))
        .expect("child admitted");
    assert_eq!(child.metabolism.energy, parent.metabolism.energy);
}

#[test]
fn test_births_are_rate_limited() {
    let mut builder = WorldBuilder::new();
    for i in 0..10 {
        builder = builder.with_entity(EntityKind::Bug, 100.0 + i as f64 * 100.0, 400.0);
    }
    let mut world = builder
        .with(|w| {
            w.set_metabolism(0.0);
            for e in w.entities.iter_mut() {
                e.metabolism.energy = e.metabolism.max_energy;
            }
        })
        .running()
        .build();

    let births = |w: &yumyum_lib::World| -> u32 {
        w.live_entities()
            .filter(|e| e.identity.parent_id.is_none())
            .map(|e| e.metabolism.reproduction_count)
            .sum()
    };

    world.update(&TickContext::new(5000.0));
    assert_eq!(births(&world), 2);
    assert_eq!(world.pending_births.len(), 2);

    run(&mut world, 30);
    assert_eq!(births(&world), 5);
    assert_eq!(world.stats().count(EntityKind::Bug), 15);
}

#[test]
fn test_queued_births_respect_ceiling() {
    let mut world = WorldBuilder::new()
        .with_config(|c| {
            c.world.max_per_type = 3;
            c.balance.min_counts = [0; 5];
        })
        .with_entity(EntityKind::Frog, 200.0, 200.0)
        .with_entity(EntityKind::Frog, 600.0, 200.0)
        .with(|w| {
            w.set_metabolism(0.0);
            for e in w.entities.iter_mut() {
                e.metabolism.energy = e.metabolism.max_energy;
            }
        })
        .running()
        .build();

    world.update(&TickContext::new(5000.0));
    // Both breeders fit only one child between them.
    assert_eq!(world.pending_births.len(), 1);
    world.update(&FRAME);
    assert_population!(world, EntityKind::Frog, 3);
}
