use yumyum_lib::model::config::AppConfig;
use yumyum_lib::model::TickContext;
use yumyum_lib::World;

fn seeded_world(seed: u64) -> World {
    let mut config = AppConfig::default();
    config.world.seed = Some(seed);
    let mut world = World::new(config).unwrap();
    world.populate(6);
    world.set_running(true);
    world
}

#[test]
fn test_determinism_consistency() {
    let mut world1 = seeded_world(12345);
    let mut world2 = seeded_world(12345);
    let frame = TickContext::frame(60);

    // Run for 600 ticks
    for _ in 0..600 {
        let events1 = world1.update(&frame);
        let events2 = world2.update(&frame);
        assert_eq!(events1, events2, "Event streams diverged at tick {}", world1.tick);
    }

    assert_eq!(
        world1.entities.len(),
        world2.entities.len(),
        "Entity counts should match"
    );
    for (e1, e2) in world1.entities.iter().zip(&world2.entities) {
        assert_eq!(e1.id(), e2.id());
        assert_eq!(e1.pos(), e2.pos());
        assert_eq!(e1.metabolism.energy, e2.metabolism.energy);
    }
    assert_eq!(world1.state_hash().unwrap(), world2.state_hash().unwrap());
}

#[test]
fn test_different_seeds_diverge() {
    let mut world1 = seeded_world(1);
    let mut world2 = seeded_world(2);
    let frame = TickContext::frame(60);
    for _ in 0..60 {
        world1.update(&frame);
        world2.update(&frame);
    }
    assert_ne!(world1.state_hash().unwrap(), world2.state_hash().unwrap());
}
