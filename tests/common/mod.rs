pub mod macros;

use yumyum_lib::model::config::AppConfig;
use yumyum_lib::model::state::{EntityId, EntityKind, GameMode};
use yumyum_lib::model::TickContext;
use yumyum_lib::World;

type EntityMod = Box<dyn FnOnce(&mut World)>;

/// One 60 fps frame.
pub const FRAME: TickContext = TickContext { dt_ms: 1000.0 / 60.0 };

#[allow(dead_code)]
pub struct WorldBuilder {
    config: AppConfig,
    mode: GameMode,
    running: bool,
    spawns: Vec<(EntityKind, f64, f64)>,
    mods: Vec<EntityMod>,
}

#[allow(dead_code)]
impl WorldBuilder {
    /// Quiet world: seeded, auto-balance off, no natural grass.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.seed = Some(42);
        config.balance.enabled = false;
        config.balance.grass_spawn_chance = 0.0;
        Self {
            config,
            mode: GameMode::Eco,
            running: false,
            spawns: Vec::new(),
            mods: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Entity placed exactly at `(x, y)`; ids are handed out in call order
    /// starting from 1.
    pub fn with_entity(mut self, kind: EntityKind, x: f64, y: f64) -> Self {
        self.spawns.push((kind, x, y));
        self
    }

    /// Arbitrary tweak applied after the entities are placed.
    pub fn with<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut World) + 'static,
    {
        self.mods.push(Box::new(f));
        self
    }

    /// Starts with the ramp already at full speed.
    pub fn running(mut self) -> Self {
        self.running = true;
        self
    }

    pub fn build(self) -> World {
        let mut world = World::new(self.config).expect("Failed to create world in test builder");
        world.set_mode(self.mode);
        for (kind, x, y) in self.spawns {
            world
                .spawn_at(kind, x, y)
                .expect("Builder entity exceeds a ceiling");
        }
        for m in self.mods {
            m(&mut world);
        }
        if self.running {
            world.set_running(true);
            world.ramp.settle();
        }
        world
    }
}

/// Runs `ticks` frames and returns the ids of every entity seen dead.
#[allow(dead_code)]
pub fn run(world: &mut World, ticks: usize) -> Vec<EntityId> {
    use yumyum_lib::model::history::LiveEvent;
    let mut dead = Vec::new();
    for _ in 0..ticks {
        for event in world.update(&FRAME) {
            if let LiveEvent::Death { id, .. } = event {
                dead.push(id);
            }
        }
    }
    dead
}
