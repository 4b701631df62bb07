use crate::model::history::{DeathCause, LiveEvent, SpawnSource};
use crate::model::lifecycle;
use crate::model::world::World;
use rand::seq::index;
use yumyum_core::systems::balance::{self, PlacementContext, SpawnArea};
use yumyum_core::systems::reproduction::{has_room, occupancy};
use yumyum_core::SimulationContext;
use yumyum_data::{Entity, EntityId, EntityKind, FieldEffect, FieldEffectKind, GameMode};

impl World {
    /// Places `kind` exactly at `(x, y)`, ceilings permitting.
    pub fn spawn_at(&mut self, kind: EntityKind, x: f64, y: f64) -> Option<EntityId> {
        let id = self.spawn_entity(kind, x, y)?;
        let event = self.spawn_event(id, kind, SpawnSource::Manual);
        self.record_events(&[event]);
        self.publish_snapshots(false);
        Some(id)
    }

    /// Places `kind` at a free spot near `(x, y)`.
    ///
    /// Returns `None` when the kind does not play in the current mode or a
    /// ceiling is reached.
    pub fn add_entity(&mut self, kind: EntityKind, x: f64, y: f64) -> Option<EntityId> {
        if !self.mode.allows(kind) {
            tracing::debug!(%kind, mode = %self.mode, "Placement rejected for mode");
            return None;
        }
        self.spatial_hash.build(&self.entities);
        let events = &self.config.events;
        let (px, py) = balance::find_safe_spawn_position(
            &PlacementContext {
                entities: &self.entities,
                grid: &self.spatial_hash,
                area: SpawnArea::from_config(&self.config),
            },
            events.placement_min_distance,
            events.placement_attempts,
            Some((x, y)),
            &[],
            &mut self.rng,
        );
        self.spawn_at(kind, px, py)
    }

    /// Meteor strike: removes every entity within `radius` of `(x, y)` and
    /// holds off the balancer for its cooldown.
    pub fn trigger_area_clear(&mut self, x: f64, y: f64, radius: f64) -> Vec<LiveEvent> {
        let r_sq = radius * radius;
        let mut events = Vec::new();
        for e in self.entities.iter_mut().filter(|e| e.is_live()) {
            if e.distance_sq_to(x, y) < r_sq {
                e.status.removing = true;
                events.push(LiveEvent::Death {
                    id: e.id(),
                    kind: e.kind(),
                    cause: DeathCause::AreaClear,
                    tick: self.tick,
                    time_ms: self.time_ms,
                });
            }
        }
        self.pending_births.retain(|child| child.distance_sq_to(x, y) >= r_sq);
        self.purge_removed();
        self.ctx.last_meteor_ms = Some(self.time_ms);
        self.effect = Some(FieldEffect {
            kind: FieldEffectKind::Meteor { x, y, radius },
            until_ms: self.time_ms + self.config.events.meteor_effect_ms,
        });
        tracing::info!(x, y, radius, destroyed = events.len(), "Meteor strike");
        self.after_command(&events);
        events
    }

    /// Scatters up to `count` entities of `kind`, truncated to the room left
    /// under both ceilings.
    pub fn trigger_bulk_spawn(&mut self, kind: EntityKind, count: usize) -> Vec<LiveEvent> {
        let events = self.bulk_spawn(kind, count, SpawnSource::Rain);
        self.after_command(&events);
        events
    }

    /// Rain: grass in ECO mode, frogs in RPS mode.
    pub fn trigger_rain(&mut self) -> Vec<LiveEvent> {
        let (kind, count) = match self.mode {
            GameMode::Eco => (EntityKind::Grass, self.config.events.rain_grass_count),
            GameMode::Rps => (EntityKind::Frog, self.config.events.rain_frog_count),
        };
        let events = self.bulk_spawn(kind, count, SpawnSource::Rain);
        self.effect = Some(FieldEffect {
            kind: FieldEffectKind::Rain,
            until_ms: self.time_ms + self.config.events.rain_effect_ms,
        });
        tracing::info!(%kind, spawned = events.len(), "Rain");
        self.after_command(&events);
        events
    }

    /// Plague: halves the energy of a random `fraction` of the animals.
    pub fn trigger_epidemic(&mut self, fraction: f64) -> Vec<LiveEvent> {
        let animals: Vec<usize> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_live() && !e.kind().is_grass())
            .map(|(i, _)| i)
            .collect();
        let infected = (animals.len() as f64 * fraction.clamp(0.0, 1.0)).floor() as usize;
        for pick in index::sample(&mut self.rng, animals.len(), infected) {
            let e = &mut self.entities[animals[pick]];
            e.metabolism.energy *= 0.5;
        }
        self.effect = Some(FieldEffect {
            kind: FieldEffectKind::Plague,
            until_ms: self.time_ms + self.config.events.plague_effect_ms,
        });
        tracing::info!(infected, "Plague");
        let events = vec![LiveEvent::Plague {
            infected,
            tick: self.tick,
            time_ms: self.time_ms,
        }];
        self.after_command(&events);
        events
    }

    /// Switches the rule set. Always starts from an empty field.
    pub fn set_mode(&mut self, mode: GameMode) {
        tracing::info!(from = %self.mode, to = %mode, "Mode switch");
        self.mode = mode;
        self.clear_session();
    }

    /// Clears every entity, counter, timer and the stats history.
    pub fn reset(&mut self) {
        tracing::info!(tick = self.tick, "Reset");
        self.clear_session();
    }

    pub fn set_running(&mut self, running: bool) {
        self.ramp.set_running(running);
        self.publish_snapshots(true);
    }

    pub fn toggle_running(&mut self) {
        self.set_running(!self.is_running());
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.tunables.time_scale = time_scale.max(0.0);
    }

    pub fn set_metabolism(&mut self, metabolism: f64) {
        self.tunables.metabolism = metabolism.max(0.0);
    }

    pub fn set_growth_rate(&mut self, growth_rate: f64) {
        self.tunables.growth_rate = growth_rate.max(0.0);
    }

    pub fn set_speed_multiplier(&mut self, speed_multiplier: f64) {
        self.tunables.speed_multiplier = speed_multiplier.max(0.0);
    }

    pub fn set_auto_balance(&mut self, enabled: bool) {
        self.tunables.auto_balance = enabled;
    }

    /// Sets the minimum population of `kind`, capped at the per-type ceiling.
    pub fn set_min_count(&mut self, kind: EntityKind, count: usize) {
        self.tunables.min_counts[kind.index()] = count.min(self.config.world.max_per_type);
    }

    /// The closest live entity within the inspection radius of `(x, y)`.
    pub fn entity_at(&self, x: f64, y: f64) -> Option<&Entity> {
        let max_sq = self.config.events.inspect_radius.powi(2);
        self.live_entities()
            .map(|e| (e.distance_sq_to(x, y), e))
            .filter(|(d, _)| *d <= max_sq)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, e)| e)
    }

    /// Seeds the field with up to `per_kind` entities of every kind the mode
    /// uses, spread out with the distributed placement heuristic.
    pub fn populate(&mut self, per_kind: usize) -> Vec<LiveEvent> {
        let mut events = Vec::new();
        for kind in EntityKind::ALL {
            if self.mode.allows(kind) {
                events.extend(self.bulk_spawn(kind, per_kind, SpawnSource::Manual));
            }
        }
        tracing::info!(per_kind, total = self.entities.len(), "Field populated");
        self.after_command(&events);
        events
    }

    /// Creates one entity at `(x, y)` unless a ceiling forbids it.
    ///
    /// The position is clamped so the whole body lies inside the field.
    pub(super) fn spawn_entity(&mut self, kind: EntityKind, x: f64, y: f64) -> Option<EntityId> {
        if !x.is_finite() || !y.is_finite() {
            tracing::debug!(%kind, x, y, "Spawn rejected at non-finite position");
            return None;
        }
        let half = self.config.species.profile(kind).size / 2.0;
        let x = x.clamp(half, (f64::from(self.width) - half).max(half));
        let y = y.clamp(half, (f64::from(self.height) - half).max(half));

        let (counts, total) = occupancy(&self.entities, &self.pending_births);
        if !has_room(&self.config, &counts, total, kind) {
            tracing::debug!(%kind, total, "Spawn skipped at ceiling");
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        let entity =
            lifecycle::create_entity_with_rng(id, kind, x, y, self.time_ms, &self.config, &mut self.rng);
        self.id_map.insert(id, self.entities.len());
        self.entities.push(entity);
        Some(id)
    }

    pub(super) fn spawn_event(&self, id: EntityId, kind: EntityKind, source: SpawnSource) -> LiveEvent {
        LiveEvent::Spawn {
            id,
            kind,
            source,
            tick: self.tick,
            time_ms: self.time_ms,
        }
    }

    fn bulk_spawn(&mut self, kind: EntityKind, count: usize, source: SpawnSource) -> Vec<LiveEvent> {
        if !self.mode.allows(kind) {
            return Vec::new();
        }
        let (counts, total) = occupancy(&self.entities, &self.pending_births);
        let world = &self.config.world;
        let room = world
            .max_per_type
            .saturating_sub(counts[kind.index()])
            .min(world.max_total.saturating_sub(total));
        let count = count.min(room);
        if count == 0 {
            tracing::debug!(%kind, "Bulk spawn truncated to nothing");
            return Vec::new();
        }

        self.spatial_hash.build(&self.entities);
        let positions = {
            let ctx = PlacementContext {
                entities: &self.entities,
                grid: &self.spatial_hash,
                area: SpawnArea::from_config(&self.config),
            };
            let events = &self.config.events;
            let mut positions: Vec<(f64, f64)> = Vec::with_capacity(count);
            for _ in 0..count {
                let pos = balance::find_safe_spawn_position(
                    &ctx,
                    events.rain_min_spacing,
                    events.rain_attempts,
                    None,
                    &positions,
                    &mut self.rng,
                );
                positions.push(pos);
            }
            positions
        };

        let mut spawned = Vec::with_capacity(positions.len());
        for (x, y) in positions {
            if let Some(id) = self.spawn_entity(kind, x, y) {
                spawned.push(self.spawn_event(id, kind, source));
            }
        }
        spawned
    }

    fn clear_session(&mut self) {
        self.entities.clear();
        self.pending_births.clear();
        self.id_map.clear();
        self.ctx = SimulationContext::new(self.time_ms);
        self.pop_stats = Default::default();
        self.history.clear();
        self.effect = None;
        self.ramp.settle();
        self.publish_snapshots(true);
    }

    fn after_command(&mut self, events: &[LiveEvent]) {
        self.refresh_stats();
        self.record_events(events);
        self.publish_snapshots(true);
    }
}
