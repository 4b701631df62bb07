use crate::model::history::{DeathCause, LiveEvent, SpawnSource};
use crate::model::world::World;
use std::collections::HashSet;
use std::time::Instant;
use yumyum_core::systems::balance::{self, BalanceContext, PlacementContext, SpawnArea};
use yumyum_core::systems::{action, build_id_map, energy, interaction, reproduction};
use yumyum_core::TickContext;
use yumyum_data::EntityId;

impl World {
    /// Advances the simulation by one tick.
    ///
    /// The clock always moves by `dt_ms`. Everything else scales by the
    /// animation ramp and is skipped while it sits at zero:
    /// - queued births are admitted
    /// - energy, movement and breeding eligibility
    /// - steering from one consistent view
    /// - reproduction (children queued for the next tick)
    /// - collisions, predation and conversion once the ramp is high enough
    /// - natural grass and auto-balance
    /// - cleanup, statistics and snapshots
    ///
    /// # Returns
    /// The live events of this tick (births, deaths, predation, spawns)
    pub fn update(&mut self, tick_ctx: &TickContext) -> Vec<LiveEvent> {
        let start = Instant::now();
        self.tick += 1;
        self.time_ms += tick_ctx.dt_ms;
        let ramp = self.ramp.advance();
        let mut events = Vec::new();

        if ramp > 0.0 {
            self.ctx.limiter.begin_tick(self.time_ms);
            self.pass_admit_births(&mut events);
            self.pass_energy_and_movement(ramp, &mut events);
            self.pass_steering(ramp);
            self.pass_reproduction();
            if ramp > self.config.collision_ramp_threshold {
                self.pass_interactions(&mut events);
            }
            self.pass_spawning(&mut events);
        }

        self.finalize_tick(&events);
        self.metrics.record_tick(start.elapsed(), self.entities.len());
        events
    }

    fn pass_admit_births(&mut self, events: &mut Vec<LiveEvent>) {
        if self.pending_births.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_births);
        let parents: Vec<(EntityId, Option<EntityId>)> = pending
            .iter()
            .map(|c| (c.id(), c.identity.parent_id))
            .collect();
        let admitted = reproduction::admit_births(&mut self.entities, pending, &self.config);
        let admitted: HashSet<EntityId> = admitted.into_iter().collect();

        for (id, parent) in parents {
            if !admitted.contains(&id) {
                continue;
            }
            if let (Some(parent_id), Some(child)) = (parent, self.entities.iter().rev().find(|e| e.id() == id)) {
                events.push(LiveEvent::Birth {
                    id,
                    parent_id,
                    kind: child.kind(),
                    tick: self.tick,
                    time_ms: self.time_ms,
                });
            }
        }
        self.ctx.total_reproductions += admitted.len() as u64;
        self.metrics.add_to_counter("births", admitted.len() as u64);
        self.id_map = build_id_map(&self.entities);
    }

    fn pass_energy_and_movement(&mut self, ramp: f64, events: &mut Vec<LiveEvent>) {
        let now = self.time_ms;
        for e in &mut self.entities {
            e.status.refresh(now);
        }

        let energy_ctx = energy::EnergyContext {
            config: &self.config,
            tunables: &self.tunables,
            mode: self.mode,
            ramp,
            now_ms: now,
        };
        let starved = energy::update_energy(&mut self.entities, &energy_ctx);
        for id in starved {
            if let Some(e) = self.entities.iter().find(|e| e.id() == id) {
                events.push(LiveEvent::Death {
                    id,
                    kind: e.kind(),
                    cause: DeathCause::Starvation,
                    tick: self.tick,
                    time_ms: now,
                });
            }
            self.metrics.increment_counter("starvations");
        }

        let params = action::MovementParams {
            width: f64::from(self.width),
            height: f64::from(self.height),
            time_scale: self.tunables.time_scale,
            ramp,
            wall_target_margin: self.config.steering.wall_target_margin,
            wall_perturbation: self.config.steering.wander_angle,
        };
        action::movement_pass(&mut self.entities, &self.id_map, &params, &mut self.rng);
        energy::flag_reproduction_candidates(&mut self.entities, &energy_ctx);
    }

    fn pass_steering(&mut self, ramp: f64) {
        self.spatial_hash.build(&self.entities);
        let decisions = {
            let ctx = action::ActionContext {
                config: &self.config,
                mode: self.mode,
                entities: &self.entities,
                grid: &self.spatial_hash,
                id_map: &self.id_map,
                speed_multiplier: self.tunables.speed_multiplier,
                ramp,
            };
            action::compute_steering(&ctx, &mut self.rng)
        };
        action::apply_steering(&mut self.entities, &decisions);
    }

    fn pass_reproduction(&mut self) {
        let births = {
            let ctx = reproduction::ReproductionContext {
                config: &self.config,
                mode: self.mode,
                entities: &self.entities,
                pending: &self.pending_births,
                grid: &self.spatial_hash,
                now_ms: self.time_ms,
            };
            reproduction::plan_reproduction(&ctx, &mut self.ctx.limiter, &mut self.next_id, &mut self.rng)
        };
        if births.is_empty() {
            return;
        }
        let children = reproduction::apply_births(&mut self.entities, births, self.time_ms, &self.config);
        tracing::debug!(tick = self.tick, queued = children.len(), "Births queued");
        self.pending_births.extend(children);
    }

    fn pass_interactions(&mut self, events: &mut Vec<LiveEvent>) {
        let now = self.time_ms;
        self.spatial_hash.build(&self.entities);
        let outcome = interaction::detect_collisions(&interaction::InteractionContext {
            config: &self.config,
            mode: self.mode,
            entities: &self.entities,
            grid: &self.spatial_hash,
            now_ms: now,
        });

        for cmd in &outcome.commands {
            if let interaction::InteractionCommand::Convert { predator_idx, prey_idx } = *cmd {
                let (from, to) = (self.entities[prey_idx].kind(), self.entities[predator_idx].kind());
                events.push(LiveEvent::Conversion {
                    id: self.entities[prey_idx].id(),
                    from,
                    to,
                    tick: self.tick,
                    time_ms: now,
                });
                self.metrics.increment_counter("conversions");
            }
        }
        interaction::apply_commands(&mut self.entities, &outcome.commands, now, &self.config);

        let resolved =
            interaction::resolve_eating_events(outcome.eating_events, self.config.steering.tie_window);
        if resolved.is_empty() {
            return;
        }
        let gains = interaction::apply_eating(&mut self.entities, &resolved, now, &self.config);
        let mut consumed = HashSet::with_capacity(resolved.len());
        for (event, gain) in resolved.iter().zip(gains) {
            consumed.insert(event.prey);
            events.push(LiveEvent::Predation {
                predator: event.predator,
                prey: event.prey,
                predator_kind: event.predator_kind,
                prey_kind: event.prey_kind,
                energy_gained: gain,
                tick: self.tick,
                time_ms: now,
            });
            events.push(LiveEvent::Death {
                id: event.prey,
                kind: event.prey_kind,
                cause: DeathCause::Eaten,
                tick: self.tick,
                time_ms: now,
            });
        }
        self.metrics.add_to_counter("predations", resolved.len() as u64);
        interaction::clear_dangling_targets(&mut self.entities, &consumed);
    }

    fn pass_spawning(&mut self, events: &mut Vec<LiveEvent>) {
        let now = self.time_ms;
        self.spatial_hash.build(&self.entities);

        let balance_due = now - self.ctx.last_balance_check_ms >= self.config.balance.check_interval_ms;
        let (grass, top_up) = {
            let ctx = BalanceContext {
                config: &self.config,
                tunables: &self.tunables,
                mode: self.mode,
                placement: PlacementContext {
                    entities: &self.entities,
                    grid: &self.spatial_hash,
                    area: SpawnArea::from_config(&self.config),
                },
                pending: &self.pending_births,
                now_ms: now,
                last_meteor_ms: self.ctx.last_meteor_ms,
            };
            let grass = balance::plan_natural_grass(&ctx, &mut self.ctx.last_grass_spawn_ms, &mut self.rng);
            let top_up = if balance_due {
                balance::plan_auto_balance(&ctx, &mut self.rng)
            } else {
                Vec::new()
            };
            (grass, top_up)
        };
        if balance_due {
            self.ctx.last_balance_check_ms = now;
        }

        let requests = grass
            .into_iter()
            .map(|r| (r, SpawnSource::Growth))
            .chain(top_up.into_iter().map(|r| (r, SpawnSource::Balance)));
        for (request, source) in requests {
            if let Some(id) = self.spawn_entity(request.kind, request.x, request.y) {
                events.push(self.spawn_event(id, request.kind, source));
            }
        }
    }
}
