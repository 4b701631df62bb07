use crate::config::AppConfig;
use crate::spatial_hash::SpatialHash;
use std::collections::HashSet;
use yumyum_data::{Entity, EntityId, EntityKind, GameMode};

/// A candidate kill found during the collision scan. Nothing is mutated until
/// the whole batch is resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EatingEvent {
    pub predator_idx: usize,
    pub prey_idx: usize,
    pub predator: EntityId,
    pub prey: EntityId,
    pub predator_kind: EntityKind,
    pub prey_kind: EntityKind,
    pub dist_sq: f64,
}

/// Deferred state change produced by the collision scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionCommand {
    /// Same-kind separation, accumulated per entity.
    Push {
        idx: usize,
        dx: f64,
        dy: f64,
        dvx: f64,
        dvy: f64,
    },
    /// RPS contact: `prey_idx` takes the kind of `predator_idx`.
    Convert { predator_idx: usize, prey_idx: usize },
}

#[derive(Debug, Default)]
pub struct CollisionOutcome {
    pub commands: Vec<InteractionCommand>,
    pub eating_events: Vec<EatingEvent>,
}

pub struct InteractionContext<'a> {
    pub config: &'a AppConfig,
    pub mode: GameMode,
    pub entities: &'a [Entity],
    pub grid: &'a SpatialHash,
    pub now_ms: f64,
}

/// Whether `predator` has digested its last meal.
pub fn eat_cooldown_elapsed(predator: &Entity, mode: GameMode, now_ms: f64, config: &AppConfig) -> bool {
    let effects = &config.effects;
    match mode {
        GameMode::Eco => {
            let since = predator
                .metabolism
                .last_eat_ms
                .unwrap_or(predator.status.created_ms);
            now_ms - since >= effects.eat_cooldown_ms * effects.eco_cooldown_fraction
        }
        GameMode::Rps => predator
            .metabolism
            .last_eat_ms
            .map_or(true, |t| now_ms - t >= effects.eat_cooldown_ms),
    }
}

#[inline]
fn can_collide(e: &Entity) -> bool {
    e.is_live() && !e.status.invincible
}

/// Scans every unordered pair of touching entities once.
///
/// Same-kind pairs produce pushes; cross-kind pairs produce eating events
/// (ECO) or conversions (RPS). In RPS an entity takes part in at most one
/// conversion per scan, and a conversion that would push the winning kind past
/// the per-type ceiling is skipped.
pub fn detect_collisions(ctx: &InteractionContext) -> CollisionOutcome {
    let mut outcome = CollisionOutcome::default();
    let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();
    let mut converting: HashSet<usize> = HashSet::new();
    let mut kind_counts = [0usize; EntityKind::COUNT];
    for e in ctx.entities.iter().filter(|e| e.is_live()) {
        kind_counts[e.kind().index()] += 1;
    }
    let mut nearby = Vec::new();
    let steering = &ctx.config.steering;

    for (i, e1) in ctx.entities.iter().enumerate() {
        if !can_collide(e1) || e1.kind().is_grass() {
            continue;
        }
        ctx.grid.query_into(e1.physics.x, e1.physics.y, 1, &mut nearby);

        for &j in &nearby {
            if i == j {
                continue;
            }
            let e2 = &ctx.entities[j];
            if !can_collide(e2) {
                continue;
            }
            if !seen_pairs.insert((i.min(j), i.max(j))) {
                continue;
            }

            let dx = e2.physics.x - e1.physics.x;
            let dy = e2.physics.y - e1.physics.y;
            let dist_sq = dx * dx + dy * dy;
            let combined = (e1.physics.size + e2.physics.size) / 2.0;
            let contact = combined * steering.contact_factor;
            if dist_sq >= contact * contact {
                continue;
            }

            if e1.kind() == e2.kind() {
                let angle = dy.atan2(dx);
                let (s, c) = angle.sin_cos();
                let push = ((combined - dist_sq.sqrt()) / 3.0).max(0.0);
                let nudge = steering.push_speed;
                outcome.commands.push(InteractionCommand::Push {
                    idx: i,
                    dx: -c * push,
                    dy: -s * push,
                    dvx: -c * nudge,
                    dvy: -s * nudge,
                });
                outcome.commands.push(InteractionCommand::Push {
                    idx: j,
                    dx: c * push,
                    dy: s * push,
                    dvx: c * nudge,
                    dvy: s * nudge,
                });
                continue;
            }

            match ctx.mode {
                GameMode::Eco => {
                    let pair = if ctx.mode.preys_on(e1.kind(), e2.kind())
                        && eat_cooldown_elapsed(e1, ctx.mode, ctx.now_ms, ctx.config)
                    {
                        Some((i, j))
                    } else if ctx.mode.preys_on(e2.kind(), e1.kind())
                        && eat_cooldown_elapsed(e2, ctx.mode, ctx.now_ms, ctx.config)
                    {
                        Some((j, i))
                    } else {
                        None
                    };
                    if let Some((p, q)) = pair {
                        let (predator, prey) = (&ctx.entities[p], &ctx.entities[q]);
                        outcome.eating_events.push(EatingEvent {
                            predator_idx: p,
                            prey_idx: q,
                            predator: predator.id(),
                            prey: prey.id(),
                            predator_kind: predator.kind(),
                            prey_kind: prey.kind(),
                            dist_sq,
                        });
                    }
                }
                GameMode::Rps => {
                    if converting.contains(&i) || converting.contains(&j) {
                        continue;
                    }
                    let pair = if ctx.mode.preys_on(e1.kind(), e2.kind())
                        && eat_cooldown_elapsed(e1, ctx.mode, ctx.now_ms, ctx.config)
                    {
                        Some((i, j))
                    } else if ctx.mode.preys_on(e2.kind(), e1.kind())
                        && eat_cooldown_elapsed(e2, ctx.mode, ctx.now_ms, ctx.config)
                    {
                        Some((j, i))
                    } else {
                        None
                    };
                    if let Some((p, q)) = pair {
                        let (winner, loser) = (ctx.entities[p].kind(), ctx.entities[q].kind());
                        if kind_counts[winner.index()] >= ctx.config.world.max_per_type {
                            continue;
                        }
                        kind_counts[winner.index()] += 1;
                        kind_counts[loser.index()] -= 1;
                        converting.insert(p);
                        converting.insert(q);
                        outcome.commands.push(InteractionCommand::Convert {
                            predator_idx: p,
                            prey_idx: q,
                        });
                    }
                }
            }
        }
    }
    outcome
}

/// Orders and filters eating events so every predator eats at most once and
/// every prey is consumed at most once.
///
/// Events are sorted by distance; events within `tie_window` (squared
/// distance) of the first event of their run are ordered by predator tier,
/// then predator id, both descending. A predator that was itself eaten
/// earlier in the batch cannot eat.
pub fn resolve_eating_events(mut events: Vec<EatingEvent>, tie_window: f64) -> Vec<EatingEvent> {
    events.sort_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq));

    let mut start = 0;
    while start < events.len() {
        let anchor = events[start].dist_sq;
        let end = events[start..]
            .iter()
            .position(|e| e.dist_sq - anchor > tie_window)
            .map_or(events.len(), |off| start + off);
        events[start..end].sort_by(|a, b| {
            b.predator_kind
                .cmp(&a.predator_kind)
                .then_with(|| b.predator.cmp(&a.predator))
        });
        start = end;
    }

    let mut consumed: HashSet<EntityId> = HashSet::new();
    let mut fed: HashSet<EntityId> = HashSet::new();
    events
        .into_iter()
        .filter(|e| {
            if consumed.contains(&e.prey) || consumed.contains(&e.predator) || fed.contains(&e.predator) {
                return false;
            }
            consumed.insert(e.prey);
            fed.insert(e.predator);
            true
        })
        .collect()
}

/// Applies accumulated pushes and conversions.
pub fn apply_commands(entities: &mut [Entity], commands: &[InteractionCommand], now_ms: f64, config: &AppConfig) {
    let effects = &config.effects;
    for cmd in commands {
        match *cmd {
            InteractionCommand::Push { idx, dx, dy, dvx, dvy } => {
                if let Some(e) = entities.get_mut(idx) {
                    e.physics.x += dx;
                    e.physics.y += dy;
                    e.physics.vx += dvx;
                    e.physics.vy += dvy;
                }
            }
            InteractionCommand::Convert { predator_idx, prey_idx } => {
                let Some(kind) = entities.get(predator_idx).map(Entity::kind) else {
                    continue;
                };
                for (idx, convert) in [(predator_idx, false), (prey_idx, true)] {
                    let Some(e) = entities.get_mut(idx) else { continue };
                    if convert {
                        e.identity.kind = kind;
                        e.intel.target = None;
                    }
                    e.metabolism.last_eat_ms = Some(now_ms);
                    e.status.eating_until_ms = now_ms + effects.eat_effect_ms;
                    e.status.invincible_until_ms = now_ms + effects.conversion_invincibility_ms;
                    e.status.refresh(now_ms);
                }
            }
        }
    }
}

/// Applies resolved kills. Returns the energy each predator gained, in order.
pub fn apply_eating(entities: &mut [Entity], resolved: &[EatingEvent], now_ms: f64, config: &AppConfig) -> Vec<f64> {
    let mut gains = Vec::with_capacity(resolved.len());
    for event in resolved {
        if let Some(prey) = entities.get_mut(event.prey_idx) {
            prey.status.removing = true;
            prey.intel.target = None;
        }
        let gain = config.metabolism.energy_gain
            + event.prey_kind.index() as f64 * config.metabolism.prey_tier_bonus;
        if let Some(predator) = entities.get_mut(event.predator_idx) {
            predator.gain_energy(gain);
            predator.intel.target = None;
            predator.metabolism.last_eat_ms = Some(now_ms);
            predator.status.eating_until_ms = now_ms + config.effects.eat_effect_ms;
            predator.status.refresh(now_ms);
        }
        gains.push(gain);
    }
    gains
}

/// Drops targets that point at any of `gone`.
pub fn clear_dangling_targets(entities: &mut [Entity], gone: &HashSet<EntityId>) {
    if gone.is_empty() {
        return;
    }
    for e in entities.iter_mut() {
        if e.intel.target.is_some_and(|t| gone.contains(&t)) {
            e.intel.target = None;
        }
    }
}
