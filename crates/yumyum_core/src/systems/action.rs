use crate::config::AppConfig;
use crate::spatial_hash::SpatialHash;
use crate::systems::resolve;
use rand::Rng;
use std::collections::HashMap;
use std::f64::consts::TAU;
use yumyum_data::{Entity, EntityId, GameMode};

/// Field geometry and global scalars for the movement pass.
#[derive(Debug, Clone, Copy)]
pub struct MovementParams {
    pub width: f64,
    pub height: f64,
    pub time_scale: f64,
    pub ramp: f64,
    /// A target this close to a wall just hit is abandoned.
    pub wall_target_margin: f64,
    /// Half-width of the heading perturbation after such a hit, in radians.
    pub wall_perturbation: f64,
}

#[inline]
fn rotate(vx: f64, vy: f64, angle: f64) -> (f64, f64) {
    let (s, c) = angle.sin_cos();
    (vx * c - vy * s, vx * s + vy * c)
}

/// Integrates position and bounces off the field edges.
///
/// `target_pos` is the resolved position of the entity's current target, if
/// any. A corner hit replaces the heading with a random one; a single wall hit
/// with the target hugging that wall drops the target and jitters the heading.
pub fn update_movement<R: Rng>(
    entity: &mut Entity,
    target_pos: Option<(f64, f64)>,
    params: &MovementParams,
    rng: &mut R,
) {
    if entity.kind().is_grass() || !entity.is_live() {
        return;
    }

    let p = &mut entity.physics;
    p.x += p.vx * params.ramp * params.time_scale;
    p.y += p.vy * params.ramp * params.time_scale;

    let half = p.size / 2.0;
    let max_x = (params.width - half).max(half);
    let max_y = (params.height - half).max(half);

    let mut wall_x = None;
    if p.x < half {
        p.vx = -p.vx;
        p.x = half;
        wall_x = Some(0.0);
    } else if p.x > max_x {
        p.vx = -p.vx;
        p.x = max_x;
        wall_x = Some(params.width);
    }

    let mut wall_y = None;
    if p.y < half {
        p.vy = -p.vy;
        p.y = half;
        wall_y = Some(0.0);
    } else if p.y > max_y {
        p.vy = -p.vy;
        p.y = max_y;
        wall_y = Some(params.height);
    }

    let near_wall = match (wall_x, wall_y) {
        (Some(_), Some(_)) => {
            let speed = p.vx.hypot(p.vy);
            let angle = rng.gen_range(0.0..TAU);
            p.vx = angle.cos() * speed;
            p.vy = angle.sin() * speed;
            entity.intel.target = None;
            return;
        }
        (Some(wall), None) => {
            target_pos.is_some_and(|(tx, _)| (tx - wall).abs() <= params.wall_target_margin)
        }
        (None, Some(wall)) => {
            target_pos.is_some_and(|(_, ty)| (ty - wall).abs() <= params.wall_target_margin)
        }
        (None, None) => false,
    };

    if near_wall {
        let angle = rng.gen_range(-params.wall_perturbation..=params.wall_perturbation);
        (p.vx, p.vy) = rotate(p.vx, p.vy, angle);
        entity.intel.target = None;
    }
}

/// Moves every live animal, resolving targets against the pre-move positions.
pub fn movement_pass<R: Rng>(
    entities: &mut [Entity],
    id_map: &HashMap<EntityId, usize>,
    params: &MovementParams,
    rng: &mut R,
) {
    let target_positions: Vec<Option<(f64, f64)>> = entities
        .iter()
        .map(|e| {
            e.intel
                .target
                .and_then(|id| resolve(entities, id_map, id))
                .map(|(_, t)| t.pos())
        })
        .collect();

    for (entity, target_pos) in entities.iter_mut().zip(target_positions) {
        update_movement(entity, target_pos, params, rng);
    }
}

/// Read-only view shared by every steering decision of a tick.
pub struct ActionContext<'a> {
    pub config: &'a AppConfig,
    pub mode: GameMode,
    pub entities: &'a [Entity],
    pub grid: &'a SpatialHash,
    pub id_map: &'a HashMap<EntityId, usize>,
    pub speed_multiplier: f64,
    pub ramp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringDecision {
    pub idx: usize,
    pub target: Option<EntityId>,
    pub vx: f64,
    pub vy: f64,
}

/// How many live entities currently pursue each id.
pub fn targeted_by_counts(entities: &[Entity]) -> HashMap<EntityId, usize> {
    let mut counts = HashMap::new();
    for e in entities.iter().filter(|e| e.is_live()) {
        if let Some(target) = e.intel.target {
            *counts.entry(target).or_insert(0) += 1;
        }
    }
    counts
}

/// Best prey candidate for `entity`, scored by proximity minus competition.
pub fn find_nearest_food(
    entity: &Entity,
    ctx: &ActionContext,
    targeted_by: &HashMap<EntityId, usize>,
    scratch: &mut Vec<usize>,
) -> Option<usize> {
    let prey_kinds = ctx.mode.prey_of(entity.kind());
    if prey_kinds.is_empty() {
        return None;
    }

    let sight = entity.physics.sight_range;
    let profile = ctx.config.species.profile(entity.kind());
    let radius = if profile.speed >= 1.0 { 2 } else { 1 };
    ctx.grid
        .query_into(entity.physics.x, entity.physics.y, radius, scratch);

    let mut best: Option<usize> = None;
    let mut best_score = f64::NEG_INFINITY;
    for &j in scratch.iter() {
        let other = &ctx.entities[j];
        if !other.is_live() || other.status.invincible || other.id() == entity.id() {
            continue;
        }
        if !prey_kinds.contains(&other.kind()) {
            continue;
        }
        let d2 = entity.distance_sq(other);
        if d2 >= sight * sight {
            continue;
        }

        let mut competition = targeted_by.get(&other.id()).copied().unwrap_or(0);
        if entity.intel.target == Some(other.id()) {
            competition = competition.saturating_sub(1);
        }
        let penalty = ctx.config.steering.competition_penalty * competition as f64;
        let score = (sight - d2.sqrt()) - penalty;
        if score > best_score {
            best_score = score;
            best = Some(j);
        }
    }
    best
}

/// Index of the entity's current target if it is still a legal pursuit.
pub fn validate_target(entity: &Entity, ctx: &ActionContext) -> Option<usize> {
    let id = entity.intel.target?;
    let (idx, target) = resolve(ctx.entities, ctx.id_map, id)?;
    (!target.status.invincible).then_some(idx)
}

/// Computes the new velocity and target of one animal.
pub fn steer<R: Rng>(
    idx: usize,
    ctx: &ActionContext,
    targeted_by: &HashMap<EntityId, usize>,
    scratch: &mut Vec<usize>,
    rng: &mut R,
) -> SteeringDecision {
    let entity = &ctx.entities[idx];
    let cfg = &ctx.config.steering;
    let base_speed = match ctx.mode {
        GameMode::Eco => ctx.config.species.profile(entity.kind()).speed,
        GameMode::Rps => ctx.config.rps.unified_speed,
    };
    let speed = base_speed * ctx.speed_multiplier * ctx.ramp;
    let sight = entity.physics.sight_range;
    let (x, y) = entity.pos();

    let target_idx = find_nearest_food(entity, ctx, targeted_by, scratch)
        .or_else(|| validate_target(entity, ctx));

    let mut mx = 0.0;
    let mut my = 0.0;

    if let Some(t) = target_idx {
        let target = &ctx.entities[t];
        mx += (target.physics.x - x) * cfg.seek_weight;
        my += (target.physics.y - y) * cfg.seek_weight;
    }

    // Flee
    ctx.grid.query_into(x, y, 1, scratch);
    for &j in scratch.iter() {
        let other = &ctx.entities[j];
        if j == idx || !other.is_live() || !ctx.mode.preys_on(other.kind(), entity.kind()) {
            continue;
        }
        let d = entity.distance_sq(other).sqrt();
        if d > 0.0 && d < sight {
            let w = cfg.flee_weight * (1.0 - d / sight);
            mx -= (other.physics.x - x) * w;
            my -= (other.physics.y - y) * w;
        }
    }

    // Separation
    let separation = entity.physics.size * cfg.separation_factor;
    ctx.grid.query_into(x, y, 0, scratch);
    for &j in scratch.iter() {
        let other = &ctx.entities[j];
        if j == idx || !other.is_live() || other.kind() != entity.kind() {
            continue;
        }
        let d = entity.distance_sq(other).sqrt();
        if d > 0.0 && d < separation {
            let w = cfg.separation_weight * (1.0 - d / separation);
            mx -= (other.physics.x - x) * w;
            my -= (other.physics.y - y) * w;
        }
    }

    let magnitude = mx.hypot(my);
    let (vx, vy) = if magnitude > 0.01 {
        (mx / magnitude * speed, my / magnitude * speed)
    } else if rng.gen::<f64>() < cfg.wander_chance {
        let heading = entity.physics.vy.atan2(entity.physics.vx)
            + rng.gen_range(-cfg.wander_angle..=cfg.wander_angle);
        (heading.cos() * speed, heading.sin() * speed)
    } else if entity.physics.vx == 0.0 && entity.physics.vy == 0.0 {
        let heading = rng.gen_range(0.0..TAU);
        (heading.cos() * speed, heading.sin() * speed)
    } else {
        (entity.physics.vx, entity.physics.vy)
    };

    SteeringDecision {
        idx,
        target: target_idx.map(|t| ctx.entities[t].id()),
        vx,
        vy,
    }
}

/// Steering decisions for every live animal, all taken from the same view.
pub fn compute_steering<R: Rng>(ctx: &ActionContext, rng: &mut R) -> Vec<SteeringDecision> {
    let targeted_by = targeted_by_counts(ctx.entities);
    let mut scratch = Vec::new();
    ctx.entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_live() && !e.kind().is_grass())
        .map(|(idx, _)| steer(idx, ctx, &targeted_by, &mut scratch, rng))
        .collect()
}

pub fn apply_steering(entities: &mut [Entity], decisions: &[SteeringDecision]) {
    for d in decisions {
        if let Some(entity) = entities.get_mut(d.idx) {
            entity.intel.target = d.target;
            entity.physics.vx = d.vx;
            entity.physics.vy = d.vy;
        }
    }
}
