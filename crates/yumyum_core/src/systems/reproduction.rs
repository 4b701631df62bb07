use crate::config::AppConfig;
use crate::lifecycle::create_offspring_with_rng;
use crate::spatial_hash::SpatialHash;
use rand::Rng;
use yumyum_data::{Entity, EntityId, EntityKind, GameMode};

/// Caps births per tick and per rolling second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReproductionLimiter {
    pub window_start_ms: f64,
    pub births_in_window: usize,
    pub births_this_tick: usize,
}

impl ReproductionLimiter {
    pub fn new(now_ms: f64) -> Self {
        Self {
            window_start_ms: now_ms,
            births_in_window: 0,
            births_this_tick: 0,
        }
    }

    /// Resets the per-tick counter and, once a full second has passed since
    /// the window opened, the per-second counter.
    pub fn begin_tick(&mut self, now_ms: f64) {
        if now_ms - self.window_start_ms >= 1000.0 {
            self.window_start_ms = now_ms;
            self.births_in_window = 0;
        }
        self.births_this_tick = 0;
    }

    pub fn allows(&self, config: &AppConfig) -> bool {
        self.births_this_tick < config.reproduction.max_per_tick
            && self.births_in_window < config.reproduction.max_per_second
    }

    pub fn record(&mut self) {
        self.births_this_tick += 1;
        self.births_in_window += 1;
    }
}

/// Whether `entity` may breed at `now_ms`.
pub fn is_eligible(entity: &Entity, now_ms: f64, mode: GameMode, config: &AppConfig) -> bool {
    mode == GameMode::Eco
        && !entity.kind().is_grass()
        && entity.is_live()
        && entity.energy_ratio() >= config.reproduction.energy_threshold
        && now_ms - entity.metabolism.last_reproduction_ms >= config.reproduction.cooldown_ms
}

/// A planned split. The parent update and the child are applied together.
#[derive(Debug, Clone)]
pub struct Birth {
    pub parent_idx: usize,
    pub parent: EntityId,
    pub parent_energy: f64,
    /// New `last_reproduction_ms` of the parent, jitter included.
    pub parent_last_reproduction_ms: f64,
    pub child: Entity,
}

pub struct ReproductionContext<'a> {
    pub config: &'a AppConfig,
    pub mode: GameMode,
    pub entities: &'a [Entity],
    /// Children already waiting for insertion.
    pub pending: &'a [Entity],
    pub grid: &'a SpatialHash,
    pub now_ms: f64,
}

/// Live plus queued population, per kind and in total.
pub fn occupancy(entities: &[Entity], pending: &[Entity]) -> ([usize; EntityKind::COUNT], usize) {
    let mut counts = [0usize; EntityKind::COUNT];
    for e in entities.iter().filter(|e| e.is_live()).chain(pending) {
        counts[e.kind().index()] += 1;
    }
    let total = counts.iter().sum();
    (counts, total)
}

/// True when one more `kind` fits under both ceilings.
#[inline]
pub fn has_room(config: &AppConfig, counts: &[usize; EntityKind::COUNT], total: usize, kind: EntityKind) -> bool {
    counts[kind.index()] < config.world.max_per_type && total < config.world.max_total
}

fn is_clear(x: f64, y: f64, parent: EntityId, ctx: &ReproductionContext, births: &[Birth]) -> bool {
    let min_sq = ctx.config.reproduction.min_distance.powi(2);
    let radius = (ctx.config.reproduction.min_distance / ctx.grid.cell_size).ceil().max(1.0) as u32;
    let mut clear = true;
    ctx.grid.query_callback(x, y, radius, |idx| {
        let e = &ctx.entities[idx];
        if clear && e.is_live() && e.id() != parent && e.distance_sq_to(x, y) < min_sq {
            clear = false;
        }
    });
    clear
        && births
            .iter()
            .all(|b| b.child.distance_sq_to(x, y) >= min_sq)
}

/// Picks a spot near `parent` that keeps the minimum distance from every
/// other live entity and every child planned this tick; falls back to the
/// parent's own position.
pub fn find_child_position<R: Rng>(
    parent: &Entity,
    ctx: &ReproductionContext,
    births: &[Birth],
    rng: &mut R,
) -> (f64, f64) {
    let cfg = &ctx.config.reproduction;
    let (w, h) = (
        f64::from(ctx.config.world.width),
        f64::from(ctx.config.world.height),
    );
    let (px, py) = parent.pos();
    for _ in 0..cfg.spawn_attempts {
        let x = (px + (rng.gen::<f64>() - 0.5) * cfg.spawn_offset)
            .clamp(cfg.spawn_margin, w - cfg.spawn_margin);
        let y = (py + (rng.gen::<f64>() - 0.5) * cfg.spawn_offset)
            .clamp(cfg.spawn_margin, h - cfg.spawn_margin);
        if is_clear(x, y, parent.id(), ctx, births) {
            return (x, y);
        }
    }
    (px, py)
}

/// Plans this tick's births from the flagged candidates.
///
/// Candidates are taken by energy descending, ties by id descending. Each
/// birth is checked against the limiter and against the ceilings, counting
/// live entities plus everything already queued.
pub fn plan_reproduction<R: Rng>(
    ctx: &ReproductionContext,
    limiter: &mut ReproductionLimiter,
    next_id: &mut EntityId,
    rng: &mut R,
) -> Vec<Birth> {
    let mut births = Vec::new();
    if ctx.mode != GameMode::Eco {
        return births;
    }

    let mut candidates: Vec<usize> = ctx
        .entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.intel.wants_to_reproduce && is_eligible(e, ctx.now_ms, ctx.mode, ctx.config))
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        return births;
    }
    candidates.sort_by(|&a, &b| {
        let (ea, eb) = (&ctx.entities[a], &ctx.entities[b]);
        eb.metabolism
            .energy
            .total_cmp(&ea.metabolism.energy)
            .then_with(|| eb.id().cmp(&ea.id()))
    });

    let (mut counts, mut total) = occupancy(ctx.entities, ctx.pending);
    let cfg = &ctx.config.reproduction;

    for idx in candidates {
        if !limiter.allows(ctx.config) {
            tracing::debug!(deferred = %ctx.entities[idx].id(), "Birth limit reached");
            break;
        }
        let parent = &ctx.entities[idx];
        if !has_room(ctx.config, &counts, total, parent.kind()) {
            continue;
        }

        let (x, y) = find_child_position(parent, ctx, &births, rng);
        let parent_energy = cfg.parent_energy_fraction * parent.metabolism.max_energy;
        let mut split = parent.clone();
        split.metabolism.energy = parent_energy;

        let child = create_offspring_with_rng(*next_id, &split, x, y, ctx.now_ms, ctx.config, rng);
        *next_id += 1;

        counts[parent.kind().index()] += 1;
        total += 1;
        limiter.record();
        births.push(Birth {
            parent_idx: idx,
            parent: parent.id(),
            parent_energy,
            parent_last_reproduction_ms: ctx.now_ms + rng.gen_range(0.0..=cfg.cooldown_jitter_ms),
            child,
        });
    }
    births
}

/// Applies the parent side of each birth and returns the children to queue.
pub fn apply_births(entities: &mut [Entity], births: Vec<Birth>, now_ms: f64, config: &AppConfig) -> Vec<Entity> {
    births
        .into_iter()
        .filter_map(|birth| {
            let parent = entities.get_mut(birth.parent_idx)?;
            if parent.id() != birth.parent {
                return None;
            }
            parent.metabolism.energy = birth.parent_energy;
            parent.metabolism.last_reproduction_ms = birth.parent_last_reproduction_ms;
            parent.metabolism.reproduction_count += 1;
            parent.intel.wants_to_reproduce = false;
            parent.status.reproducing_until_ms = now_ms + config.reproduction.reproducing_effect_ms;
            parent.status.refresh(now_ms);
            Some(birth.child)
        })
        .collect()
}

/// Moves queued children into the world, re-checking the ceilings.
///
/// Returns the ids admitted; children that no longer fit are dropped.
pub fn admit_births(entities: &mut Vec<Entity>, pending: Vec<Entity>, config: &AppConfig) -> Vec<EntityId> {
    let (mut counts, mut total) = occupancy(entities, &[]);
    let mut admitted = Vec::with_capacity(pending.len());
    for child in pending {
        if !has_room(config, &counts, total, child.kind()) {
            tracing::debug!(child = child.id(), kind = %child.kind(), "Dropped queued birth at ceiling");
            continue;
        }
        counts[child.kind().index()] += 1;
        total += 1;
        admitted.push(child.id());
        entities.push(child);
    }
    admitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::create_entity_with_rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn breeder(kind: EntityKind, id: EntityId, x: f64, energy: f64) -> Entity {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(id);
        let mut e = create_entity_with_rng(id, kind, x, 400.0, 0.0, &config, &mut rng);
        e.metabolism.energy = energy;
        e.intel.wants_to_reproduce = true;
        e
    }

    fn plan(entities: &[Entity], config: &AppConfig, limiter: &mut ReproductionLimiter, now_ms: f64) -> Vec<Birth> {
        let mut grid = SpatialHash::new(config.world.cell_size, config.world.width, config.world.height);
        grid.build(entities);
        let ctx = ReproductionContext {
            config,
            mode: GameMode::Eco,
            entities,
            pending: &[],
            grid: &grid,
            now_ms,
        };
        let mut next_id = 1000;
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        plan_reproduction(&ctx, limiter, &mut next_id, &mut rng)
    }

    #[test]
    fn test_eligibility_gates() {
        let config = AppConfig::default();
        let bug = breeder(EntityKind::Bug, 1, 100.0, 56.0);
        assert!(is_eligible(&bug, 5000.0, GameMode::Eco, &config));
        assert!(!is_eligible(&bug, 4999.0, GameMode::Eco, &config));
        assert!(!is_eligible(&bug, 5000.0, GameMode::Rps, &config));
        let hungry = breeder(EntityKind::Bug, 2, 100.0, 55.0);
        assert!(!is_eligible(&hungry, 5000.0, GameMode::Eco, &config));
        let grass = breeder(EntityKind::Grass, 3, 100.0, 50.0);
        assert!(!is_eligible(&grass, 5000.0, GameMode::Eco, &config));
    }

    #[test]
    fn test_limiter_window_resets_after_a_second() {
        let config = AppConfig::default();
        let mut limiter = ReproductionLimiter::new(0.0);
        for t in 0..3 {
            limiter.begin_tick(t as f64 * 100.0);
            limiter.record();
            limiter.record();
            assert!(!limiter.allows(&config));
        }
        limiter.begin_tick(400.0);
        assert!(!limiter.allows(&config), "six births already this second");
        limiter.begin_tick(1000.0);
        assert!(limiter.allows(&config));
        assert_eq!(limiter.births_in_window, 0);
    }

    #[test]
    fn test_birth_updates_parent_and_child() {
        let config = AppConfig::default();
        let entities = vec![breeder(EntityKind::Frog, 1, 300.0, 90.0)];
        let mut limiter = ReproductionLimiter::new(6000.0);
        let births = plan(&entities, &config, &mut limiter, 6000.0);
        assert_eq!(births.len(), 1);

        let child = &births[0].child;
        assert_eq!(child.kind(), EntityKind::Frog);
        assert_eq!(child.identity.parent_id, Some(1));
        assert!((child.metabolism.energy - 31.5).abs() < 1e-9);
        let ratio = child.metabolism.decay_rate / entities[0].metabolism.decay_rate;
        assert!((0.95..=1.05).contains(&ratio));
        let (cx, cy) = child.pos();
        assert!((cx - 300.0).abs() <= 50.0 && (cy - 400.0).abs() <= 50.0);

        let mut entities = entities;
        let children = apply_births(&mut entities, births, 6000.0, &config);
        assert_eq!(children.len(), 1);
        let parent = &entities[0];
        assert!((parent.metabolism.energy - 31.5).abs() < 1e-9);
        assert_eq!(parent.metabolism.reproduction_count, 1);
        assert!(parent.metabolism.last_reproduction_ms >= 6000.0);
        assert!(parent.metabolism.last_reproduction_ms <= 8000.0);
        assert!(parent.status.reproducing);
    }

    #[test]
    fn test_per_tick_limit_prefers_most_energetic() {
        let config = AppConfig::default();
        let entities = vec![
            breeder(EntityKind::Bug, 1, 100.0, 60.0),
            breeder(EntityKind::Bug, 2, 300.0, 70.0),
            breeder(EntityKind::Bug, 3, 500.0, 65.0),
            breeder(EntityKind::Bug, 4, 700.0, 70.0),
        ];
        let mut limiter = ReproductionLimiter::new(6000.0);
        let births = plan(&entities, &config, &mut limiter, 6000.0);
        let parents: Vec<_> = births.iter().map(|b| b.parent).collect();
        assert_eq!(parents, vec![4, 2]);
    }

    #[test]
    fn test_per_type_ceiling_blocks_birth() {
        let mut config = AppConfig::default();
        config.world.max_per_type = 2;
        config.balance.min_counts = [0; EntityKind::COUNT];
        let entities = vec![
            breeder(EntityKind::Snake, 1, 100.0, 110.0),
            breeder(EntityKind::Snake, 2, 600.0, 110.0),
        ];
        let mut limiter = ReproductionLimiter::new(6000.0);
        assert!(plan(&entities, &config, &mut limiter, 6000.0).is_empty());
    }

    #[test]
    fn test_children_keep_their_distance() {
        let config = AppConfig::default();
        let entities = vec![
            breeder(EntityKind::Bug, 1, 600.0, 70.0),
            breeder(EntityKind::Bug, 2, 610.0, 70.0),
        ];
        let mut limiter = ReproductionLimiter::new(6000.0);
        let births = plan(&entities, &config, &mut limiter, 6000.0);
        assert_eq!(births.len(), 2);
        for b in &births {
            let (x, y) = b.child.pos();
            let is_fallback = entities.iter().any(|p| p.id() == b.parent && p.pos() == (x, y));
            if !is_fallback {
                for e in entities.iter().filter(|e| e.id() != b.parent) {
                    assert!(e.distance_sq_to(x, y) >= 2500.0);
                }
            }
        }
    }

    #[test]
    fn test_admission_rechecks_ceiling() {
        let mut config = AppConfig::default();
        config.world.max_total = 2;
        config.world.max_per_type = 2;
        config.balance.min_counts = [0; EntityKind::COUNT];
        let mut entities = vec![breeder(EntityKind::Bug, 1, 100.0, 10.0)];
        let pending = vec![
            breeder(EntityKind::Bug, 2, 200.0, 10.0),
            breeder(EntityKind::Bug, 3, 300.0, 10.0),
        ];
        let admitted = admit_births(&mut entities, pending, &config);
        assert_eq!(admitted, vec![2]);
        assert_eq!(entities.len(), 2);
    }
}
