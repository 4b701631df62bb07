//! Population top-up and natural grass spawning, plus the spawn placement
//! heuristics shared with the player commands.

use crate::config::AppConfig;
use crate::context::Tunables;
use crate::spatial_hash::SpatialHash;
use crate::systems::reproduction::{has_room, occupancy};
use rand::Rng;
use yumyum_data::{Entity, EntityKind, GameMode};

/// Share of the base grass chance that survives when auto-balance is off.
const NATURAL_GRASS_DAMPING: f64 = 0.3;
/// Share of the interval the grass timer is pulled back after a failed roll.
const GRASS_RETRY_FRACTION: f64 = 0.3;
/// Jitter of a distributed candidate, as a share of its cell.
const CELL_JITTER: f64 = 0.6;

/// Rectangle spawn heuristics place entities in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnArea {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl SpawnArea {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            width: f64::from(config.world.width),
            height: f64::from(config.world.height),
            margin: config.world.spawn_margin,
        }
    }

    #[inline]
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(self.margin, self.width - self.margin),
            y.clamp(self.margin, self.height - self.margin),
        )
    }

    pub fn random_point<R: Rng>(&self, rng: &mut R) -> (f64, f64) {
        self.clamp(rng.gen::<f64>() * self.width, rng.gen::<f64>() * self.height)
    }

    fn random_inner<R: Rng>(&self, rng: &mut R) -> (f64, f64) {
        (
            self.margin + rng.gen::<f64>() * (self.width - 2.0 * self.margin),
            self.margin + rng.gen::<f64>() * (self.height - 2.0 * self.margin),
        )
    }
}

/// What placement checks against.
pub struct PlacementContext<'a> {
    pub entities: &'a [Entity],
    pub grid: &'a SpatialHash,
    pub area: SpawnArea,
}

impl PlacementContext<'_> {
    /// True when no live entity and no excluded point lies within
    /// `min_distance` of `(x, y)`.
    pub fn is_clear(&self, x: f64, y: f64, min_distance: f64, exclusions: &[(f64, f64)]) -> bool {
        let min_sq = min_distance * min_distance;
        let radius = (min_distance / self.grid.cell_size).ceil().max(1.0) as u32;
        let mut clear = true;
        self.grid.query_callback(x, y, radius, |idx| {
            if clear {
                let e = &self.entities[idx];
                clear = !(e.is_live() && e.distance_sq_to(x, y) < min_sq);
            }
        });
        clear
            && exclusions.iter().all(|&(ex, ey)| {
                let (dx, dy) = (ex - x, ey - y);
                dx * dx + dy * dy >= min_sq
            })
    }
}

/// Rejection-samples a free spot around `center` (or around a random point),
/// widening the search window by 20 px per attempt. Falls back to an
/// unconstrained random position inside the margin.
pub fn find_safe_spawn_position<R: Rng>(
    ctx: &PlacementContext,
    min_distance: f64,
    max_attempts: usize,
    center: Option<(f64, f64)>,
    exclusions: &[(f64, f64)],
    rng: &mut R,
) -> (f64, f64) {
    let area = ctx.area;
    let (bx, by) = match center {
        Some((x, y)) => area.clamp(x, y),
        None => area.random_inner(rng),
    };
    for attempt in 0..max_attempts {
        let range = 30.0 + attempt as f64 * 20.0;
        let (x, y) = area.clamp(
            bx + (rng.gen::<f64>() - 0.5) * range,
            by + (rng.gen::<f64>() - 0.5) * range,
        );
        if ctx.is_clear(x, y, min_distance, exclusions) {
            return (x, y);
        }
    }
    area.random_point(rng)
}

/// Spreads `count` positions over the field.
///
/// The inset field is cut into a `ceil(sqrt(2n))`-column grid. Free cells are
/// tried in order, then at random, each candidate jittered inside its cell and
/// kept only if it clears live entities, `exclusions` and earlier picks.
pub fn find_distributed_spawn_positions<R: Rng>(
    ctx: &PlacementContext,
    count: usize,
    min_distance: f64,
    exclusions: &[(f64, f64)],
    config: &AppConfig,
    rng: &mut R,
) -> Vec<(f64, f64)> {
    let mut positions: Vec<(f64, f64)> = Vec::with_capacity(count);
    if count == 0 {
        return positions;
    }
    let area = ctx.area;
    let cols = ((count * 2) as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    let cell_w = (area.width - 2.0 * area.margin) / cols as f64;
    let cell_h = (area.height - 2.0 * area.margin) / rows as f64;
    let mut used = vec![false; cols * rows];
    let mut blocked: Vec<(f64, f64)> = exclusions.to_vec();

    for _ in 0..count {
        let mut found = None;
        for attempt in 0..config.balance.distributed_attempts {
            let cell = if attempt < cols * rows {
                if used[attempt] {
                    continue;
                }
                attempt
            } else {
                rng.gen_range(0..cols) + rng.gen_range(0..rows) * cols
            };
            let (cx, cy) = (cell % cols, cell / cols);
            let center_x = area.margin + (cx as f64 + 0.5) * cell_w;
            let center_y = area.margin + (cy as f64 + 0.5) * cell_h;
            let (x, y) = area.clamp(
                center_x + (rng.gen::<f64>() - 0.5) * cell_w * CELL_JITTER,
                center_y + (rng.gen::<f64>() - 0.5) * cell_h * CELL_JITTER,
            );
            if ctx.is_clear(x, y, min_distance, &blocked) {
                used[cell] = true;
                found = Some((x, y));
                break;
            }
        }
        let pos = found.unwrap_or_else(|| {
            find_safe_spawn_position(
                ctx,
                min_distance,
                config.balance.fallback_attempts,
                None,
                &blocked,
                rng,
            )
        });
        positions.push(pos);
        blocked.push(pos);
    }
    positions
}

/// A new entity the caller should create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
}

pub struct BalanceContext<'a> {
    pub config: &'a AppConfig,
    pub tunables: &'a Tunables,
    pub mode: GameMode,
    pub placement: PlacementContext<'a>,
    /// Children queued but not yet inserted; they count against ceilings.
    pub pending: &'a [Entity],
    pub now_ms: f64,
    pub last_meteor_ms: Option<f64>,
}

impl BalanceContext<'_> {
    fn meteor_cooldown(&self) -> bool {
        self.last_meteor_ms
            .is_some_and(|t| self.now_ms - t < self.config.balance.meteor_cooldown_ms)
    }
}

/// Tops up kinds that fell below their minimum count.
///
/// Kinds are visited from grass upward. Grass comes in batches of up to
/// `grass_batch` and is skipped past its soft cap; animals come one at a time.
/// The per-check total, the per-kind ceiling and the global ceiling all bound
/// the result.
pub fn plan_auto_balance<R: Rng>(ctx: &BalanceContext, rng: &mut R) -> Vec<SpawnRequest> {
    let mut requests = Vec::new();
    if !ctx.tunables.auto_balance || ctx.mode != GameMode::Eco || ctx.meteor_cooldown() {
        return requests;
    }
    let balance = &ctx.config.balance;
    let (mut counts, mut total) = occupancy(ctx.placement.entities, ctx.pending);
    if total >= ctx.config.world.max_total {
        return requests;
    }

    let mut recent: Vec<(f64, f64)> = Vec::new();
    for kind in EntityKind::ALL {
        if requests.len() >= balance.max_spawns_per_check {
            break;
        }
        let min_needed = ctx.tunables.min_counts[kind.index()];
        let current = counts[kind.index()];
        if min_needed == 0 || current >= min_needed {
            continue;
        }
        let (batch, spacing) = if kind.is_grass() {
            if current >= balance.grass_soft_cap {
                continue;
            }
            (balance.grass_batch, balance.grass_spacing)
        } else {
            (balance.animal_batch, balance.animal_spacing)
        };

        let room_kind = ctx.config.world.max_per_type.saturating_sub(current);
        let room_total = ctx.config.world.max_total.saturating_sub(total);
        let amount = (min_needed - current)
            .min(batch)
            .min(balance.max_spawns_per_check - requests.len())
            .min(room_kind)
            .min(room_total);
        if amount == 0 {
            continue;
        }

        let positions =
            find_distributed_spawn_positions(&ctx.placement, amount, spacing, &recent, ctx.config, rng);
        for (x, y) in positions {
            recent.push((x, y));
            requests.push(SpawnRequest { kind, x, y });
            counts[kind.index()] += 1;
            total += 1;
        }
    }
    if !requests.is_empty() {
        tracing::debug!(spawned = requests.len(), "Auto-balance top-up");
    }
    requests
}

/// Natural grass growth used when auto-balance is off.
///
/// Rolls at most once per interval; a failed roll pulls the timer back so the
/// next roll comes sooner.
pub fn plan_natural_grass<R: Rng>(
    ctx: &BalanceContext,
    last_spawn_ms: &mut f64,
    rng: &mut R,
) -> Option<SpawnRequest> {
    let growth = ctx.tunables.growth_rate;
    if ctx.tunables.auto_balance || ctx.mode != GameMode::Eco || growth <= 0.0 {
        return None;
    }
    let balance = &ctx.config.balance;
    let interval = balance.grass_spawn_interval_frames / growth
        * ctx.config.frame_ms()
        * ctx.tunables.time_scale.max(1.0)
        * 2.0;
    if ctx.now_ms - *last_spawn_ms < interval {
        return None;
    }

    let (counts, total) = occupancy(ctx.placement.entities, ctx.pending);
    if counts[EntityKind::Grass.index()] >= ctx.config.world.max_grass
        || !has_room(ctx.config, &counts, total, EntityKind::Grass)
    {
        return None;
    }

    if rng.gen::<f64>() < balance.grass_spawn_chance * growth * NATURAL_GRASS_DAMPING {
        let (x, y) = find_safe_spawn_position(
            &ctx.placement,
            ctx.config.events.placement_min_distance,
            balance.fallback_attempts,
            None,
            &[],
            rng,
        );
        *last_spawn_ms = ctx.now_ms;
        Some(SpawnRequest {
            kind: EntityKind::Grass,
            x,
            y,
        })
    } else {
        *last_spawn_ms = ctx.now_ms - interval * GRASS_RETRY_FRACTION;
        None
    }
}
