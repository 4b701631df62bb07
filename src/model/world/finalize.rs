use crate::model::history::LiveEvent;
use crate::model::snapshot::{EntitySnapshot, WorldSnapshot};
use crate::model::world::World;
use std::collections::HashSet;
use std::sync::Arc;
use yumyum_core::systems::stats::{self, StatsContext};
use yumyum_core::systems::{build_id_map, interaction};
use yumyum_data::EntityId;

impl World {
    pub fn finalize_tick(&mut self, events: &[LiveEvent]) {
        self.purge_removed();
        self.refresh_stats();

        if self.effect.is_some_and(|fx| !fx.is_active(self.time_ms)) {
            self.effect = None;
        }

        self.ctx.frame_count += 1;
        let ui_due = self.ctx.frame_count % self.config.ui_update_interval == 0;
        self.publish_snapshots(ui_due);

        if self.is_running()
            && self
                .ctx
                .take_sample_slot(self.time_ms, self.config.stats_sample_interval_ms)
        {
            self.history.push(self.time_ms, &self.pop_stats);
        }

        self.record_events(events);
    }

    /// Drops soft-deleted entities and every target still pointing at them.
    ///
    /// Returns the ids that were dropped.
    pub(super) fn purge_removed(&mut self) -> HashSet<EntityId> {
        let gone: HashSet<EntityId> = self
            .entities
            .iter()
            .filter(|e| !e.is_live())
            .map(|e| e.id())
            .collect();
        if !gone.is_empty() {
            self.entities.retain(|e| e.is_live());
            interaction::clear_dangling_targets(&mut self.entities, &gone);
        }
        self.id_map = build_id_map(&self.entities);
        gone
    }

    pub(super) fn refresh_stats(&mut self) {
        stats::update_population_stats(StatsContext {
            stats: &mut self.pop_stats,
            entities: &self.entities,
            total_reproductions: self.ctx.total_reproductions,
        });
    }

    /// Rebuilds the per-tick snapshot, and the throttled one when `ui` is set.
    pub(super) fn publish_snapshots(&mut self, ui: bool) {
        let snapshot = Arc::new(WorldSnapshot {
            tick: self.tick,
            time_ms: self.time_ms,
            mode: self.mode,
            running: self.is_running(),
            ramp: self.ramp.value,
            width: self.width,
            height: self.height,
            entities: self
                .live_entities()
                .map(|e| EntitySnapshot::from_entity(e, self.mode))
                .collect(),
            stats: self.pop_stats.clone(),
            effect: self.effect,
        });
        if ui {
            self.cached_ui_snapshot = Arc::clone(&snapshot);
        }
        self.cached_snapshot = snapshot;
    }

    pub(super) fn record_events(&mut self, events: &[LiveEvent]) {
        for event in events {
            tracing::trace!(message = %event.to_message(), "Live event");
            if let Err(e) = self.logger.log_event(event) {
                tracing::warn!("Failed to write live event: {}", e);
            }
        }
    }
}
