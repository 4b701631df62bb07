use crate::model::config::AppConfig;
use crate::model::history::{HistoryLogger, StatsHistory};
use crate::model::snapshot::WorldSnapshot;
use crate::model::spatial_hash::SpatialHash;
use crate::model::world::World;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::Arc;
use yumyum_core::{AnimationRamp, Metrics, SimulationContext, Tunables};
use yumyum_data::{GameMode, PopulationStats};

impl World {
    /// Builds an empty, stopped world in ECO mode.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        Self::with_logger(config, HistoryLogger::new_dummy())
    }

    /// Like [`World::new`], appending every live event to `log_path`.
    pub fn new_at(config: AppConfig, log_path: &str) -> anyhow::Result<Self> {
        let logger = HistoryLogger::new_at(log_path)?;
        Self::with_logger(config, logger)
    }

    fn with_logger(config: AppConfig, logger: HistoryLogger) -> anyhow::Result<Self> {
        config.validate()?;
        let rng = if let Some(seed) = config.world.seed {
            ChaCha8Rng::seed_from_u64(seed)
        } else {
            ChaCha8Rng::from_entropy()
        };
        let (width, height) = (config.world.width, config.world.height);
        let mode = GameMode::default();
        let empty = Arc::new(WorldSnapshot::empty(width, height, mode));
        tracing::info!(
            width,
            height,
            seed = ?config.world.seed,
            fingerprint = %config.fingerprint(),
            "World created"
        );

        Ok(Self {
            width,
            height,
            tick: 0,
            time_ms: 0.0,
            mode,
            entities: Vec::new(),
            pending_births: Vec::new(),
            tunables: Tunables::from_config(&config),
            ramp: AnimationRamp::new(config.ramp_step),
            ctx: SimulationContext::new(0.0),
            pop_stats: PopulationStats::default(),
            history: StatsHistory::new(config.stats_history_len),
            effect: None,
            logger,
            metrics: Metrics::new(),
            rng,
            spatial_hash: SpatialHash::new(config.world.cell_size, width, height),
            id_map: HashMap::new(),
            next_id: 1,
            cached_snapshot: Arc::clone(&empty),
            cached_ui_snapshot: empty,
            config,
        })
    }
}
