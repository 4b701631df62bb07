pub use yumyum_data::{EntityId, EntityKind, PopulationStats, StatsSample};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Starvation,
    Eaten,
    AreaClear,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpawnSource {
    Manual,
    Rain,
    Balance,
    Growth,
}

/// Something worth telling an observer about, emitted by `World::update`
/// and the player commands.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event")]
pub enum LiveEvent {
    Birth {
        id: EntityId,
        parent_id: EntityId,
        kind: EntityKind,
        tick: u64,
        time_ms: f64,
    },
    Death {
        id: EntityId,
        kind: EntityKind,
        cause: DeathCause,
        tick: u64,
        time_ms: f64,
    },
    Predation {
        predator: EntityId,
        prey: EntityId,
        predator_kind: EntityKind,
        prey_kind: EntityKind,
        energy_gained: f64,
        tick: u64,
        time_ms: f64,
    },
    Conversion {
        id: EntityId,
        from: EntityKind,
        to: EntityKind,
        tick: u64,
        time_ms: f64,
    },
    Spawn {
        id: EntityId,
        kind: EntityKind,
        source: SpawnSource,
        tick: u64,
        time_ms: f64,
    },
    Plague {
        infected: usize,
        tick: u64,
        time_ms: f64,
    },
}

impl LiveEvent {
    pub fn to_message(&self) -> String {
        match self {
            LiveEvent::Birth { id, kind, .. } => format!("{} #{} born", kind.emoji(), id),
            LiveEvent::Death { id, kind, cause, .. } => {
                let how = match cause {
                    DeathCause::Starvation => "starved",
                    DeathCause::Eaten => "was eaten",
                    DeathCause::AreaClear => "was wiped out by a meteor",
                };
                format!("{} #{} {}", kind.emoji(), id, how)
            }
            LiveEvent::Predation {
                predator_kind,
                prey_kind,
                energy_gained,
                ..
            } => format!(
                "{} ate {} (+{:.0})",
                predator_kind.emoji(),
                prey_kind.emoji(),
                energy_gained
            ),
            LiveEvent::Conversion { from, to, .. } => {
                format!("{} turned into {}", from.emoji(), to.emoji())
            }
            LiveEvent::Spawn { kind, source, .. } => match source {
                SpawnSource::Manual => format!("{} placed", kind.emoji()),
                SpawnSource::Rain => format!("🌧️ {} sprouted", kind.emoji()),
                SpawnSource::Balance => format!("⚖️ {} reintroduced", kind.emoji()),
                SpawnSource::Growth => format!("{} grew", kind.emoji()),
            },
            LiveEvent::Plague { infected, .. } => format!("☠️ Plague weakened {} animals", infected),
        }
    }
}

/// Rolling population time series, oldest first.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatsHistory {
    samples: VecDeque<StatsSample>,
    capacity: usize,
}

impl StatsHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, time_ms: f64, stats: &PopulationStats) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(StatsSample {
            stats: stats.clone(),
            time_ms,
        });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&StatsSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatsSample> {
        self.samples.iter()
    }
}

/// Appends live events to a JSON-lines file.
pub struct HistoryLogger {
    live_file: Option<BufWriter<File>>,
}

impl HistoryLogger {
    pub fn new_at(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            live_file: Some(BufWriter::new(file)),
        })
    }

    pub fn new_dummy() -> Self {
        Self { live_file: None }
    }

    pub fn log_event(&mut self, event: &LiveEvent) -> anyhow::Result<()> {
        if let Some(ref mut file) = self.live_file {
            let json = serde_json::to_string(event)?;
            writeln!(file, "{}", json)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        if let Some(ref mut file) = self.live_file {
            file.flush()?;
        }
        Ok(())
    }
}
