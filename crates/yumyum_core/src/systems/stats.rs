use yumyum_data::{Entity, EntityKind, PopulationStats};

pub struct StatsContext<'a> {
    pub stats: &'a mut PopulationStats,
    pub entities: &'a [Entity],
    pub total_reproductions: u64,
}

/// Live entities per kind.
pub fn count_by_kind(entities: &[Entity]) -> [usize; EntityKind::COUNT] {
    let mut counts = [0; EntityKind::COUNT];
    for e in entities.iter().filter(|e| e.is_live()) {
        counts[e.kind().index()] += 1;
    }
    counts
}

pub fn update_population_stats(ctx: StatsContext) {
    ctx.stats.counts = count_by_kind(ctx.entities);
    ctx.stats.total_entities = ctx.stats.counts.iter().sum();
    ctx.stats.total_reproductions = ctx.total_reproductions;

    let (sum, n) = ctx
        .entities
        .iter()
        .filter(|e| e.is_live() && !e.kind().is_grass())
        .fold((0.0, 0usize), |(sum, n), e| (sum + e.metabolism.energy, n + 1));
    ctx.stats.average_energy = if n == 0 {
        0
    } else {
        (sum / n as f64).round() as u32
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::lifecycle::create_entity_with_rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_stats_ignore_grass_and_removed() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut make = |id, kind, energy| {
            let mut e = create_entity_with_rng(id, kind, 0.0, 0.0, 0.0, &config, &mut rng);
            e.metabolism.energy = energy;
            e
        };
        let mut gone = make(4, EntityKind::Eagle, 1.0);
        gone.status.removing = true;
        let entities = vec![
            make(1, EntityKind::Grass, 50.0),
            make(2, EntityKind::Bug, 40.0),
            make(3, EntityKind::Frog, 45.0),
            gone,
        ];
        let mut stats = PopulationStats::default();
        update_population_stats(StatsContext {
            stats: &mut stats,
            entities: &entities,
            total_reproductions: 7,
        });
        assert_eq!(stats.counts, [1, 1, 1, 0, 0]);
        assert_eq!(stats.total_entities, 3);
        assert_eq!(stats.average_energy, 43);
        assert_eq!(stats.total_reproductions, 7);
    }

    #[test]
    fn test_empty_world_has_zero_average() {
        let mut stats = PopulationStats::default();
        update_population_stats(StatsContext {
            stats: &mut stats,
            entities: &[],
            total_reproductions: 0,
        });
        assert_eq!(stats.average_energy, 0);
        assert_eq!(stats.total_entities, 0);
    }
}
