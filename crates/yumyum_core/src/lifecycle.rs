use crate::config::AppConfig;
use rand::Rng;
use std::f64::consts::TAU;
use yumyum_data::{Entity, EntityId, EntityKind, Identity, Intel, Metabolism, Physics, Status};

/// Multiplier drawn uniformly from `[1 - variance, 1 + variance]`.
pub fn variance_factor<R: Rng>(rng: &mut R, variance: f64) -> f64 {
    1.0 + rng.gen_range(-1.0..=1.0) * variance
}

/// Builds a fresh entity of `kind` at `(x, y)`.
///
/// Animals start at the configured initial energy, grass starts full. Every
/// new entity is invincible for the configured window and heads in a random
/// direction at its kind's speed.
pub fn create_entity_with_rng<R: Rng>(
    id: EntityId,
    kind: EntityKind,
    x: f64,
    y: f64,
    now_ms: f64,
    config: &AppConfig,
    rng: &mut R,
) -> Entity {
    let profile = config.species.profile(kind);
    let angle = rng.gen_range(0.0..TAU);
    let energy = if kind.is_grass() {
        profile.max_energy
    } else {
        config.metabolism.initial_energy.min(profile.max_energy)
    };
    let decay_rate = profile.decay_rate * variance_factor(rng, config.metabolism.decay_variance);

    let mut status = Status {
        created_ms: now_ms,
        eating_until_ms: 0.0,
        reproducing_until_ms: 0.0,
        invincible_until_ms: now_ms + config.effects.invincibility_ms,
        removing: false,
        invincible: false,
        eating: false,
        reproducing: false,
    };
    status.refresh(now_ms);

    Entity {
        identity: Identity {
            id,
            kind,
            parent_id: None,
        },
        physics: Physics {
            x,
            y,
            vx: angle.cos() * profile.speed,
            vy: angle.sin() * profile.speed,
            size: profile.size,
            sight_range: profile.sight_range,
        },
        metabolism: Metabolism {
            energy,
            max_energy: profile.max_energy,
            decay_rate,
            last_update_ms: now_ms,
            last_eat_ms: None,
            last_reproduction_ms: now_ms,
            reproduction_count: 0,
        },
        intel: Intel::default(),
        status,
    }
}

/// Builds the offspring of `parent` at `(x, y)`.
///
/// The child shares the parent's post-split energy, inherits a slightly
/// varied decay rate and gets its own jittered next-eligible breeding time.
pub fn create_offspring_with_rng<R: Rng>(
    id: EntityId,
    parent: &Entity,
    x: f64,
    y: f64,
    now_ms: f64,
    config: &AppConfig,
    rng: &mut R,
) -> Entity {
    let mut child = create_entity_with_rng(id, parent.kind(), x, y, now_ms, config, rng);
    child.identity.parent_id = Some(parent.id());
    child.metabolism.energy = parent.metabolism.energy.min(child.metabolism.max_energy);
    child.metabolism.decay_rate = parent.metabolism.decay_rate
        * variance_factor(rng, config.reproduction.decay_inheritance_variance);
    child.metabolism.last_reproduction_ms =
        now_ms + rng.gen_range(0.0..=config.reproduction.cooldown_jitter_ms);
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_grass_starts_full_and_still() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let grass = create_entity_with_rng(1, EntityKind::Grass, 10.0, 20.0, 0.0, &config, &mut rng);
        assert_eq!(grass.metabolism.energy, 50.0);
        assert_eq!(grass.metabolism.decay_rate, 0.0);
        assert_eq!((grass.physics.vx, grass.physics.vy), (0.0, 0.0));
        assert!(grass.status.invincible);
    }

    #[test]
    fn test_animal_profile_and_decay_variance() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for id in 0..50 {
            let eagle = create_entity_with_rng(id, EntityKind::Eagle, 0.0, 0.0, 0.0, &config, &mut rng);
            assert_eq!(eagle.metabolism.energy, 50.0);
            assert_eq!(eagle.metabolism.max_energy, 130.0);
            assert!(eagle.metabolism.decay_rate >= 0.028 * 0.9 - 1e-12);
            assert!(eagle.metabolism.decay_rate <= 0.028 * 1.1 + 1e-12);
            let speed = eagle.physics.vx.hypot(eagle.physics.vy);
            assert!((speed - 1.2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_offspring_inherits_from_parent() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut parent = create_entity_with_rng(7, EntityKind::Frog, 100.0, 100.0, 0.0, &config, &mut rng);
        parent.metabolism.energy = 31.5;
        let child = create_offspring_with_rng(8, &parent, 120.0, 90.0, 1000.0, &config, &mut rng);
        assert_eq!(child.identity.parent_id, Some(7));
        assert_eq!(child.kind(), EntityKind::Frog);
        assert_eq!(child.metabolism.energy, 31.5);
        let ratio = child.metabolism.decay_rate / parent.metabolism.decay_rate;
        assert!((0.95 - 1e-12..=1.05 + 1e-12).contains(&ratio));
        assert!(child.metabolism.last_reproduction_ms >= 1000.0);
        assert!(child.metabolism.last_reproduction_ms <= 3000.0);
    }
}
