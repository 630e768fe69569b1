//! Splash caster targeting
//!
//! A nova hits everything around its landing point, friend or foe. Fire
//! points are scored on a field of enemy value minus double-weighted
//! friendly value, and recent landing zones are blocked so two casters do
//! not waste shots on the same spot.

use glam::Vec2;

use crate::core::config::MicroConfig;
use crate::core::types::GameSeconds;
use crate::units::Unit;

/// Value of landing a nova at `point`
///
/// Each unit contributes its army value scaled linearly from 1 at the
/// centre to 0 at the field radius.
pub fn field_value(point: Vec2, enemies: &[&Unit], friends: &[&Unit], config: &MicroConfig) -> f32 {
    let radius = config.nova_radius + 0.5;
    let falloff = |u: &&Unit| {
        let d = u.position.distance(point);
        if d < radius {
            u.army_value() * (1.0 - d / radius)
        } else {
            0.0
        }
    };
    let enemy: f32 = enemies.iter().map(falloff).sum();
    let friendly: f32 = friends.iter().map(falloff).sum();
    enemy - config.nova_friendly_weight * friendly
}

#[derive(Debug, Clone, Copy)]
struct Exclusion {
    center: Vec2,
    expires: GameSeconds,
}

/// Tracks recent nova landing zones
#[derive(Debug, Clone, Default)]
pub struct NovaPlanner {
    exclusions: Vec<Exclusion>,
}

impl NovaPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_exclusions(&self) -> usize {
        self.exclusions.len()
    }

    /// Drop zones whose shot has landed
    pub fn prune(&mut self, now: GameSeconds) {
        self.exclusions.retain(|e| e.expires > now);
    }

    fn is_excluded(&self, point: Vec2, config: &MicroConfig) -> bool {
        let r_sq = config.nova_exclusion_radius * config.nova_exclusion_radius;
        self.exclusions
            .iter()
            .any(|e| e.center.distance_squared(point) < r_sq)
    }

    /// Best fire point for `caster`, blocking it for other casters
    ///
    /// Candidates are enemy positions within cast range. Returns `None` when
    /// no candidate is worth the shot.
    pub fn plan(
        &mut self,
        caster: &Unit,
        enemies: &[&Unit],
        friends: &[&Unit],
        now: GameSeconds,
        config: &MicroConfig,
    ) -> Option<Vec2> {
        let range_sq = config.nova_cast_range * config.nova_cast_range;
        let others: Vec<&Unit> = friends.iter().copied().filter(|f| f.id != caster.id).collect();

        let mut best: Option<(Vec2, f32)> = None;
        for enemy in enemies {
            let point = enemy.position;
            if caster.position.distance_squared(point) > range_sq || self.is_excluded(point, config) {
                continue;
            }
            let value = field_value(point, enemies, &others, config);
            match best {
                Some((_, v)) if v >= value => {}
                _ => best = Some((point, value)),
            }
        }

        let (point, value) = best?;
        if value < config.nova_min_value {
            return None;
        }
        tracing::debug!("Nova at ({:.1}, {:.1}) for value {:.1}", point.x, point.y, value);
        self.exclusions.push(Exclusion {
            center: point,
            expires: now + config.nova_exclusion_seconds,
        });
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Alliance, UnitId, UnitKind};

    fn unit(id: u64, kind: UnitKind, alliance: Alliance, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(id), kind, alliance, Vec2::new(x, y))
    }

    #[test]
    fn test_field_penalises_friends_double() {
        let config = MicroConfig::default();
        let foe = unit(1, UnitKind::Roach, Alliance::Enemy, 0.0, 0.0);
        let friend = unit(2, UnitKind::Zealot, Alliance::Own, 0.0, 0.0);
        let value = field_value(Vec2::ZERO, &[&foe], &[&friend], &config);
        assert!((value - (2.0 - 4.0)).abs() < 1e-5);
    }

    #[test]
    fn test_field_ignores_units_outside_radius() {
        let config = MicroConfig::default();
        let foe = unit(1, UnitKind::Roach, Alliance::Enemy, 5.0, 0.0);
        assert_eq!(field_value(Vec2::ZERO, &[&foe], &[], &config), 0.0);
    }

    #[test]
    fn test_plan_picks_clump_and_blocks_it() {
        let config = MicroConfig::default();
        let caster = unit(100, UnitKind::Disruptor, Alliance::Own, 0.0, 0.0);
        let clump: Vec<Unit> = (0..3)
            .map(|i| unit(i, UnitKind::Roach, Alliance::Enemy, 8.0 + 0.1 * i as f32, 0.0))
            .collect();
        let lone = unit(10, UnitKind::Roach, Alliance::Enemy, 0.0, 10.0);
        let mut enemies: Vec<&Unit> = clump.iter().collect();
        enemies.push(&lone);

        let mut planner = NovaPlanner::new();
        let shot = planner.plan(&caster, &enemies, &[&caster], 10.0, &config);
        let point = shot.expect("clump is worth a shot");
        assert!(point.distance(Vec2::new(8.1, 0.0)) < 0.2);

        // Same zone is blocked for a second caster
        let second = unit(101, UnitKind::Disruptor, Alliance::Own, 0.0, 1.0);
        assert_eq!(planner.plan(&second, &enemies, &[], 10.5, &config), None);

        planner.prune(12.2);
        assert_eq!(planner.active_exclusions(), 0);
    }

    #[test]
    fn test_plan_refuses_friendly_fire() {
        let config = MicroConfig::default();
        let caster = unit(100, UnitKind::Disruptor, Alliance::Own, 0.0, 0.0);
        let foes: Vec<Unit> = (0..3)
            .map(|i| unit(i, UnitKind::Roach, Alliance::Enemy, 8.0, 0.1 * i as f32))
            .collect();
        let friends: Vec<Unit> = (0..3)
            .map(|i| unit(20 + i, UnitKind::Zealot, Alliance::Own, 8.2, 0.1 * i as f32))
            .collect();
        let enemy_refs: Vec<&Unit> = foes.iter().collect();
        let friend_refs: Vec<&Unit> = friends.iter().collect();
        let mut planner = NovaPlanner::new();
        assert_eq!(planner.plan(&caster, &enemy_refs, &friend_refs, 0.0, &config), None);
    }
}
