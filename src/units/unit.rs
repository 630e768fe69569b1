//! Read-only unit snapshots
//!
//! A `Unit` is what the game reports for one unit on one tick. The engine
//! never mutates it; it only issues commands that reference its id.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::units::kind::UnitKind;

/// Game-assigned unit tag, stable for the unit's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u64);

/// Which side a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alliance {
    Own,
    Enemy,
    Neutral,
}

/// How a unit fights, derived from its weapons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatRole {
    Melee,
    Ranged,
    /// Weaponless energy users and splash casters
    Caster,
    /// Weaponless transports and detectors
    Support,
}

/// One unit as observed this tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub alliance: Alliance,
    pub position: Vec2,
    pub health: f32,
    pub health_max: f32,
    pub shield: f32,
    pub shield_max: f32,
    pub energy: f32,
    pub movement_speed: f32,
    pub ground_range: f32,
    pub air_range: f32,
    pub radius: f32,
    pub flying: bool,
    /// Weapon off cooldown
    pub weapon_ready: bool,
    /// Signature ability off cooldown (splash casters)
    pub ability_ready: bool,
    pub cloaked: bool,
    pub burrowed: bool,
    /// Seconds since last observed, 0.0 while in vision
    pub age: f32,
}

impl Unit {
    /// Create a full-health, in-vision unit with its kind's defaults
    pub fn new(id: UnitId, kind: UnitKind, alliance: Alliance, position: Vec2) -> Self {
        let p = kind.profile();
        Self {
            id,
            kind,
            alliance,
            position,
            health: p.max_health,
            health_max: p.max_health,
            shield: p.max_shield,
            shield_max: p.max_shield,
            energy: if p.has_energy { 50.0 } else { 0.0 },
            movement_speed: p.movement_speed,
            ground_range: p.ground_range,
            air_range: p.air_range,
            radius: kind.radius(),
            flying: p.flying,
            weapon_ready: true,
            ability_ready: true,
            cloaked: false,
            burrowed: matches!(kind, UnitKind::LurkerBurrowed),
            age: 0.0,
        }
    }

    /// Scale health and shield to a fraction of their maximum
    pub fn with_health_fraction(mut self, fraction: f32) -> Self {
        let f = fraction.clamp(0.0, 1.0);
        self.health = self.health_max * f;
        self.shield = self.shield_max * f;
        self
    }

    /// Mark as a remembered snapshot last seen `seconds` ago
    pub fn with_age(mut self, seconds: f32) -> Self {
        self.age = seconds.max(0.0);
        self
    }

    pub fn with_weapon_ready(mut self, ready: bool) -> Self {
        self.weapon_ready = ready;
        self
    }

    /// Combined health and shield as a fraction of maximum
    pub fn health_fraction(&self) -> f32 {
        let max = self.health_max + self.shield_max;
        if max <= 0.0 {
            return 0.0;
        }
        ((self.health + self.shield) / max).clamp(0.0, 1.0)
    }

    /// Army value weighted by remaining health
    pub fn army_value(&self) -> f32 {
        self.kind.army_value() * self.health_fraction()
    }

    pub fn supply(&self) -> f32 {
        self.kind.supply()
    }

    pub fn is_memory(&self) -> bool {
        self.age > 0.0
    }

    pub fn is_structure(&self) -> bool {
        self.kind.is_structure()
    }

    pub fn is_worker(&self) -> bool {
        self.kind.is_worker()
    }

    pub fn can_attack_ground(&self) -> bool {
        self.ground_range > 0.0
    }

    pub fn can_attack_air(&self) -> bool {
        self.air_range > 0.0
    }

    pub fn can_attack(&self) -> bool {
        self.can_attack_ground() || self.can_attack_air()
    }

    /// Whether this unit has a weapon for the target's layer
    pub fn can_target(&self, target: &Unit) -> bool {
        if target.flying {
            self.can_attack_air()
        } else {
            self.can_attack_ground()
        }
    }

    /// Weapon range against the target's layer
    pub fn range_against(&self, target: &Unit) -> f32 {
        if target.flying {
            self.air_range
        } else {
            self.ground_range
        }
    }

    /// Target is within weapon range, measured edge to edge
    pub fn in_attack_range_of(&self, target: &Unit) -> bool {
        if !self.can_target(target) {
            return false;
        }
        let reach = self.range_against(target) + self.radius + target.radius;
        self.position.distance_squared(target.position) <= reach * reach
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Classify how this unit fights
    pub fn combat_role(&self, melee_range_threshold: f32) -> CombatRole {
        if self.kind.is_splash_caster() {
            return CombatRole::Caster;
        }
        if !self.can_attack() {
            return if self.kind.profile().has_energy && !self.flying {
                CombatRole::Caster
            } else {
                CombatRole::Support
            };
        }
        if self.can_attack_ground() && self.ground_range <= melee_range_threshold {
            CombatRole::Melee
        } else {
            CombatRole::Ranged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(kind: UnitKind, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(1), kind, Alliance::Own, Vec2::new(x, y))
    }

    #[test]
    fn test_new_unit_is_full_health() {
        let u = unit(UnitKind::Stalker, 0.0, 0.0);
        assert_eq!(u.health_fraction(), 1.0);
        assert_eq!(u.army_value(), UnitKind::Stalker.army_value());
        assert!(!u.is_memory());
    }

    #[test]
    fn test_health_fraction_scales_value() {
        let u = unit(UnitKind::Immortal, 0.0, 0.0).with_health_fraction(0.5);
        assert!((u.army_value() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_combat_roles() {
        assert_eq!(unit(UnitKind::Zealot, 0.0, 0.0).combat_role(3.0), CombatRole::Melee);
        assert_eq!(unit(UnitKind::Stalker, 0.0, 0.0).combat_role(3.0), CombatRole::Ranged);
        assert_eq!(unit(UnitKind::Disruptor, 0.0, 0.0).combat_role(3.0), CombatRole::Caster);
        assert_eq!(unit(UnitKind::HighTemplar, 0.0, 0.0).combat_role(3.0), CombatRole::Caster);
        assert_eq!(unit(UnitKind::Observer, 0.0, 0.0).combat_role(3.0), CombatRole::Support);
        // Air-only attackers fight at range
        assert_eq!(unit(UnitKind::Corruptor, 0.0, 0.0).combat_role(3.0), CombatRole::Ranged);
    }

    #[test]
    fn test_range_is_edge_to_edge() {
        let stalker = unit(UnitKind::Stalker, 0.0, 0.0);
        let near = Unit::new(UnitId(2), UnitKind::Zealot, Alliance::Enemy, Vec2::new(6.9, 0.0));
        let far = Unit::new(UnitId(3), UnitKind::Zealot, Alliance::Enemy, Vec2::new(7.1, 0.0));
        assert!(stalker.in_attack_range_of(&near));
        assert!(!stalker.in_attack_range_of(&far));
    }

    #[test]
    fn test_ground_only_cannot_hit_air() {
        let zealot = unit(UnitKind::Zealot, 0.0, 0.0);
        let oracle = Unit::new(UnitId(2), UnitKind::Oracle, Alliance::Enemy, Vec2::new(0.5, 0.0));
        assert!(!zealot.can_target(&oracle));
        assert!(!zealot.in_attack_range_of(&oracle));
    }
}
