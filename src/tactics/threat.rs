//! Threat assessment for enemy groups near friendly assets
//!
//! Scoring is pure: the same enemy and friendly snapshots always produce the
//! same record. It is recomputed every tick because health changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::config::ThreatConfig;
use crate::core::types::center_of;
use crate::units::Unit;

/// How the defence should answer a threat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseType {
    None,
    /// Small or low value group, a token response is enough
    Patrol,
    /// Raiders going for the economy
    Harassment,
    /// A real army
    Combat,
    /// Something is being killed right now
    Damage,
}

/// Scored threat from one enemy group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatRecord {
    pub threat_level: u32,
    pub threat_value: f32,
    pub required_response_units: usize,
    pub response_type: ResponseType,
    pub unit_count: usize,
    /// Share of harassment-type units in the group
    pub harassment_ratio: f32,
    pub damage_bonus: f32,
    pub centroid: Option<Vec2>,
    pub has_air: bool,
    pub has_ground: bool,
}

impl ThreatRecord {
    /// Record for an empty enemy set
    pub fn none() -> Self {
        Self {
            threat_level: 0,
            threat_value: 0.0,
            required_response_units: 0,
            response_type: ResponseType::None,
            unit_count: 0,
            harassment_ratio: 0.0,
            damage_bonus: 0.0,
            centroid: None,
            has_air: false,
            has_ground: false,
        }
    }

    pub fn is_threat(&self) -> bool {
        self.response_type != ResponseType::None
    }
}

/// Score a group of enemy units against friendly reference units
///
/// `friendly` holds the own structures and workers the enemy might be
/// hitting; townhalls among them anchor the distance multiplier.
pub fn assess_threat(enemies: &[&Unit], friendly: &[&Unit], config: &ThreatConfig) -> ThreatRecord {
    let Some(centroid) = center_of(enemies.iter().map(|u| u.position)) else {
        return ThreatRecord::none();
    };
    let unit_count = enemies.len();

    let mut value: f32 = enemies.iter().map(|u| u.army_value()).sum();

    let cluster_sq = config.cluster_radius * config.cluster_radius;
    let clustered = enemies
        .iter()
        .filter(|u| u.position.distance_squared(centroid) <= cluster_sq)
        .count();
    if clustered < config.cluster_min_units {
        value *= config.isolated_value_factor;
    }

    value *= distance_factor(centroid, friendly, config);

    let bonus = damage_bonus(enemies, friendly, config);
    value += bonus;

    let harassers = enemies.iter().filter(|u| u.kind.is_harasser()).count();
    let harassment_ratio = harassers as f32 / unit_count as f32;

    let (response_type, required, level) = if bonus > config.damage_bonus_threshold {
        (
            ResponseType::Damage,
            unit_count.div_ceil(2).clamp(1, 3),
            value.clamp(3.0, 6.0),
        )
    } else if harassment_ratio >= config.harassment_ratio && unit_count <= config.harassment_max_units {
        (ResponseType::Harassment, unit_count.clamp(2, 4), value.min(3.0))
    } else if unit_count > config.combat_min_units && value > config.combat_min_value {
        (
            ResponseType::Combat,
            ((value * 0.8) as usize).max(6),
            value.min(10.0),
        )
    } else {
        (ResponseType::Patrol, (unit_count / 2).clamp(1, 3), value.min(5.0))
    };

    ThreatRecord {
        threat_level: level.max(0.0) as u32,
        threat_value: value,
        required_response_units: required,
        response_type,
        unit_count,
        harassment_ratio,
        damage_bonus: bonus,
        centroid: Some(centroid),
        has_air: enemies.iter().any(|u| u.flying),
        has_ground: enemies.iter().any(|u| !u.flying),
    }
}

/// Urgency multiplier from the distance to the nearest own townhall
///
/// 1.0 when no townhall is known.
fn distance_factor(centroid: Vec2, friendly: &[&Unit], config: &ThreatConfig) -> f32 {
    let nearest = friendly
        .iter()
        .filter(|u| u.kind.is_townhall())
        .map(|u| u.position.distance(centroid))
        .fold(f32::INFINITY, f32::min);
    if !nearest.is_finite() {
        return 1.0;
    }
    (config.distance_factor_max - nearest / config.distance_falloff)
        .clamp(config.distance_factor_min, config.distance_factor_max)
}

/// Extra weight for enemies standing next to hurt structures or workers
pub fn damage_bonus(enemies: &[&Unit], friendly: &[&Unit], config: &ThreatConfig) -> f32 {
    let structures: Vec<&Unit> = friendly
        .iter()
        .copied()
        .filter(|u| u.is_structure() && u.health_fraction() < 1.0)
        .collect();
    let workers: Vec<&Unit> = friendly
        .iter()
        .copied()
        .filter(|u| u.is_worker() && u.health_fraction() < 1.0)
        .collect();
    if structures.is_empty() && workers.is_empty() {
        return 0.0;
    }

    let mut bonus = 0.0;
    for enemy in enemies {
        if within_strike(enemy, &structures, config.structure_strike_range, config.critical_structure_health) {
            bonus += config.critical_structure_bonus;
        }
        if within_strike(enemy, &workers, config.worker_strike_range, config.critical_worker_health) {
            bonus += config.critical_worker_bonus;
        }
        if within_strike(enemy, &structures, config.structure_strike_range, 1.0) {
            bonus += config.damaged_structure_bonus;
        }
        if within_strike(enemy, &workers, config.worker_strike_range, 1.0) {
            bonus += config.damaged_worker_bonus;
        }
    }
    bonus
}

/// Any asset below `max_health` within `range` of the enemy, edge to centre
fn within_strike(enemy: &Unit, assets: &[&Unit], range: f32, max_health: f32) -> bool {
    assets.iter().any(|a| {
        a.health_fraction() < max_health && enemy.position.distance(a.position) - a.radius <= range
    })
}

/// Global "under attack" flag with separate set and clear thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnderAttackLatch {
    active: bool,
}

impl UnderAttackLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Set and clear thresholds for the current posture
    pub fn thresholds(early_cheese: bool, config: &ThreatConfig) -> (u32, u32) {
        if early_cheese {
            (config.cheese_latch_high, config.cheese_latch_low)
        } else {
            (config.latch_high, config.latch_low)
        }
    }

    /// Feed one threat level; returns true when the flag flipped
    pub fn observe(&mut self, level: u32, early_cheese: bool, config: &ThreatConfig) -> bool {
        let (high, low) = Self::thresholds(early_cheese, config);
        let was = self.active;
        if self.active {
            if level < low {
                self.active = false;
            }
        } else if level >= high {
            self.active = true;
        }
        was != self.active
    }

    /// Clear once no threat is left anywhere
    pub fn reset(&mut self) -> bool {
        let was = self.active;
        self.active = false;
        was
    }
}

/// Whether a threat gets a defensive detachment
pub fn needs_defenders(record: &ThreatRecord, under_attack: bool, config: &ThreatConfig) -> bool {
    record.is_threat() && (under_attack || record.threat_level >= config.defend_level)
}

/// Whether a threat is big enough to pull the main army home
pub fn needs_main_army(record: &ThreatRecord, early_cheese: bool, config: &ThreatConfig) -> bool {
    let (high, _) = UnderAttackLatch::thresholds(early_cheese, config);
    record.threat_level >= config.main_army_redirect_level
        || (record.response_type == ResponseType::Combat
            && record.unit_count > config.main_army_combat_units)
        || record.threat_level >= high * 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Alliance, UnitId, UnitKind};

    fn enemy(id: u64, kind: UnitKind, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(id), kind, Alliance::Enemy, Vec2::new(x, y))
    }

    fn own(id: u64, kind: UnitKind, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(id), kind, Alliance::Own, Vec2::new(x, y))
    }

    #[test]
    fn test_empty_is_none() {
        let record = assess_threat(&[], &[], &ThreatConfig::default());
        assert_eq!(record.response_type, ResponseType::None);
        assert_eq!(record.threat_level, 0);
        assert_eq!(record.required_response_units, 0);
        assert!(!record.is_threat());
    }

    #[test]
    fn test_isolated_units_are_discounted() {
        let config = ThreatConfig::default();
        let a = enemy(1, UnitKind::Stalker, 0.0, 0.0);
        let b = enemy(2, UnitKind::Stalker, 20.0, 0.0);
        let c = enemy(3, UnitKind::Stalker, 40.0, 0.0);
        let scattered = assess_threat(&[&a, &b, &c], &[], &config);

        let d = enemy(4, UnitKind::Stalker, 19.0, 0.0);
        let e = enemy(5, UnitKind::Stalker, 20.0, 0.0);
        let f = enemy(6, UnitKind::Stalker, 21.0, 0.0);
        let massed = assess_threat(&[&d, &e, &f], &[], &config);

        assert!((scattered.threat_value - 3.75).abs() < 1e-4);
        assert!((massed.threat_value - 7.5).abs() < 1e-4);
    }

    #[test]
    fn test_distance_multiplier_ramps() {
        let config = ThreatConfig::default();
        let nexus = own(100, UnitKind::Nexus, 0.0, 0.0);
        let pack = |x: f32| {
            (0..4)
                .map(|i| enemy(i, UnitKind::Roach, x + i as f32 * 0.5, 0.0))
                .collect::<Vec<_>>()
        };
        let close = pack(0.0);
        let far = pack(60.0);
        let close_refs: Vec<&Unit> = close.iter().collect();
        let far_refs: Vec<&Unit> = far.iter().collect();

        let near_record = assess_threat(&close_refs, &[&nexus], &config);
        let far_record = assess_threat(&far_refs, &[&nexus], &config);
        // 4 roaches = 8 value, about 2x on top of the base, 0.5x far away
        assert!(near_record.threat_value > 15.0);
        assert!((far_record.threat_value - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_massed_army_is_combat() {
        let config = ThreatConfig::default();
        let units: Vec<Unit> = (0..5)
            .map(|i| enemy(i, UnitKind::Immortal, i as f32, 0.0))
            .collect();
        let refs: Vec<&Unit> = units.iter().collect();
        let record = assess_threat(&refs, &[], &config);
        assert_eq!(record.response_type, ResponseType::Combat);
        assert_eq!(record.threat_level, 10);
        assert_eq!(record.required_response_units, 16);
    }

    #[test]
    fn test_raiders_are_harassment() {
        let config = ThreatConfig::default();
        let a = enemy(1, UnitKind::Hellion, 0.0, 0.0);
        let b = enemy(2, UnitKind::Hellion, 1.0, 0.0);
        let record = assess_threat(&[&a, &b], &[], &config);
        assert_eq!(record.response_type, ResponseType::Harassment);
        assert_eq!(record.required_response_units, 2);
        assert!(record.threat_level <= 3);
    }

    #[test]
    fn test_damage_overrides_harassment() {
        let config = ThreatConfig::default();
        let pylon = own(100, UnitKind::Pylon, 0.0, 0.0).with_health_fraction(0.4);
        let a = enemy(1, UnitKind::Reaper, 2.0, 0.0);
        let b = enemy(2, UnitKind::Reaper, 30.0, 0.0);
        let record = assess_threat(&[&a, &b], &[&pylon], &config);
        assert_eq!(record.response_type, ResponseType::Damage);
        assert_eq!(record.required_response_units, 1);
        assert!(record.threat_level >= 3);
        assert!((record.damage_bonus - 4.5).abs() < 1e-4);
    }

    #[test]
    fn test_healthy_assets_give_no_bonus() {
        let config = ThreatConfig::default();
        let probe = own(100, UnitKind::Probe, 0.0, 0.0);
        let ling = enemy(1, UnitKind::Zergling, 0.5, 0.0);
        assert_eq!(damage_bonus(&[&ling], &[&probe], &config), 0.0);
    }

    #[test]
    fn test_critical_worker_bonus() {
        let config = ThreatConfig::default();
        let probe = own(100, UnitKind::Probe, 0.0, 0.0).with_health_fraction(0.2);
        let ling = enemy(1, UnitKind::Zergling, 1.0, 0.0);
        assert!((damage_bonus(&[&ling], &[&probe], &config) - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_latch_hysteresis() {
        let config = ThreatConfig::default();
        let mut latch = UnderAttackLatch::new();
        assert!(!latch.observe(4, false, &config));
        assert!(latch.observe(5, false, &config));
        assert!(latch.is_active());
        // Inside the band the flag holds
        assert!(!latch.observe(2, false, &config));
        assert!(latch.is_active());
        assert!(latch.observe(1, false, &config));
        assert!(!latch.is_active());
    }

    #[test]
    fn test_latch_cheese_thresholds() {
        let config = ThreatConfig::default();
        let mut latch = UnderAttackLatch::new();
        assert!(latch.observe(2, true, &config));
        assert!(latch.observe(0, true, &config));
    }

    #[test]
    fn test_main_army_needed_for_big_threats() {
        let config = ThreatConfig::default();
        let mut record = ThreatRecord::none();
        record.response_type = ResponseType::Patrol;
        record.threat_level = 4;
        assert!(!needs_main_army(&record, false, &config));
        record.threat_level = 8;
        assert!(needs_main_army(&record, false, &config));
        record.threat_level = 4;
        assert!(needs_main_army(&record, true, &config));
    }
}
