//! Base threat detection and defensive force allocation
//!
//! Each tick the enemies near our townhalls are grouped per base and scored.
//! Threats that warrant it get a detachment peeled off the main army, sized
//! to the threat's value. Defenders go back to the army once their base has
//! been quiet for several ticks in a row.

use ahash::{AHashMap, AHashSet};
use glam::Vec2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::{DefenseConfig, TacticsConfig};
use crate::core::types::{center_mass, closest_index};
use crate::tactics::services::{QueryFilter, Services, SpatialQuery};
use crate::tactics::snapshot::Snapshot;
use crate::tactics::state::EngineState;
use crate::tactics::threat::{assess_threat, needs_defenders, needs_main_army, ResponseType, ThreatRecord};
use crate::units::{RoleBook, Unit, UnitId, UnitRole};

/// Enemies gathered around one of our bases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseThreat {
    /// Townhall under threat
    pub base: UnitId,
    pub base_position: Vec2,
    /// Densest point of the enemy group
    pub location: Vec2,
    pub enemies: Vec<UnitId>,
    pub record: ThreatRecord,
}

/// Group visible enemies by the base they are closest to and score each group
pub fn detect_base_threats(
    snapshot: &Snapshot,
    spatial: &dyn SpatialQuery,
    config: &TacticsConfig,
) -> Vec<BaseThreat> {
    let bases = snapshot.own_townhalls();
    if bases.is_empty() {
        return Vec::new();
    }
    let centers: Vec<Vec2> = bases.iter().map(|b| b.position).collect();
    let hits = spatial.units_in_range(&centers, config.threat.base_threat_radius, QueryFilter::visible_enemies());

    let mut grouped: Vec<Vec<&Unit>> = vec![Vec::new(); bases.len()];
    let mut seen = AHashSet::new();
    for id in hits.into_iter().flatten() {
        if !seen.insert(id) {
            continue;
        }
        let Some(enemy) = snapshot.unit(id) else {
            tracing::debug!("Enemy {:?} left the snapshot before threat scoring", id);
            continue;
        };
        if enemy.kind.is_ignored() {
            continue;
        }
        if let Some(i) = closest_index(&centers, enemy.position) {
            grouped[i].push(enemy);
        }
    }

    let assets = snapshot.own_assets();
    bases
        .iter()
        .zip(grouped)
        .filter(|(_, enemies)| !enemies.is_empty())
        .map(|(base, enemies)| {
            let record = assess_threat(&enemies, &assets, &config.threat);
            let positions: Vec<Vec2> = enemies.iter().map(|u| u.position).collect();
            let location = center_mass(&positions, config.threat.center_mass_radius)
                .map(|(c, _)| c)
                .or(record.centroid)
                .unwrap_or(base.position);
            BaseThreat {
                base: base.id,
                base_position: base.position,
                location,
                enemies: enemies.iter().map(|u| u.id).collect(),
                record,
            }
        })
        .collect()
}

/// Defenders already answering a threat
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Committed {
    pub value: f32,
    pub units: usize,
}

/// Pick the units to send against one threat
///
/// `committed` describes who is already defending against it. The result is
/// never empty for a real threat while nothing is committed and any fighting
/// unit is available. Headcount limits count committed defenders too.
pub fn allocate_defenders(
    record: &ThreatRecord,
    location: Vec2,
    enemies: &[&Unit],
    available: &[&Unit],
    committed: Committed,
    config: &DefenseConfig,
) -> Vec<UnitId> {
    if !record.is_threat() {
        return Vec::new();
    }

    let fighters: Vec<&Unit> = available
        .iter()
        .copied()
        .filter(|u| u.can_attack() && u.movement_speed > 0.0 && !u.is_worker() && !u.is_structure())
        .collect();
    if fighters.is_empty() {
        return Vec::new();
    }

    if committed.value > 0.0 && committed.value >= record.threat_value * config.escalation_cap {
        return Vec::new();
    }

    let (has_air, has_ground) = if enemies.is_empty() {
        (record.has_air, record.has_ground)
    } else {
        (enemies.iter().any(|u| u.flying), enemies.iter().any(|u| !u.flying))
    };
    let pick = |keep: fn(&Unit) -> bool| {
        fighters
            .iter()
            .copied()
            .filter(|u| keep(u))
            .collect::<Vec<&Unit>>()
    };
    let matched = match (has_air, has_ground) {
        (true, false) => pick(Unit::can_attack_air),
        (false, true) => pick(Unit::can_attack_ground),
        _ => {
            let both = pick(|u| u.can_attack_air() && u.can_attack_ground());
            if both.is_empty() {
                // Ground-only units cannot touch the air half of the threat
                pick(Unit::can_attack_air)
            } else {
                both
            }
        }
    };
    let mut candidates = if matched.is_empty() { fighters } else { matched };

    if record.response_type == ResponseType::Damage {
        let wanted = record.required_response_units.max(1).saturating_sub(committed.units);
        candidates.sort_by_key(|u| (OrderedFloat(u.position.distance_squared(location)), u.id));
        return candidates.iter().take(wanted).map(|u| u.id).collect();
    }

    let target_value = (record.threat_value * config.value_margin).max(config.min_value_target);
    let needed = target_value - committed.value;
    if committed.value > 0.0 && needed <= 0.0 {
        return Vec::new();
    }
    let cap = record
        .required_response_units
        .clamp(1, config.max_defenders_per_threat.max(1))
        .saturating_sub(committed.units);

    candidates.sort_by_key(|u| {
        let score = u.position.distance_squared(location) - config.value_preference * u.kind.army_value();
        (OrderedFloat(score), u.id)
    });

    let mut picked = Vec::new();
    let mut value = 0.0;
    for unit in candidates {
        if picked.len() >= cap {
            break;
        }
        picked.push(unit.id);
        value += unit.army_value();
        if value >= needed {
            break;
        }
    }
    picked
}

/// What the defence pass did this tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefenseReport {
    pub threats: Vec<BaseThreat>,
    pub dispatched: Vec<UnitId>,
    pub released: Vec<UnitId>,
}

/// Tracks which defenders belong to which base
#[derive(Debug, Clone, Default)]
pub struct DefenseCoordinator {
    assignments: AHashMap<UnitId, Vec<UnitId>>,
    quiet_ticks: AHashMap<UnitId, u32>,
}

impl DefenseCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defenders currently assigned to a base
    pub fn defenders_of(&self, base: UnitId) -> &[UnitId] {
        self.assignments.get(&base).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn defender_count(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }

    /// Run threat detection, the under-attack latch, allocation and release
    pub fn update(
        &mut self,
        snapshot: &Snapshot,
        services: &mut Services<'_>,
        state: &mut EngineState,
        config: &TacticsConfig,
    ) -> DefenseReport {
        let early_cheese = snapshot.cheese_defense && snapshot.time < config.threat.cheese_window_seconds;
        let threats = detect_base_threats(snapshot, services.spatial, config);

        self.forget_dead(snapshot);

        state.begin_threat_pass();
        if threats.is_empty() && state.clear_threats() {
            tracing::info!("No longer under attack");
        }
        let observed = threats.iter().map(|t| (&t.record, t.location));
        if state.observe_threats(observed, early_cheese, &config.threat) {
            if state.under_attack() {
                let level = state.worst_threat().map_or(0, |t| t.threat_level);
                tracing::info!("Under attack at {} base(s): worst level {}", threats.len(), level);
            } else {
                tracing::info!("No longer under attack");
            }
        }
        for threat in &threats {
            if needs_main_army(&threat.record, early_cheese, &config.threat) {
                state.set_main_army_defending();
            }
        }

        let mut report = DefenseReport::default();
        for threat in &threats {
            self.quiet_ticks.insert(threat.base, 0);
            if !needs_defenders(&threat.record, state.under_attack(), &config.threat) {
                continue;
            }
            let sent = self.dispatch(threat, snapshot, services.roles, &config.defense);
            report.dispatched.extend(sent);
        }

        let threatened: AHashSet<UnitId> = threats.iter().map(|t| t.base).collect();
        report.released = self.release_quiet(&threatened, services.roles, &config.defense);
        report.threats = threats;
        report
    }

    fn dispatch(
        &mut self,
        threat: &BaseThreat,
        snapshot: &Snapshot,
        roles: &mut dyn RoleBook,
        config: &DefenseConfig,
    ) -> Vec<UnitId> {
        let defenders = snapshot.resolve(self.defenders_of(threat.base));
        let committed = Committed {
            value: defenders.iter().map(|u| u.army_value()).sum(),
            units: defenders.len(),
        };

        let army_ids = roles.units_with_role(UnitRole::Attacking);
        let available = snapshot.resolve(&army_ids);
        if available.len() < army_ids.len() {
            tracing::debug!(
                "{} army units missing from the snapshot, skipped",
                army_ids.len() - available.len()
            );
        }
        let enemies = snapshot.resolve(&threat.enemies);

        let sent = allocate_defenders(
            &threat.record,
            threat.location,
            &enemies,
            &available,
            committed,
            config,
        );
        if sent.is_empty() {
            return sent;
        }

        for &id in &sent {
            roles.assign_role(id, UnitRole::BaseDefender);
        }
        tracing::info!(
            "Sent {} defenders to base {:?} against {:?} threat (value {:.1}, committed {:.1})",
            sent.len(),
            threat.base,
            threat.record.response_type,
            threat.record.threat_value,
            committed.value
        );
        self.assignments
            .entry(threat.base)
            .or_default()
            .extend(sent.iter().copied());
        sent
    }

    /// Return defenders of bases that stayed quiet long enough
    fn release_quiet(
        &mut self,
        threatened: &AHashSet<UnitId>,
        roles: &mut dyn RoleBook,
        config: &DefenseConfig,
    ) -> Vec<UnitId> {
        let mut bases: Vec<UnitId> = self.assignments.keys().copied().collect();
        bases.sort();

        let mut released = Vec::new();
        for base in bases {
            if threatened.contains(&base) {
                continue;
            }
            let quiet = self.quiet_ticks.entry(base).or_insert(0);
            *quiet += 1;
            if *quiet < config.release_quiet_ticks {
                continue;
            }
            self.quiet_ticks.remove(&base);
            let Some(defenders) = self.assignments.remove(&base) else {
                continue;
            };
            for &id in &defenders {
                roles.assign_role(id, UnitRole::Attacking);
            }
            tracing::info!("Base {:?} quiet, {} defenders rejoin the army", base, defenders.len());
            released.extend(defenders);
        }
        released
    }

    fn forget_dead(&mut self, snapshot: &Snapshot) {
        for defenders in self.assignments.values_mut() {
            defenders.retain(|&id| snapshot.unit(id).is_some());
        }
        self.assignments.retain(|_, defenders| !defenders.is_empty());
        let assignments = &self.assignments;
        self.quiet_ticks.retain(|base, _| assignments.contains_key(base));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Alliance, UnitKind};

    fn own(id: u64, kind: UnitKind, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(id), kind, Alliance::Own, Vec2::new(x, y))
    }

    fn enemy(id: u64, kind: UnitKind, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(id), kind, Alliance::Enemy, Vec2::new(x, y))
    }

    fn record(response: ResponseType, value: f32, required: usize) -> ThreatRecord {
        let mut r = ThreatRecord::none();
        r.response_type = response;
        r.threat_value = value;
        r.required_response_units = required;
        r.threat_level = 4;
        r.has_ground = true;
        r
    }

    #[test]
    fn test_no_threat_allocates_nothing() {
        let stalker = own(1, UnitKind::Stalker, 0.0, 0.0);
        let sent = allocate_defenders(&ThreatRecord::none(), Vec2::ZERO, &[], &[&stalker], Committed::default(), &DefenseConfig::default());
        assert!(sent.is_empty());
    }

    #[test]
    fn test_damage_sends_closest() {
        let near = own(1, UnitKind::Zealot, 2.0, 0.0);
        let far = own(2, UnitKind::Immortal, 20.0, 0.0);
        let sent = allocate_defenders(
            &record(ResponseType::Damage, 3.0, 1),
            Vec2::ZERO,
            &[],
            &[&far, &near],
            Committed::default(),
            &DefenseConfig::default(),
        );
        assert_eq!(sent, vec![UnitId(1)]);
    }

    #[test]
    fn test_greedy_stops_at_value() {
        let units: Vec<Unit> = (0..6)
            .map(|i| own(i, UnitKind::Stalker, i as f32 * 2.0, 0.0))
            .collect();
        let refs: Vec<&Unit> = units.iter().collect();
        // Target value 4.4 needs two stalkers at 2.5 each
        let sent = allocate_defenders(
            &record(ResponseType::Patrol, 4.0, 3),
            Vec2::ZERO,
            &[],
            &refs,
            Committed::default(),
            &DefenseConfig::default(),
        );
        assert_eq!(sent, vec![UnitId(0), UnitId(1)]);
    }

    #[test]
    fn test_headcount_cap() {
        let units: Vec<Unit> = (0..6)
            .map(|i| own(i, UnitKind::Zergling, i as f32, 0.0))
            .collect();
        let refs: Vec<&Unit> = units.iter().collect();
        let sent = allocate_defenders(
            &record(ResponseType::Patrol, 50.0, 3),
            Vec2::ZERO,
            &[],
            &refs,
            Committed::default(),
            &DefenseConfig::default(),
        );
        assert_eq!(sent.len(), 3);
    }

    #[test]
    fn test_escalation_cap() {
        let stalker = own(1, UnitKind::Stalker, 0.0, 0.0);
        let sent = allocate_defenders(
            &record(ResponseType::Combat, 4.0, 6),
            Vec2::ZERO,
            &[],
            &[&stalker],
            Committed { value: 6.5, units: 2 },
            &DefenseConfig::default(),
        );
        assert!(sent.is_empty());
    }

    #[test]
    fn test_air_threat_prefers_anti_air() {
        let zealot = own(1, UnitKind::Zealot, 1.0, 0.0);
        let stalker = own(2, UnitKind::Stalker, 10.0, 0.0);
        let oracle = enemy(9, UnitKind::Oracle, 0.0, 0.0);
        let sent = allocate_defenders(
            &record(ResponseType::Harassment, 1.0, 1),
            Vec2::ZERO,
            &[&oracle],
            &[&zealot, &stalker],
            Committed::default(),
            &DefenseConfig::default(),
        );
        assert_eq!(sent, vec![UnitId(2)]);
    }

    #[test]
    fn test_capability_fallback() {
        let zealot = own(1, UnitKind::Zealot, 1.0, 0.0);
        let oracle = enemy(9, UnitKind::Oracle, 0.0, 0.0);
        let sent = allocate_defenders(
            &record(ResponseType::Harassment, 1.0, 1),
            Vec2::ZERO,
            &[&oracle],
            &[&zealot],
            Committed::default(),
            &DefenseConfig::default(),
        );
        assert_eq!(sent, vec![UnitId(1)]);
    }

    #[test]
    fn test_non_fighters_skipped() {
        let probe = own(1, UnitKind::Probe, 0.0, 0.0);
        let observer = own(2, UnitKind::Observer, 0.0, 0.0);
        let sent = allocate_defenders(
            &record(ResponseType::Patrol, 2.0, 1),
            Vec2::ZERO,
            &[],
            &[&probe, &observer],
            Committed::default(),
            &DefenseConfig::default(),
        );
        assert!(sent.is_empty());
    }

    #[test]
    fn test_damage_counts_committed_defenders() {
        let zealots: Vec<Unit> = (0..8)
            .map(|i| own(i, UnitKind::Zealot, 4.0 + i as f32, 0.0))
            .collect();
        let refs: Vec<&Unit> = zealots.iter().collect();
        let threat = record(ResponseType::Damage, 3.0, 1);
        let config = DefenseConfig::default();

        let first = allocate_defenders(&threat, Vec2::ZERO, &[], &refs, Committed::default(), &config);
        assert_eq!(first, vec![UnitId(0)]);

        let answered = Committed { value: 2.0, units: 1 };
        let again = allocate_defenders(&threat, Vec2::ZERO, &[], &refs[1..], answered, &config);
        assert!(again.is_empty());

        let mut bigger = threat.clone();
        bigger.required_response_units = 3;
        let topped_up = allocate_defenders(&bigger, Vec2::ZERO, &[], &refs[1..], answered, &config);
        assert_eq!(topped_up, vec![UnitId(1), UnitId(2)]);
    }

    #[test]
    fn test_headcount_cap_counts_committed() {
        let units: Vec<Unit> = (0..6)
            .map(|i| own(i, UnitKind::Zergling, i as f32, 0.0))
            .collect();
        let refs: Vec<&Unit> = units.iter().collect();
        let sent = allocate_defenders(
            &record(ResponseType::Patrol, 50.0, 3),
            Vec2::ZERO,
            &[],
            &refs,
            Committed { value: 1.0, units: 2 },
            &DefenseConfig::default(),
        );
        assert_eq!(sent.len(), 1);
    }

    #[test]
    fn test_mixed_threat_falls_back_to_anti_air() {
        let zealot = own(1, UnitKind::Zealot, 1.0, 0.0);
        let phoenix = own(2, UnitKind::Phoenix, 12.0, 0.0);
        let oracle = enemy(9, UnitKind::Oracle, 0.0, 0.0);
        let ling = enemy(10, UnitKind::Zergling, 0.0, 1.0);
        let sent = allocate_defenders(
            &record(ResponseType::Damage, 2.0, 1),
            Vec2::ZERO,
            &[&oracle, &ling],
            &[&zealot, &phoenix],
            Committed::default(),
            &DefenseConfig::default(),
        );
        assert_eq!(sent, vec![UnitId(2)]);
    }
}
