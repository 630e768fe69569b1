//! Defensive anchor placement
//!
//! Where the army waits while it is not attacking. The state machine owns
//! the cooldown; this module only picks a point.

use glam::Vec2;

use crate::core::config::StanceConfig;
use crate::core::types::{closest_index, towards, GamePhase, Race};
use crate::tactics::snapshot::MapInfo;
use crate::units::Unit;

/// Inputs for one anchor decision
pub struct AnchorInputs<'a> {
    pub phase: GamePhase,
    pub own_townhalls: &'a [&'a Unit],
    pub own_structures: &'a [&'a Unit],
    pub map: &'a MapInfo,
}

/// Pick the waiting position for the army
///
/// 1. Mid game or two bases: the base nearest the enemy, nudged forward.
/// 2. Gatekeeper wall: just behind it.
/// 3. Natural taken: in front of the natural.
/// 4. Main ramp: just inside it.
/// 5. Start location.
pub fn choose_anchor(inputs: &AnchorInputs<'_>, config: &StanceConfig) -> Vec2 {
    let map = inputs.map;

    if inputs.phase >= GamePhase::Mid || inputs.own_townhalls.len() >= 2 {
        let bases: Vec<Vec2> = inputs.own_townhalls.iter().map(|u| u.position).collect();
        return match closest_index(&bases, map.enemy_start) {
            Some(i) => towards(bases[i], map.enemy_start, config.anchor_offset),
            None => map.start_location,
        };
    }

    if let Some(gate) = map.gatekeeper_position {
        let behind = if map.enemy_race == Race::Protoss {
            map.start_location
        } else {
            map.own_natural
        };
        return towards(gate, behind, config.gatekeeper_offset);
    }

    let radius_sq = config.natural_structure_radius * config.natural_structure_radius;
    let natural_taken = inputs
        .own_structures
        .iter()
        .any(|s| s.position.distance_squared(map.own_natural) < radius_sq);
    if natural_taken {
        return towards(map.own_natural, map.enemy_start, config.anchor_offset);
    }

    match map.main_ramp_top {
        Some(ramp) => towards(ramp, map.start_location, config.anchor_offset),
        None => map.start_location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Alliance, UnitId, UnitKind};

    fn map() -> MapInfo {
        MapInfo {
            start_location: Vec2::new(20.0, 20.0),
            enemy_start: Vec2::new(120.0, 120.0),
            own_natural: Vec2::new(40.0, 20.0),
            enemy_natural: Vec2::new(100.0, 120.0),
            main_ramp_top: Some(Vec2::new(30.0, 30.0)),
            gatekeeper_position: None,
            expansion_locations: vec![],
            enemy_race: Race::Zerg,
        }
    }

    fn building(id: u64, kind: UnitKind, x: f32, y: f32) -> Unit {
        Unit::new(UnitId(id), kind, Alliance::Own, Vec2::new(x, y))
    }

    #[test]
    fn test_single_base_uses_ramp() {
        let map = map();
        let main = building(1, UnitKind::Nexus, 20.0, 20.0);
        let inputs = AnchorInputs {
            phase: GamePhase::Early,
            own_townhalls: &[&main],
            own_structures: &[&main],
            map: &map,
        };
        let anchor = choose_anchor(&inputs, &StanceConfig::default());
        assert!(anchor.distance(Vec2::new(30.0, 30.0)) < 3.01);
        assert!(anchor.distance(map.start_location) < Vec2::new(30.0, 30.0).distance(map.start_location));
    }

    #[test]
    fn test_two_bases_anchor_forward_base() {
        let map = map();
        let main = building(1, UnitKind::Nexus, 20.0, 20.0);
        let nat = building(2, UnitKind::Nexus, 40.0, 20.0);
        let inputs = AnchorInputs {
            phase: GamePhase::Early,
            own_townhalls: &[&main, &nat],
            own_structures: &[&main, &nat],
            map: &map,
        };
        let anchor = choose_anchor(&inputs, &StanceConfig::default());
        let expected = towards(nat.position, map.enemy_start, 3.0);
        assert!(anchor.distance(expected) < 1e-4);
    }

    #[test]
    fn test_gatekeeper_vs_protoss_backs_into_main() {
        let mut map = map();
        map.gatekeeper_position = Some(Vec2::new(30.0, 30.0));
        map.enemy_race = Race::Protoss;
        let inputs = AnchorInputs {
            phase: GamePhase::Early,
            own_townhalls: &[],
            own_structures: &[],
            map: &map,
        };
        let anchor = choose_anchor(&inputs, &StanceConfig::default());
        assert!(anchor.distance(towards(Vec2::new(30.0, 30.0), map.start_location, 4.0)) < 1e-4);
    }

    #[test]
    fn test_natural_structures_move_anchor_forward() {
        let map = map();
        let pylon = building(3, UnitKind::Pylon, 42.0, 22.0);
        let inputs = AnchorInputs {
            phase: GamePhase::Early,
            own_townhalls: &[],
            own_structures: &[&pylon],
            map: &map,
        };
        let anchor = choose_anchor(&inputs, &StanceConfig::default());
        assert!(anchor.distance(towards(map.own_natural, map.enemy_start, 3.0)) < 1e-4);
    }

    #[test]
    fn test_no_ramp_falls_back_to_start() {
        let mut map = map();
        map.main_ramp_top = None;
        let inputs = AnchorInputs {
            phase: GamePhase::Early,
            own_townhalls: &[],
            own_structures: &[],
            map: &map,
        };
        assert_eq!(choose_anchor(&inputs, &StanceConfig::default()), map.start_location);
    }
}
