//! Squad movement with no enemy army nearby
//!
//! While crossing the map, units that run ahead of the squad or drift away
//! from it hold position so the rest can catch up.

use glam::Vec2;
use ordered_float::OrderedFloat;

use crate::core::config::MicroConfig;
use crate::core::types::towards;
use crate::tactics::commands::UnitCommand;
use crate::units::Unit;

/// Inputs for moving one squad
pub struct MoveOrder<'a> {
    pub members: &'a [&'a Unit],
    pub center: Vec2,
    pub destination: Vec2,
    /// Own start location, for casters trailing behind
    pub home: Vec2,
    /// Enemy structures close enough to be worth a detour
    pub nearby_structures: &'a [&'a Unit],
}

/// Whether a unit should wait for the squad
///
/// True when it is further along toward the destination than the centre by
/// more than the lead distance, or too far from the centre.
pub fn should_wait(unit: Vec2, center: Vec2, destination: Vec2, config: &MicroConfig) -> bool {
    let ahead = center.distance(destination) - unit.distance(destination);
    ahead > config.cohesion_lead_distance || unit.distance(center) > config.cohesion_spread_distance
}

/// Commands for a squad with nothing to fight
pub fn move_squad(order: &MoveOrder<'_>, config: &MicroConfig) -> Vec<UnitCommand> {
    let structure = order
        .nearby_structures
        .iter()
        .min_by_key(|s| (OrderedFloat(s.position.distance_squared(order.center)), s.id))
        .map(|s| s.position);
    let crossing = order.center.distance(order.destination) > config.cohesion_engage_distance;

    order
        .members
        .iter()
        .map(|unit| {
            if unit.kind.is_splash_caster() {
                let trail = towards(order.center, order.home, config.caster_trail_offset);
                return UnitCommand::move_to(unit.id, trail);
            }
            if let Some(target) = structure {
                return UnitCommand::attack_move(unit.id, target);
            }
            if crossing && should_wait(unit.position, order.center, order.destination, config) {
                return UnitCommand::hold(unit.id);
            }
            UnitCommand::attack_move(unit.id, order.destination)
        })
        .collect()
}
