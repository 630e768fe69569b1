//! Per-unit combat micro
//!
//! Turns a squad fight into one command per unit. Melee units dive, ranged
//! units stutter-step on weapon cooldown, splash casters pick fire points
//! from the nova field and other casters stay safe behind the army.

use glam::Vec2;
use ordered_float::OrderedFloat;

use crate::core::config::MicroConfig;
use crate::core::types::{towards, GameSeconds};
use crate::tactics::commands::{Ability, CommandKind, UnitCommand};
use crate::tactics::nova::NovaPlanner;
use crate::tactics::services::{PathingGrid, WorldQuery};
use crate::units::{CombatRole, Unit};

/// Shared inputs for micro of one squad
pub struct MicroContext<'a> {
    pub now: GameSeconds,
    /// Enemies near the squad, memory and ignored kinds already removed
    pub enemies: &'a [&'a Unit],
    /// Squad members
    pub friends: &'a [&'a Unit],
    /// Where to go when there is nothing to hit
    pub fallback: Vec2,
    /// Hysteresis verdict for the squad
    pub engage: bool,
    pub pathing: &'a dyn PathingGrid,
    pub world: &'a dyn WorldQuery,
}

/// Enemies this unit has a weapon for and, on the ground, can reach
pub fn attackable<'a>(unit: &Unit, enemies: &[&'a Unit], pathing: &dyn PathingGrid) -> Vec<&'a Unit> {
    enemies
        .iter()
        .copied()
        .filter(|e| {
            if e.flying {
                unit.can_attack_air()
            } else {
                unit.can_attack_ground() && pathing.is_pathable(e.position)
            }
        })
        .collect()
}

/// Target on high ground we cannot see
fn is_blind_uphill(unit: &Unit, target: &Unit, world: &dyn WorldQuery, config: &MicroConfig) -> bool {
    !world.is_position_visible(target.position)
        && world.terrain_height(target.position) - world.terrain_height(unit.position) > config.blind_uphill_height
}

fn nearest<'a>(from: Vec2, units: &[&'a Unit]) -> Option<&'a Unit> {
    units
        .iter()
        .copied()
        .min_by_key(|u| (OrderedFloat(u.position.distance_squared(from)), u.id))
}

/// Weakest in-range target, priority kinds first
fn pick_in_range<'a>(unit: &Unit, targets: &[&'a Unit]) -> Option<&'a Unit> {
    let in_range: Vec<&Unit> = targets
        .iter()
        .copied()
        .filter(|t| unit.in_attack_range_of(t))
        .collect();
    let weakest = |units: &[&'a Unit]| -> Option<&'a Unit> {
        units
            .iter()
            .copied()
            .min_by_key(|t| (OrderedFloat(t.health_fraction()), t.id))
    };
    let priority: Vec<&Unit> = in_range
        .iter()
        .copied()
        .filter(|t| t.kind.is_priority_target())
        .collect();
    weakest(&priority).or_else(|| weakest(&in_range))
}

/// Get out of danger
///
/// Moves to the nearest safe spot when standing in enemy range, otherwise
/// steps back from the nearest enemy.
pub fn keep_safe(unit: &Unit, ctx: &MicroContext<'_>, config: &MicroConfig) -> UnitCommand {
    if !ctx.pathing.is_safe(unit.position, unit.flying) {
        let radius = unit.ground_range.max(unit.air_range) + config.stutter_distance;
        let spot = ctx.pathing.find_safe_spot(unit.position, radius, unit.flying);
        return UnitCommand::move_to(unit.id, spot);
    }
    match nearest(unit.position, ctx.enemies) {
        Some(enemy) => {
            let back = towards(unit.position, enemy.position, -config.stutter_distance);
            UnitCommand::move_to(unit.id, back)
        }
        None => UnitCommand::hold(unit.id),
    }
}

fn micro_ranged(unit: &Unit, ctx: &MicroContext<'_>, config: &MicroConfig) -> UnitCommand {
    let targets: Vec<&Unit> = attackable(unit, ctx.enemies, ctx.pathing)
        .into_iter()
        .filter(|t| !is_blind_uphill(unit, t, ctx.world, config))
        .collect();

    if !unit.weapon_ready {
        return keep_safe(unit, ctx, config);
    }
    if let Some(target) = pick_in_range(unit, &targets) {
        return UnitCommand::attack(unit.id, target.id);
    }
    if !ctx.engage {
        return keep_safe(unit, ctx, config);
    }
    match nearest(unit.position, &targets) {
        Some(enemy) => UnitCommand::attack_move(unit.id, enemy.position),
        // Only blind targets left, or nothing we can shoot
        None if !ctx.enemies.is_empty() => keep_safe(unit, ctx, config),
        None => UnitCommand::attack_move(unit.id, ctx.fallback),
    }
}

fn micro_melee(unit: &Unit, ctx: &MicroContext<'_>, config: &MicroConfig) -> UnitCommand {
    if !ctx.engage {
        return keep_safe(unit, ctx, config);
    }
    let targets = attackable(unit, ctx.enemies, ctx.pathing);
    if let Some(target) = pick_in_range(unit, &targets) {
        return UnitCommand::attack(unit.id, target.id);
    }
    let priority: Vec<&Unit> = targets
        .iter()
        .copied()
        .filter(|t| t.kind.is_priority_target())
        .collect();
    match nearest(unit.position, &priority) {
        Some(target) => UnitCommand::attack_move(unit.id, target.position),
        None => UnitCommand::attack_move(unit.id, ctx.fallback),
    }
}

fn micro_caster(
    unit: &Unit,
    ctx: &MicroContext<'_>,
    nova: &mut NovaPlanner,
    config: &MicroConfig,
) -> UnitCommand {
    if unit.kind.is_splash_caster() {
        if ctx.engage && unit.ability_ready {
            let targets: Vec<&Unit> = ctx
                .enemies
                .iter()
                .copied()
                .filter(|e| !e.flying && !e.is_worker())
                .collect();
            if let Some(point) = nova.plan(unit, &targets, ctx.friends, ctx.now, config) {
                return UnitCommand::new(
                    unit.id,
                    CommandKind::Cast {
                        ability: Ability::PurificationNova,
                        target: point,
                    },
                );
            }
        }
        return keep_safe(unit, ctx, config);
    }

    if !ctx.engage || !ctx.pathing.is_safe(unit.position, unit.flying) {
        return keep_safe(unit, ctx, config);
    }
    UnitCommand::attack_move(unit.id, ctx.fallback)
}

/// Command for one unit in a fighting squad
pub fn micro_unit(
    unit: &Unit,
    ctx: &MicroContext<'_>,
    nova: &mut NovaPlanner,
    config: &MicroConfig,
) -> UnitCommand {
    match unit.combat_role(config.melee_range_threshold) {
        CombatRole::Ranged => micro_ranged(unit, ctx, config),
        CombatRole::Melee => micro_melee(unit, ctx, config),
        CombatRole::Caster => micro_caster(unit, ctx, nova, config),
        CombatRole::Support => UnitCommand::move_to(unit.id, ctx.fallback),
    }
}
