//! Attack target selection
//!
//! Picks the main force's destination while attacking. The cascade prefers
//! keeping the previous target, so repeated calls against an unchanged world
//! return the same point.

use glam::Vec2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::TargetingConfig;
use crate::core::types::{center_of, closest_index, GameSeconds};
use crate::tactics::services::WorldQuery;
use crate::tactics::snapshot::MapInfo;
use crate::units::Unit;

/// Which rule of the cascade produced a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRule {
    /// Previous target still sits on a live structure
    Sticky,
    /// Army is already on top of a structure
    Proximity,
    /// Massed enemy army
    EnemyArmy,
    /// Structure nearest the enemy natural
    Structure,
    /// Last structure position we knew about
    LastKnownStructure,
    /// Searching expansions
    Expansion,
    EnemySpawn,
    Previous,
}

/// Per-tick inputs to target selection
pub struct TargetInputs<'a> {
    pub now: GameSeconds,
    pub previous: Option<Vec2>,
    pub army_center: Option<Vec2>,
    pub enemy_structures: &'a [&'a Unit],
    /// Enemy army in vision
    pub enemy_army: &'a [&'a Unit],
    pub mineral_fields: &'a [Vec2],
    pub map: &'a MapInfo,
}

/// Round-robin over expansion locations, nearest to the enemy spawn first
#[derive(Debug, Clone, Default)]
pub struct ExpansionCycle {
    order: Vec<Vec2>,
    current: usize,
}

impl ExpansionCycle {
    pub fn new(expansions: &[Vec2], enemy_start: Vec2) -> Self {
        let mut order = expansions.to_vec();
        order.sort_by_key(|p| OrderedFloat(p.distance_squared(enemy_start)));
        Self { order, current: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn current(&self) -> Option<Vec2> {
        self.order.get(self.current).copied()
    }

    /// Base to search next
    ///
    /// Stays on the current base until it is in vision, then moves on to the
    /// next one nobody is looking at. When every base is visible, settles on
    /// the first that still has minerals, skipping confirmed empty ones.
    pub fn next(&mut self, world: &dyn WorldQuery, minerals: &[Vec2], config: &TargetingConfig) -> Option<Vec2> {
        let current = self.current()?;
        if !world.is_position_visible(current) {
            return Some(current);
        }

        let len = self.order.len();
        let unseen = (1..=len)
            .map(|offset| (self.current + offset) % len)
            .find(|&i| !world.is_position_visible(self.order[i]));
        if let Some(i) = unseen {
            self.current = i;
            return Some(self.order[i]);
        }

        let radius_sq = config.empty_base_mineral_radius * config.empty_base_mineral_radius;
        let stocked = (0..len)
            .map(|offset| (self.current + offset) % len)
            .find(|&i| {
                minerals
                    .iter()
                    .any(|m| m.distance_squared(self.order[i]) <= radius_sq)
            });
        if let Some(i) = stocked {
            self.current = i;
        }
        self.current()
    }
}

/// Sticky attack target selection
#[derive(Debug, Clone, Default)]
pub struct TargetSelector {
    cycle: ExpansionCycle,
    last_structure: Option<Vec2>,
}

impl TargetSelector {
    pub fn new(map: &MapInfo) -> Self {
        Self {
            cycle: ExpansionCycle::new(&map.expansion_locations, map.enemy_start),
            last_structure: None,
        }
    }

    pub fn last_structure(&self) -> Option<Vec2> {
        self.last_structure
    }

    /// Pick the attack destination for this tick
    pub fn select(
        &mut self,
        inputs: &TargetInputs<'_>,
        world: &dyn WorldQuery,
        config: &TargetingConfig,
    ) -> (Vec2, TargetRule) {
        let structures: Vec<Vec2> = inputs.enemy_structures.iter().map(|u| u.position).collect();

        if let Some(previous) = inputs.previous {
            let tolerance_sq = config.sticky_tolerance * config.sticky_tolerance;
            if structures.iter().any(|s| s.distance_squared(previous) <= tolerance_sq) {
                return (previous, TargetRule::Sticky);
            }
        }

        let candidate = closest_index(&structures, inputs.map.enemy_natural).map(|i| structures[i]);
        if let Some(structure) = candidate {
            self.last_structure = Some(structure);
            if let Some(center) = inputs.army_center {
                if center.distance_squared(structure) <= config.proximity_sticky_distance_sq {
                    return (structure, TargetRule::Proximity);
                }
            }
        }

        if let Some(center) = massed_army_center(inputs.enemy_army, config) {
            return (center, TargetRule::EnemyArmy);
        }

        if let Some(structure) = candidate {
            return (structure, TargetRule::Structure);
        }

        if let Some(last) = self.last_structure {
            // Seen empty: the structure is gone
            if world.is_position_visible(last) {
                self.last_structure = None;
            } else {
                return (last, TargetRule::LastKnownStructure);
            }
        }

        if let Some(base) = self.cycle.next(world, inputs.mineral_fields, config) {
            return (base, TargetRule::Expansion);
        }

        if inputs.now < config.enemy_spawn_cutoff_seconds {
            return (inputs.map.enemy_start, TargetRule::EnemySpawn);
        }
        match inputs.previous {
            Some(previous) => (previous, TargetRule::Previous),
            None => (inputs.map.enemy_start, TargetRule::EnemySpawn),
        }
    }
}

/// Centre of the enemy army if it is big and bunched up enough to chase
fn massed_army_center(army: &[&Unit], config: &TargetingConfig) -> Option<Vec2> {
    let fighters: Vec<&Unit> = army
        .iter()
        .copied()
        .filter(|u| !u.is_worker() && !u.is_structure() && !u.cloaked && !u.burrowed)
        .collect();
    let supply: f32 = fighters.iter().map(|u| u.supply()).sum();
    if supply < config.enemy_army_min_supply {
        return None;
    }

    let center = center_of(fighters.iter().map(|u| u.position))?;
    let radius_sq = config.enemy_cluster_radius * config.enemy_cluster_radius;
    let clustered: f32 = fighters
        .iter()
        .filter(|u| u.position.distance_squared(center) <= radius_sq)
        .map(|u| u.supply())
        .sum();
    (clustered >= config.enemy_cluster_min_supply).then_some(center)
}
