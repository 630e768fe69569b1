//! Collaborator interfaces
//!
//! The engine calls these synchronously during a tick. Implementations live
//! elsewhere in the agent; `crate::sandbox` has in-memory ones.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::tactics::outcome::FightOutcome;
use crate::units::{Alliance, RoleBook, Unit, UnitId, UnitRole};

/// Which units a range query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFilter {
    pub alliance: Alliance,
    /// Include remembered snapshots outside vision
    pub include_memory: bool,
    pub include_structures: bool,
}

impl QueryFilter {
    /// Visible enemy units and structures
    pub fn visible_enemies() -> Self {
        Self {
            alliance: Alliance::Enemy,
            include_memory: false,
            include_structures: true,
        }
    }

    /// Own mobile units
    pub fn own_army() -> Self {
        Self {
            alliance: Alliance::Own,
            include_memory: false,
            include_structures: false,
        }
    }
}

/// Spatial grouping of same-role units, rebuilt every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub id: u64,
    pub role: UnitRole,
    pub members: Vec<UnitId>,
    pub position: Vec2,
    /// Largest group of the role
    pub main: bool,
}

/// Spatial index over the current snapshot
pub trait SpatialQuery {
    /// Ids within `radius` of each centre, one list per centre
    fn units_in_range(&self, centers: &[Vec2], radius: f32, filter: QueryFilter) -> Vec<Vec<UnitId>>;

    /// Cluster the members of `role` into squads
    ///
    /// Can fail when the role book and the unit set disagree mid-tick.
    fn squads(&self, role: UnitRole, radius: f32, roles: &dyn RoleBook) -> Result<Vec<Squad>>;
}

/// Options passed to the fight estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateOptions {
    /// Treat workers as non-combatants
    pub workers_do_no_damage: bool,
    /// Account for positioning and time to close distance
    pub timing_adjust: bool,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            workers_do_no_damage: true,
            timing_adjust: true,
        }
    }
}

/// Combat simulation collaborator
pub trait FightEstimator {
    fn estimate(&self, own: &[&Unit], enemy: &[&Unit], options: EstimateOptions) -> FightOutcome;
}

/// Pathing and danger grids
pub trait PathingGrid {
    fn is_pathable(&self, point: Vec2) -> bool;

    /// No enemy weapon reaches this point on the given layer
    fn is_safe(&self, point: Vec2, flying: bool) -> bool;

    /// Closest safe point within `radius`, or `from` when none exists
    fn find_safe_spot(&self, from: Vec2, radius: f32, flying: bool) -> Vec2;
}

/// Raw world queries
pub trait WorldQuery {
    fn is_position_visible(&self, point: Vec2) -> bool;

    fn terrain_height(&self, point: Vec2) -> f32;
}

/// Borrowed collaborators for one tick
pub struct Services<'a> {
    pub spatial: &'a dyn SpatialQuery,
    pub estimator: &'a dyn FightEstimator,
    pub pathing: &'a dyn PathingGrid,
    pub world: &'a dyn WorldQuery,
    pub roles: &'a mut dyn RoleBook,
}
