//! In-memory world collaborators
//!
//! Open rectangular field with optional hills. Vision comes from own units,
//! danger from enemy weapon ranges. Rebuilt from a snapshot every tick.

use ahash::AHashMap;
use glam::Vec2;

use crate::core::error::Result;
use crate::core::types::center_of;
use crate::spatial::SparseHashGrid;
use crate::tactics::services::{PathingGrid, QueryFilter, SpatialQuery, Squad, WorldQuery};
use crate::tactics::snapshot::Snapshot;
use crate::units::{Alliance, RoleBook, Unit, UnitId, UnitRole};

/// Sight radius of every own unit
const SIGHT_RANGE: f32 = 11.0;
/// Extra margin added to enemy weapon range for the danger test
const DANGER_MARGIN: f32 = 1.0;
/// Directions sampled when searching for a safe spot
const SAFE_SPOT_DIRECTIONS: usize = 16;

#[derive(Debug, Clone, Copy)]
struct Hill {
    center: Vec2,
    radius: f32,
    height: f32,
}

/// Sandbox implementation of the spatial, pathing and world services
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    size: Vec2,
    base_height: f32,
    hills: Vec<Hill>,
    grid: SparseHashGrid,
    units: AHashMap<UnitId, Unit>,
    eyes: Vec<Vec2>,
}

impl SandboxWorld {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            base_height: 10.0,
            hills: Vec::new(),
            grid: SparseHashGrid::new(8.0),
            units: AHashMap::new(),
            eyes: Vec::new(),
        }
    }

    /// Add a raised plateau
    pub fn with_hill(mut self, center: Vec2, radius: f32, height: f32) -> Self {
        self.hills.push(Hill { center, radius, height });
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Re-index the units of a snapshot
    pub fn sync(&mut self, snapshot: &Snapshot) {
        self.units = snapshot.units().iter().map(|u| (u.id, u.clone())).collect();
        self.grid.rebuild(snapshot.units().iter().map(|u| (u.id, u.position)));
        self.eyes = snapshot.own_units().map(|u| u.position).collect();
    }

    fn matches(unit: &Unit, filter: QueryFilter) -> bool {
        unit.alliance == filter.alliance
            && (filter.include_memory || !unit.is_memory())
            && (filter.include_structures || !unit.is_structure())
    }

    /// Greedy single-linkage clustering of a set of units
    fn cluster(members: &[&Unit], radius: f32) -> Vec<Vec<UnitId>> {
        let radius_sq = radius * radius;
        let mut assigned = vec![false; members.len()];
        let mut clusters = Vec::new();

        for seed in 0..members.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut cluster = vec![seed];
            let mut cursor = 0;
            while cursor < cluster.len() {
                let from = members[cluster[cursor]].position;
                for (j, other) in members.iter().enumerate() {
                    if !assigned[j] && other.position.distance_squared(from) <= radius_sq {
                        assigned[j] = true;
                        cluster.push(j);
                    }
                }
                cursor += 1;
            }
            let mut ids: Vec<UnitId> = cluster.iter().map(|&i| members[i].id).collect();
            ids.sort();
            clusters.push(ids);
        }
        clusters
    }
}

impl SpatialQuery for SandboxWorld {
    fn units_in_range(&self, centers: &[Vec2], radius: f32, filter: QueryFilter) -> Vec<Vec<UnitId>> {
        centers
            .iter()
            .map(|&center| {
                self.grid
                    .query_radius(center, radius)
                    .into_iter()
                    .filter(|id| self.units.get(id).is_some_and(|u| Self::matches(u, filter)))
                    .collect()
            })
            .collect()
    }

    fn squads(&self, role: UnitRole, radius: f32, roles: &dyn RoleBook) -> Result<Vec<Squad>> {
        let ids = roles.units_with_role(role);
        let members: Vec<&Unit> = ids.iter().filter_map(|id| self.units.get(id)).collect();
        if members.len() < ids.len() {
            tracing::debug!("{} {:?} units not in the world, skipped", ids.len() - members.len(), role);
        }

        let clusters = Self::cluster(&members, radius);
        let largest = clusters
            .iter()
            .enumerate()
            .max_by_key(|(i, c)| (c.len(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i);

        Ok(clusters
            .into_iter()
            .enumerate()
            .map(|(i, ids)| {
                let position = center_of(ids.iter().filter_map(|id| self.units.get(id)).map(|u| u.position))
                    .unwrap_or(Vec2::ZERO);
                Squad {
                    // Smallest member id keeps the key stable while the squad holds together
                    id: ids.first().map(|id| id.0).unwrap_or_default(),
                    role,
                    members: ids,
                    position,
                    main: Some(i) == largest,
                }
            })
            .collect())
    }
}

impl PathingGrid for SandboxWorld {
    fn is_pathable(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.size.x && point.y <= self.size.y
    }

    fn is_safe(&self, point: Vec2, flying: bool) -> bool {
        !self.units.values().any(|u| {
            if u.alliance != Alliance::Enemy || u.is_memory() {
                return false;
            }
            let range = if flying { u.air_range } else { u.ground_range };
            if range <= 0.0 {
                return false;
            }
            let reach = range + u.radius + DANGER_MARGIN;
            u.position.distance_squared(point) <= reach * reach
        })
    }

    fn find_safe_spot(&self, from: Vec2, radius: f32, flying: bool) -> Vec2 {
        let mut step = 1.0;
        while step <= radius {
            for i in 0..SAFE_SPOT_DIRECTIONS {
                let angle = i as f32 / SAFE_SPOT_DIRECTIONS as f32 * std::f32::consts::TAU;
                let candidate = from + Vec2::from_angle(angle) * step;
                if (flying || self.is_pathable(candidate)) && self.is_safe(candidate, flying) {
                    return candidate;
                }
            }
            step += 1.0;
        }
        from
    }
}

impl WorldQuery for SandboxWorld {
    fn is_position_visible(&self, point: Vec2) -> bool {
        let sight_sq = SIGHT_RANGE * SIGHT_RANGE;
        self.eyes.iter().any(|e| e.distance_squared(point) <= sight_sq)
    }

    fn terrain_height(&self, point: Vec2) -> f32 {
        self.hills
            .iter()
            .filter(|h| h.center.distance(point) <= h.radius)
            .map(|h| h.height)
            .fold(self.base_height, f32::max)
    }
}
