//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;
use glam::Vec2;

use crate::units::UnitId;

/// Sparse hash grid over unit positions
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(UnitId, Vec2)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, unit: UnitId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((unit, pos));
    }

    pub fn remove(&mut self, unit: UnitId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|&(u, _)| u != unit);
        }
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }

    /// Query all units in neighboring cells (3x3 neighborhood)
    pub fn query_neighbors(&self, pos: Vec2) -> impl Iterator<Item = UnitId> + '_ {
        let (cx, cy) = self.cell_coord(pos);

        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                self.cells
                    .get(&(cx + dx, cy + dy))
                    .into_iter()
                    .flatten()
                    .map(|&(u, _)| u)
            })
        })
    }

    /// Units within `radius` of `center`, in ascending id order
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<UnitId> {
        let radius_sq = radius * radius;
        let (min_x, min_y) = self.cell_coord(center - Vec2::splat(radius));
        let (max_x, max_y) = self.cell_coord(center + Vec2::splat(radius));

        let mut found: Vec<UnitId> = (min_x..=max_x)
            .flat_map(|x| (min_y..=max_y).map(move |y| (x, y)))
            .filter_map(|coord| self.cells.get(&coord))
            .flatten()
            .filter(|(_, pos)| pos.distance_squared(center) <= radius_sq)
            .map(|&(u, _)| u)
            .collect();
        found.sort();
        found
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, units: impl Iterator<Item = (UnitId, Vec2)>) {
        self.clear();
        for (unit, pos) in units {
            self.insert(unit, pos);
        }
    }
}
