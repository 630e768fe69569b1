//! Core type definitions used throughout the codebase

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game loop step counter
pub type Tick = u64;

/// Game clock in seconds
pub type GameSeconds = f32;

/// Game steps per second of game time at "faster" speed
pub const TICKS_PER_SECOND: f32 = 22.4;

/// Playable race of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Terran,
    Zerg,
    Protoss,
    Random,
}

/// Coarse stage of the match, as reported by the production layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    Early,
    Mid,
    Late,
}

impl GamePhase {
    /// Classify a game clock reading
    pub fn from_time(seconds: GameSeconds) -> Self {
        if seconds < 360.0 {
            GamePhase::Early
        } else if seconds < 720.0 {
            GamePhase::Mid
        } else {
            GamePhase::Late
        }
    }
}

/// Point `distance` units from `from` in the direction of `to`
///
/// Returns `from` unchanged when the two points coincide.
pub fn towards(from: Vec2, to: Vec2, distance: f32) -> Vec2 {
    let dir = to - from;
    if dir.length_squared() < 1e-6 {
        return from;
    }
    from + dir.normalize() * distance
}

/// Unweighted centroid of a set of points
pub fn center_of<I>(points: I) -> Option<Vec2>
where
    I: IntoIterator<Item = Vec2>,
{
    let mut sum = Vec2::ZERO;
    let mut count = 0usize;
    for p in points {
        sum += p;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f32)
    }
}

/// Centroid of the densest neighbourhood in a point set
///
/// Picks the point with the most neighbours within `radius` (lowest index on
/// ties) and returns the mean of that neighbourhood together with its size.
pub fn center_mass(points: &[Vec2], radius: f32) -> Option<(Vec2, usize)> {
    let radius_sq = radius * radius;
    let mut best: Option<(usize, usize)> = None;
    for (i, p) in points.iter().enumerate() {
        let count = points
            .iter()
            .filter(|q| q.distance_squared(*p) <= radius_sq)
            .count();
        match best {
            Some((_, c)) if c >= count => {}
            _ => best = Some((i, count)),
        }
    }
    let (idx, count) = best?;
    let anchor = points[idx];
    let center = center_of(
        points
            .iter()
            .copied()
            .filter(|q| q.distance_squared(anchor) <= radius_sq),
    )?;
    Some((center, count))
}

/// Index of the point closest to `target`, ties resolved by lowest index
pub fn closest_index(points: &[Vec2], target: Vec2) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance_squared(target);
        match best {
            Some((_, bd)) if bd <= d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_towards_moves_fixed_distance() {
        let p = towards(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), 3.0);
        assert!((p - Vec2::new(3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_towards_same_point_is_noop() {
        let p = towards(Vec2::new(4.0, 4.0), Vec2::new(4.0, 4.0), 3.0);
        assert_eq!(p, Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_center_of_empty() {
        assert!(center_of(std::iter::empty()).is_none());
    }

    #[test]
    fn test_center_of_points() {
        let c = center_of([Vec2::new(0.0, 0.0), Vec2::new(4.0, 2.0)]).unwrap();
        assert_eq!(c, Vec2::new(2.0, 1.0));
    }

    #[test]
    fn test_center_mass_ignores_outlier() {
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(50.0, 50.0),
        ];
        let (center, count) = center_mass(&points, 5.0).unwrap();
        assert_eq!(count, 3);
        assert!(center.distance(Vec2::new(1.0 / 3.0, 1.0 / 3.0)) < 1e-5);
        assert!(center_mass(&[], 5.0).is_none());
    }

    #[test]
    fn test_closest_index_tie_prefers_first() {
        let points = [Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0), Vec2::new(5.0, 5.0)];
        assert_eq!(closest_index(&points, Vec2::ZERO), Some(0));
        assert_eq!(closest_index(&[], Vec2::ZERO), None);
    }

    #[test]
    fn test_game_phase_ordering() {
        assert_eq!(GamePhase::from_time(100.0), GamePhase::Early);
        assert_eq!(GamePhase::from_time(400.0), GamePhase::Mid);
        assert_eq!(GamePhase::from_time(900.0), GamePhase::Late);
        assert!(GamePhase::Late > GamePhase::Early);
    }
}
