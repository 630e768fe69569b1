//! Enemy army intel quality
//!
//! Freshness averages how recently each remembered enemy army unit was seen.
//! An army that was seen before and is now entirely absent from memory
//! counts as perfectly fresh: the enemy has nothing out.

use serde::{Deserialize, Serialize};

use crate::core::config::IntelConfig;
use crate::units::Unit;

/// How much the engine currently knows about the enemy army
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntelQuality {
    /// Enemy army observed at least once
    pub has_intel: bool,
    /// 1.0 when everything is in vision, 0.0 when all memory is expired
    pub freshness: f32,
    pub average_age: f32,
    pub visible_count: usize,
    pub memory_count: usize,
}

impl IntelQuality {
    /// Never seen anything
    pub fn blind() -> Self {
        Self {
            has_intel: false,
            freshness: 0.0,
            average_age: f32::INFINITY,
            visible_count: 0,
            memory_count: 0,
        }
    }
}

/// Grade observations of the enemy army
///
/// `army` is the cached enemy army: non-worker, non-structure units
/// including remembered snapshots.
pub fn assess_intel(army: &[&Unit], ever_seen: bool, config: &IntelConfig) -> IntelQuality {
    if army.is_empty() {
        return if ever_seen {
            IntelQuality {
                has_intel: true,
                freshness: 1.0,
                average_age: 0.0,
                visible_count: 0,
                memory_count: 0,
            }
        } else {
            IntelQuality::blind()
        };
    }

    let count = army.len() as f32;
    let visible_count = army
        .iter()
        .filter(|u| u.age < config.visible_age_seconds)
        .count();
    let average_age = army.iter().map(|u| u.age).sum::<f32>() / count;
    let freshness = army
        .iter()
        .map(|u| (1.0 - u.age / config.memory_horizon_seconds).max(0.0))
        .sum::<f32>()
        / count;

    IntelQuality {
        has_intel: true,
        freshness,
        average_age,
        visible_count,
        memory_count: army.len() - visible_count,
    }
}

/// Sticky "ever seen" flag plus scouting urgency
#[derive(Debug, Clone, Default)]
pub struct IntelTracker {
    ever_seen: bool,
    urgency: f32,
}

impl IntelTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from this tick's cached enemy army
    pub fn update(&mut self, army: &[&Unit], config: &IntelConfig) -> IntelQuality {
        if !army.is_empty() && !self.ever_seen {
            tracing::info!("Enemy army spotted for the first time ({} units)", army.len());
            self.ever_seen = true;
        }

        let quality = assess_intel(army, self.ever_seen, config);
        if self.ever_seen {
            if quality.freshness < config.stale_threshold {
                self.urgency = (self.urgency + config.urgency_build).min(1.0);
            } else {
                self.urgency = (self.urgency - config.urgency_decay).max(0.0);
            }
        }
        quality
    }

    pub fn ever_seen(&self) -> bool {
        self.ever_seen
    }

    /// 0-1 pressure on the scouting collaborator to refresh intel
    pub fn urgency(&self) -> f32 {
        self.urgency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Alliance, UnitId, UnitKind};
    use glam::Vec2;

    fn seen(id: u64, age: f32) -> Unit {
        Unit::new(UnitId(id), UnitKind::Roach, Alliance::Enemy, Vec2::ZERO).with_age(age)
    }

    #[test]
    fn test_blind_without_sighting() {
        let q = assess_intel(&[], false, &IntelConfig::default());
        assert!(!q.has_intel);
        assert_eq!(q.freshness, 0.0);
    }

    #[test]
    fn test_empty_after_sighting_is_fresh() {
        let q = assess_intel(&[], true, &IntelConfig::default());
        assert!(q.has_intel);
        assert_eq!(q.freshness, 1.0);
    }

    #[test]
    fn test_freshness_decays_with_age() {
        let config = IntelConfig::default();
        let a = seen(1, 0.0);
        let b = seen(2, 15.0);
        let c = seen(3, 45.0);
        let q = assess_intel(&[&a, &b, &c], true, &config);
        assert!((q.freshness - 0.5).abs() < 1e-5);
        assert_eq!(q.visible_count, 1);
        assert_eq!(q.memory_count, 2);
        assert!((q.average_age - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_tracker_sets_ever_seen() {
        let config = IntelConfig::default();
        let mut tracker = IntelTracker::new();
        assert!(!tracker.update(&[], &config).has_intel);
        let a = seen(1, 0.0);
        assert!(tracker.update(&[&a], &config).has_intel);
        assert!(tracker.update(&[], &config).has_intel);
        assert!(tracker.ever_seen());
    }

    #[test]
    fn test_urgency_builds_and_decays() {
        let config = IntelConfig::default();
        let mut tracker = IntelTracker::new();
        let old = seen(1, 29.0);
        for _ in 0..10 {
            tracker.update(&[&old], &config);
        }
        let built = tracker.urgency();
        assert!((built - 0.2).abs() < 1e-4);

        let fresh = seen(1, 0.0);
        tracker.update(&[&fresh], &config);
        assert!(tracker.urgency() < built);
    }

    #[test]
    fn test_urgency_stays_zero_while_blind() {
        let config = IntelConfig::default();
        let mut tracker = IntelTracker::new();
        for _ in 0..10 {
            tracker.update(&[], &config);
        }
        assert_eq!(tracker.urgency(), 0.0);
    }
}
