//! Per-squad engagement memory
//!
//! A squad that is fighting keeps fighting until the estimate says it is
//! being crushed, and a squad that backed off only re-engages once it is at
//! least slightly favoured. Around a 50/50 estimate neither transition fires,
//! so squads do not flip every tick.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::Tick;
use crate::tactics::outcome::FightOutcome;

/// Key for a squad's entry
///
/// Squad ids come from the spatial collaborator and churn as squads merge
/// and split; entries for vanished ids are evicted by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SquadKey(pub u64);

/// Willingness of one squad to fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Engagement {
    Engaging,
    Avoiding,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    engagement: Engagement,
    last_touched: Tick,
}

/// Hysteresis map from squad to engagement state
#[derive(Debug, Clone)]
pub struct EngagementTracker {
    entries: AHashMap<SquadKey, Entry>,
    eviction_ticks: u64,
}

impl EngagementTracker {
    pub fn new(eviction_ticks: u64) -> Self {
        Self {
            entries: AHashMap::new(),
            eviction_ticks,
        }
    }

    /// Feed the latest estimate for a squad and get its decision
    ///
    /// First sighting starts in `Engaging`.
    pub fn should_engage(&mut self, squad: SquadKey, outcome: FightOutcome, now: Tick) -> bool {
        let entry = self.entries.entry(squad).or_insert(Entry {
            engagement: Engagement::Engaging,
            last_touched: now,
        });
        entry.last_touched = now;

        let next = next_engagement(entry.engagement, outcome);
        if next != entry.engagement {
            tracing::debug!(
                "Squad {} {:?} -> {:?} on {:?}",
                squad.0,
                entry.engagement,
                next,
                outcome
            );
            entry.engagement = next;
        }
        entry.engagement == Engagement::Engaging
    }

    /// Current state without feeding an estimate
    pub fn engagement(&self, squad: SquadKey) -> Option<Engagement> {
        self.entries.get(&squad).map(|e| e.engagement)
    }

    /// Drop entries untouched for longer than the eviction age
    pub fn evict_stale(&mut self, now: Tick) -> usize {
        let before = self.entries.len();
        let max_age = self.eviction_ticks;
        self.entries
            .retain(|_, e| now.saturating_sub(e.last_touched) <= max_age);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Transition rule, separated for property testing
pub fn next_engagement(current: Engagement, outcome: FightOutcome) -> Engagement {
    match current {
        Engagement::Engaging if outcome.is_overwhelming_loss_or_worse() => Engagement::Avoiding,
        Engagement::Avoiding if outcome.is_marginal_victory_or_better() => Engagement::Engaging,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_squad_engages() {
        let mut tracker = EngagementTracker::new(100);
        assert!(tracker.should_engage(SquadKey(1), FightOutcome::DecisiveLoss, 0));
    }

    #[test]
    fn test_overwhelming_loss_disengages() {
        let mut tracker = EngagementTracker::new(100);
        assert!(!tracker.should_engage(SquadKey(1), FightOutcome::OverwhelmingLoss, 0));
        assert_eq!(tracker.engagement(SquadKey(1)), Some(Engagement::Avoiding));
    }

    #[test]
    fn test_avoiding_needs_marginal_victory() {
        let mut tracker = EngagementTracker::new(100);
        tracker.should_engage(SquadKey(1), FightOutcome::EmphaticLoss, 0);
        assert!(!tracker.should_engage(SquadKey(1), FightOutcome::Tie, 1));
        assert!(!tracker.should_engage(SquadKey(1), FightOutcome::MarginalLoss, 2));
        assert!(tracker.should_engage(SquadKey(1), FightOutcome::MarginalVictory, 3));
    }

    #[test]
    fn test_no_flip_flop_around_even_fight() {
        let mut tracker = EngagementTracker::new(100);
        let noise = [
            FightOutcome::MarginalLoss,
            FightOutcome::Tie,
            FightOutcome::MarginalVictory,
            FightOutcome::CloseLoss,
        ];
        for (tick, outcome) in noise.iter().cycle().take(40).enumerate() {
            assert!(tracker.should_engage(SquadKey(3), *outcome, tick as Tick));
        }
    }

    #[test]
    fn test_squads_are_independent() {
        let mut tracker = EngagementTracker::new(100);
        tracker.should_engage(SquadKey(1), FightOutcome::EmphaticLoss, 0);
        assert!(tracker.should_engage(SquadKey(2), FightOutcome::Tie, 0));
        assert_eq!(tracker.engagement(SquadKey(1)), Some(Engagement::Avoiding));
    }

    #[test]
    fn test_eviction_drops_old_entries() {
        let mut tracker = EngagementTracker::new(10);
        tracker.should_engage(SquadKey(1), FightOutcome::Tie, 0);
        tracker.should_engage(SquadKey(2), FightOutcome::Tie, 8);
        assert_eq!(tracker.evict_stale(15), 1);
        assert_eq!(tracker.engagement(SquadKey(1)), None);
        assert!(tracker.engagement(SquadKey(2)).is_some());
    }
}
