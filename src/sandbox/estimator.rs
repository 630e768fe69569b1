//! Fight estimate from army value ratios

use crate::tactics::outcome::FightOutcome;
use crate::tactics::services::{EstimateOptions, FightEstimator};
use crate::units::Unit;

/// Ratios at which each stronger outcome starts, mirrored for losses
const RATIO_STEPS: [f32; 5] = [1.1, 1.3, 1.75, 2.5, 4.0];

const VICTORIES: [FightOutcome; 6] = [
    FightOutcome::Tie,
    FightOutcome::MarginalVictory,
    FightOutcome::CloseVictory,
    FightOutcome::DecisiveVictory,
    FightOutcome::OverwhelmingVictory,
    FightOutcome::EmphaticVictory,
];

const LOSSES: [FightOutcome; 6] = [
    FightOutcome::Tie,
    FightOutcome::MarginalLoss,
    FightOutcome::CloseLoss,
    FightOutcome::DecisiveLoss,
    FightOutcome::OverwhelmingLoss,
    FightOutcome::EmphaticLoss,
];

/// Compares health-weighted army value; ignores positioning
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueRatioEstimator;

impl ValueRatioEstimator {
    fn strength(units: &[&Unit], options: EstimateOptions) -> f32 {
        units
            .iter()
            .filter(|u| !(options.workers_do_no_damage && u.is_worker()))
            .map(|u| u.army_value())
            .sum()
    }

    /// Bucket a strength ratio into an outcome
    pub fn classify(own: f32, enemy: f32) -> FightOutcome {
        match (own > 0.0, enemy > 0.0) {
            (false, false) => return FightOutcome::Tie,
            (true, false) => return FightOutcome::EmphaticVictory,
            (false, true) => return FightOutcome::EmphaticLoss,
            (true, true) => {}
        }
        let (ratio, table) = if own >= enemy {
            (own / enemy, &VICTORIES)
        } else {
            (enemy / own, &LOSSES)
        };
        let step = RATIO_STEPS.iter().filter(|&&t| ratio >= t).count();
        table[step]
    }
}

impl FightEstimator for ValueRatioEstimator {
    fn estimate(&self, own: &[&Unit], enemy: &[&Unit], options: EstimateOptions) -> FightOutcome {
        Self::classify(Self::strength(own, options), Self::strength(enemy, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Alliance, UnitId, UnitKind};
    use glam::Vec2;

    #[test]
    fn test_classify_buckets() {
        assert_eq!(ValueRatioEstimator::classify(10.0, 10.0), FightOutcome::Tie);
        assert_eq!(ValueRatioEstimator::classify(12.0, 10.0), FightOutcome::MarginalVictory);
        assert_eq!(ValueRatioEstimator::classify(20.0, 10.0), FightOutcome::DecisiveVictory);
        assert_eq!(ValueRatioEstimator::classify(50.0, 10.0), FightOutcome::EmphaticVictory);
        assert_eq!(ValueRatioEstimator::classify(10.0, 20.0), FightOutcome::DecisiveLoss);
        assert_eq!(ValueRatioEstimator::classify(0.0, 5.0), FightOutcome::EmphaticLoss);
        assert_eq!(ValueRatioEstimator::classify(0.0, 0.0), FightOutcome::Tie);
    }

    #[test]
    fn test_workers_excluded() {
        let probes: Vec<Unit> = (0..10)
            .map(|i| Unit::new(UnitId(i), UnitKind::Probe, Alliance::Own, Vec2::ZERO))
            .collect();
        let own: Vec<&Unit> = probes.iter().collect();
        let zergling = Unit::new(UnitId(50), UnitKind::Zergling, Alliance::Enemy, Vec2::ZERO);
        let outcome = ValueRatioEstimator.estimate(&own, &[&zergling], EstimateOptions::default());
        assert_eq!(outcome, FightOutcome::EmphaticLoss);
    }
}
