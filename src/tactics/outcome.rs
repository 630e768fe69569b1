//! Ranked fight outcome estimates
//!
//! The combat estimator reports a category rather than a number. Variants
//! are declared worst to best so the derived ordering is the ranking.

use serde::{Deserialize, Serialize};

/// Predicted result of a fight between two groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FightOutcome {
    EmphaticLoss,
    OverwhelmingLoss,
    DecisiveLoss,
    CloseLoss,
    MarginalLoss,
    Tie,
    MarginalVictory,
    CloseVictory,
    DecisiveVictory,
    OverwhelmingVictory,
    EmphaticVictory,
}

impl FightOutcome {
    /// Every category, worst first
    pub const ALL: [FightOutcome; 11] = [
        FightOutcome::EmphaticLoss,
        FightOutcome::OverwhelmingLoss,
        FightOutcome::DecisiveLoss,
        FightOutcome::CloseLoss,
        FightOutcome::MarginalLoss,
        FightOutcome::Tie,
        FightOutcome::MarginalVictory,
        FightOutcome::CloseVictory,
        FightOutcome::DecisiveVictory,
        FightOutcome::OverwhelmingVictory,
        FightOutcome::EmphaticVictory,
    ];

    pub fn is_overwhelming_loss_or_worse(self) -> bool {
        self <= FightOutcome::OverwhelmingLoss
    }

    pub fn is_decisive_loss_or_worse(self) -> bool {
        self <= FightOutcome::DecisiveLoss
    }

    pub fn is_marginal_victory_or_better(self) -> bool {
        self >= FightOutcome::MarginalVictory
    }

    pub fn is_decisive_victory_or_better(self) -> bool {
        self >= FightOutcome::DecisiveVictory
    }

    pub fn is_emphatic_victory(self) -> bool {
        self == FightOutcome::EmphaticVictory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_sorted() {
        assert!(FightOutcome::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_predicates_partition_ordering() {
        assert!(FightOutcome::EmphaticLoss.is_overwhelming_loss_or_worse());
        assert!(!FightOutcome::DecisiveLoss.is_overwhelming_loss_or_worse());
        assert!(FightOutcome::DecisiveLoss.is_decisive_loss_or_worse());
        assert!(!FightOutcome::CloseLoss.is_decisive_loss_or_worse());
        assert!(!FightOutcome::Tie.is_marginal_victory_or_better());
        assert!(FightOutcome::MarginalVictory.is_marginal_victory_or_better());
        assert!(!FightOutcome::CloseVictory.is_decisive_victory_or_better());
        assert!(FightOutcome::OverwhelmingVictory.is_decisive_victory_or_better());
        assert!(FightOutcome::EmphaticVictory.is_emphatic_victory());
    }
}
