//! Weight thresholds used by the voting algorithm.

use serde::{Deserialize, Serialize};

/// A fraction of total roster weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Threshold {
    /// More than 1/2.
    Majority,
    /// More than 2/3.
    SuperMajority,
    /// At least 1/3.
    StrongMinority,
}

impl Threshold {
    /// Whether `part` out of `whole` reaches this threshold.
    pub fn is_satisfied_by(self, part: u64, whole: u64) -> bool {
        let part = u128::from(part);
        let whole = u128::from(whole);
        match self {
            Threshold::Majority => part * 2 > whole,
            Threshold::SuperMajority => part * 3 > whole * 2,
            Threshold::StrongMinority => part * 3 >= whole,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_majority_is_strictly_more_than_two_thirds() {
        assert!(!Threshold::SuperMajority.is_satisfied_by(2, 3));
        assert!(Threshold::SuperMajority.is_satisfied_by(3, 4));
        assert!(Threshold::SuperMajority.is_satisfied_by(1, 1));
        assert!(!Threshold::SuperMajority.is_satisfied_by(0, 1));
    }

    #[test]
    fn test_majority_and_strong_minority() {
        assert!(!Threshold::Majority.is_satisfied_by(2, 4));
        assert!(Threshold::Majority.is_satisfied_by(3, 4));
        assert!(Threshold::StrongMinority.is_satisfied_by(1, 3));
        assert!(!Threshold::StrongMinority.is_satisfied_by(1, 4));
    }

    #[test]
    fn test_large_weights_do_not_overflow() {
        assert!(Threshold::SuperMajority.is_satisfied_by(u64::MAX, u64::MAX));
    }
}
