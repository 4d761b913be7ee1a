//! Response scoring.
//!
//! ```text
//! correct    = |selected ∩ moved|
//! incorrect  = |selected \ moved|
//! score      = max(0, correct - incorrect)
//! ```
//!
//! Pass/fail is decided by a [`PassPolicy`] chosen once per session. It is
//! informational: the level ladder advances either way.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::item::Position;

/// Threshold rule for marking a trial as passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPolicy {
    /// `correct > incorrect`.
    #[default]
    MoreCorrectThanIncorrect,
    /// At least half of the moved positions found and no false positives.
    HalfCoverageNoFalsePositives,
}

impl PassPolicy {
    #[must_use]
    pub fn passes(self, correct: usize, incorrect: usize, total_moved: usize) -> bool {
        match self {
            Self::MoreCorrectThanIncorrect => correct > incorrect,
            Self::HalfCoverageNoFalsePositives => 2 * correct >= total_moved && incorrect == 0,
        }
    }
}

/// Scored response for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: usize,
    pub incorrect: usize,
    pub total_moved: usize,
    pub score: usize,
    pub passed: bool,
}

/// Score a selection against the true set of moved positions.
#[must_use]
pub fn evaluate(
    selected: &BTreeSet<Position>,
    moved_positions: &BTreeSet<Position>,
    policy: PassPolicy,
) -> Evaluation {
    let correct = selected.intersection(moved_positions).count();
    let incorrect = selected.len() - correct;
    let total_moved = moved_positions.len();
    Evaluation {
        correct,
        incorrect,
        total_moved,
        score: correct.saturating_sub(incorrect),
        passed: policy.passes(correct, incorrect, total_moved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[Position]) -> BTreeSet<Position> {
        values.iter().copied().collect()
    }

    #[test]
    fn exact_selection_scores_all_moved() {
        let eval = evaluate(&set(&[1, 3]), &set(&[1, 3]), PassPolicy::default());
        assert_eq!(eval.correct, 2);
        assert_eq!(eval.incorrect, 0);
        assert_eq!(eval.score, 2);
        assert_eq!(eval.total_moved, 2);
        assert!(eval.passed);
    }

    #[test]
    fn one_hit_one_miss_cancels_out() {
        let eval = evaluate(&set(&[1, 2]), &set(&[1, 3]), PassPolicy::default());
        assert_eq!((eval.correct, eval.incorrect, eval.score), (1, 1, 0));
        assert!(!eval.passed);
    }

    #[test]
    fn empty_selection_scores_zero() {
        let eval = evaluate(&BTreeSet::new(), &set(&[0, 5]), PassPolicy::default());
        assert_eq!((eval.correct, eval.incorrect, eval.score), (0, 0, 0));
        assert!(!eval.passed);
    }

    #[test]
    fn score_never_goes_negative() {
        let eval = evaluate(&set(&[0, 1, 2, 4]), &set(&[4, 7]), PassPolicy::default());
        assert_eq!((eval.correct, eval.incorrect, eval.score), (1, 3, 0));
    }

    #[test]
    fn policies_disagree_on_partial_clean_selection() {
        let moved = set(&[1, 3, 5, 7]);
        let selected = set(&[1, 3]);
        let lenient = evaluate(&selected, &moved, PassPolicy::MoreCorrectThanIncorrect);
        let strict = evaluate(&selected, &moved, PassPolicy::HalfCoverageNoFalsePositives);
        assert!(lenient.passed);
        assert!(strict.passed);

        let noisy = set(&[1, 3, 5, 0]);
        assert!(evaluate(&noisy, &moved, PassPolicy::MoreCorrectThanIncorrect).passed);
        assert!(!evaluate(&noisy, &moved, PassPolicy::HalfCoverageNoFalsePositives).passed);

        let sparse = set(&[1]);
        assert!(evaluate(&sparse, &moved, PassPolicy::MoreCorrectThanIncorrect).passed);
        assert!(!evaluate(&sparse, &moved, PassPolicy::HalfCoverageNoFalsePositives).passed);
    }

    #[test]
    fn policy_names_round_trip_through_serde() {
        let json = serde_json::to_string(&PassPolicy::HalfCoverageNoFalsePositives).unwrap();
        assert_eq!(json, "\"half_coverage_no_false_positives\"");
    }
}
