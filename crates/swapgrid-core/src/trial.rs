//! One study → response → feedback cycle.
//!
//! A [`Trial`] owns its items exclusively. The swap plan is validated when
//! the trial is built, so a trial that exists can always be revealed; the
//! permutation itself is drawn only when the study phase ends.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;
use crate::error::{EngineError, Result};
use crate::evaluate::{Evaluation, PassPolicy, evaluate};
use crate::generator::generate_items;
use crate::item::{Item, ItemId, Position};
use crate::level::Level;
use crate::swap::{Move, SwapOutcome, SwapPlan};

#[derive(Debug, Clone)]
pub struct Trial {
    level: Level,
    columns: usize,
    items: Vec<Item>,
    plan: SwapPlan,
    swap: Option<SwapOutcome>,
    selected: BTreeSet<Position>,
}

impl Trial {
    /// Generate a fresh grid for `level` from `pool`.
    pub fn generate<R: Rng + ?Sized>(
        level: Level,
        columns: usize,
        pool: &[AssetRef],
        rng: &mut R,
    ) -> Result<Self> {
        let plan = SwapPlan::for_level(level, level.item_count(columns))?;
        let items = generate_items(level, columns, pool, rng)?;
        Ok(Self {
            level,
            columns,
            items,
            plan,
            swap: None,
            selected: BTreeSet::new(),
        })
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.level.rows()
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Pre-swap items.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn plan(&self) -> SwapPlan {
        self.plan
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.swap.is_some()
    }

    /// Post-swap items, once revealed.
    #[must_use]
    pub fn swapped(&self) -> Option<&[Item]> {
        self.swap.as_ref().map(|s| s.swapped.as_slice())
    }

    #[must_use]
    pub fn moved_ids(&self) -> Option<&BTreeSet<ItemId>> {
        self.swap.as_ref().map(|s| &s.moved_ids)
    }

    #[must_use]
    pub fn moved_positions(&self) -> Option<&BTreeSet<Position>> {
        self.swap.as_ref().map(|s| &s.moved_positions)
    }

    #[must_use]
    pub fn selected(&self) -> &BTreeSet<Position> {
        &self.selected
    }

    /// Draw the permutation. Revealing twice keeps the first draw.
    pub fn reveal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&SwapOutcome> {
        let outcome = match self.swap.take() {
            Some(outcome) => outcome,
            None => self.plan.apply(&self.items, rng)?,
        };
        Ok(self.swap.insert(outcome))
    }

    /// Flip the selection state of `position`; returns whether it is now selected.
    pub fn toggle(&mut self, position: Position) -> Result<bool> {
        if position >= self.items.len() {
            return Err(EngineError::PositionOutOfRange {
                position,
                items: self.items.len(),
            });
        }
        if self.selected.remove(&position) {
            Ok(false)
        } else {
            self.selected.insert(position);
            Ok(true)
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Score the current selection. `None` until revealed.
    #[must_use]
    pub fn evaluate(&self, policy: PassPolicy) -> Option<Evaluation> {
        self.swap
            .as_ref()
            .map(|s| evaluate(&self.selected, &s.moved_positions, policy))
    }

    /// Build the immutable per-level record. `None` until revealed.
    #[must_use]
    pub fn result(&self, policy: PassPolicy) -> Option<LevelResult> {
        let swap = self.swap.as_ref()?;
        let eval = evaluate(&self.selected, &swap.moved_positions, policy);
        Some(LevelResult {
            level: self.level,
            correct_selections: eval.correct,
            incorrect_selections: eval.incorrect,
            total_moved: eval.total_moved,
            score: eval.score,
            passed: eval.passed,
            pairs: swap.moves.clone(),
        })
    }
}

/// Outcome of a completed trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    pub level: Level,
    pub correct_selections: usize,
    pub incorrect_selections: usize,
    pub total_moved: usize,
    pub score: usize,
    pub passed: bool,
    pub pairs: Vec<Move>,
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::asset::{AssetProvider, ShapeAssets};
    use crate::level::DEFAULT_COLUMNS;

    fn trial(level: u8, seed: u64) -> (Trial, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let shapes = ShapeAssets::new(20);
        let trial = Trial::generate(
            Level::new(level).unwrap(),
            DEFAULT_COLUMNS,
            shapes.pool(),
            &mut rng,
        )
        .unwrap();
        (trial, rng)
    }

    #[test]
    fn unrevealed_trial_has_no_score() {
        let (trial, _) = trial(1, 1);
        assert!(!trial.is_revealed());
        assert!(trial.swapped().is_none());
        assert!(trial.evaluate(PassPolicy::default()).is_none());
        assert!(trial.result(PassPolicy::default()).is_none());
    }

    #[test]
    fn reveal_is_stable() {
        let (mut trial, mut rng) = trial(3, 2);
        let first = trial.reveal(&mut rng).unwrap().clone();
        let second = trial.reveal(&mut rng).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(trial.moved_positions().unwrap().len(), 4);
    }

    #[test]
    fn toggle_flips_and_rejects_out_of_range() {
        let (mut trial, _) = trial(1, 3);
        assert_eq!(trial.toggle(2), Ok(true));
        assert_eq!(trial.toggle(2), Ok(false));
        assert!(trial.selected().is_empty());
        assert_eq!(
            trial.toggle(4),
            Err(EngineError::PositionOutOfRange {
                position: 4,
                items: 4
            })
        );
    }

    #[test]
    fn result_carries_pairs_and_score() {
        let (mut trial, mut rng) = trial(1, 4);
        let moved: Vec<Position> = trial
            .reveal(&mut rng)
            .unwrap()
            .moved_positions
            .iter()
            .copied()
            .collect();
        for p in &moved {
            trial.toggle(*p).unwrap();
        }
        let result = trial.result(PassPolicy::default()).unwrap();
        assert_eq!(result.level, Level::FIRST);
        assert_eq!(result.correct_selections, 2);
        assert_eq!(result.incorrect_selections, 0);
        assert_eq!(result.score, 2);
        assert_eq!(result.total_moved, 2);
        assert!(result.passed);
        assert_eq!(result.pairs.len(), 2);
    }
}
