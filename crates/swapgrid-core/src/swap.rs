//! Constrained random permutation of item positions.
//!
//! A [`SwapPlan`] fixes how many items move for a level:
//! `k = min(2 * ceil(level / 2), N rounded down to even)`. Applying the plan
//! draws `k` distinct indices uniformly without replacement, pairs them in
//! draw order, and exchanges the positions of each pair. Identity and asset
//! stay with the item; only placement changes, so every touched item ends up
//! somewhere else.
//!
//! The draw is not seeded by the engine. Two trials at the same level get
//! independent permutations.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::item::{Item, ItemId, Position};
use crate::level::Level;

/// Validated swap parameters for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPlan {
    level: Level,
    items: usize,
    swaps: usize,
}

impl SwapPlan {
    /// Derive the plan for a level and grid size.
    ///
    /// An odd grid drops its last slot from the cap instead of silently
    /// truncating the pair count later.
    pub fn for_level(level: Level, items: usize) -> Result<Self> {
        let requested = 2 * level.pair_count();
        let even_cap = items - items % 2;
        Self::with_swaps(level, items, requested.min(even_cap))
    }

    /// Build a plan with an explicit moved-item count.
    ///
    /// `swaps` must be even, non-zero, and at most `items`.
    pub fn with_swaps(level: Level, items: usize, swaps: usize) -> Result<Self> {
        if swaps == 0 || swaps % 2 != 0 || swaps > items {
            return Err(EngineError::InvalidSwapConfiguration {
                level: level.get(),
                items,
                swaps,
            });
        }
        Ok(Self {
            level,
            items,
            swaps,
        })
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Grid size the plan was built for.
    #[must_use]
    pub fn items(&self) -> usize {
        self.items
    }

    /// Number of items that will move (`k`).
    #[must_use]
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    #[must_use]
    pub fn pairs(&self) -> usize {
        self.swaps / 2
    }

    /// Apply the plan to a pre-swap grid.
    pub fn apply<R: Rng + ?Sized>(&self, items: &[Item], rng: &mut R) -> Result<SwapOutcome> {
        if items.len() != self.items {
            return Err(EngineError::InvalidSwapConfiguration {
                level: self.level.get(),
                items: items.len(),
                swaps: self.swaps,
            });
        }

        let drawn = rand::seq::index::sample(rng, self.items, self.swaps).into_vec();
        let mut swapped = items.to_vec();
        let mut moves = Vec::with_capacity(self.swaps);

        for pair in drawn.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            let from_a = swapped[a].position;
            let from_b = swapped[b].position;
            swapped[a].position = from_b;
            swapped[b].position = from_a;
            moves.push(Move {
                item: swapped[a].id,
                from: from_a,
                to: from_b,
            });
            moves.push(Move {
                item: swapped[b].id,
                from: from_b,
                to: from_a,
            });
        }

        let moved_ids = moves.iter().map(|m| m.item).collect();
        let moved_positions = moves.iter().map(|m| m.to).collect();

        tracing::debug!(
            target: "swapgrid.swap",
            level = self.level.get(),
            items = self.items,
            moved = self.swaps,
            "applied swap plan"
        );

        Ok(SwapOutcome {
            swapped,
            moved_ids,
            moved_positions,
            moves,
        })
    }
}

/// One item's relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub item: ItemId,
    pub from: Position,
    pub to: Position,
}

/// Result of applying a [`SwapPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Post-swap copy of the grid, in the same item order as the input.
    pub swapped: Vec<Item>,
    pub moved_ids: BTreeSet<ItemId>,
    /// Final positions occupied by moved items.
    pub moved_positions: BTreeSet<Position>,
    /// Relocations in pair order: entries `2i` and `2i + 1` form one pair.
    pub moves: Vec<Move>,
}
