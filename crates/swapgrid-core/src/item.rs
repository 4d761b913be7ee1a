use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;

/// A grid slot index in `[0, N)`.
pub type Position = usize;

/// Identifier of an item, unique within one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single stimulus: stable identity, a display asset, and a grid position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub asset: AssetRef,
    pub position: Position,
}

/// Index a slice of items by position.
///
/// Returns `None` when two items share a position or a position falls
/// outside `[0, items.len())`.
#[must_use]
pub fn layout(items: &[Item]) -> Option<Vec<&Item>> {
    let mut slots: Vec<Option<&Item>> = vec![None; items.len()];
    for item in items {
        let slot = slots.get_mut(item.position)?;
        if slot.replace(item).is_some() {
            return None;
        }
    }
    slots.into_iter().collect()
}
