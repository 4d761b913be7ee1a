//! Stimulus generation.
//!
//! Builds the pre-swap grid for a level: `N = rows * columns` items at
//! positions `0..N`, each carrying a distinct asset drawn from the provider
//! pool without replacement (shuffle, then take the first `N`).

use rand::Rng;
use rand::seq::SliceRandom;

use crate::asset::{AssetRef, ensure_unique};
use crate::error::{EngineError, Result};
use crate::item::{Item, ItemId};
use crate::level::Level;

/// Generate the initial item grid for `level`.
///
/// Fails with [`EngineError::InsufficientAssets`] if the pool holds fewer
/// than `N` references, and with [`EngineError::DuplicateAsset`] if the pool
/// repeats one.
pub fn generate_items<R: Rng + ?Sized>(
    level: Level,
    columns: usize,
    pool: &[AssetRef],
    rng: &mut R,
) -> Result<Vec<Item>> {
    let required = level.item_count(columns);
    if pool.len() < required {
        return Err(EngineError::InsufficientAssets {
            required,
            available: pool.len(),
        });
    }
    ensure_unique(pool)?;

    let mut drawn: Vec<&AssetRef> = pool.iter().collect();
    drawn.shuffle(rng);

    let items: Vec<Item> = drawn
        .into_iter()
        .take(required)
        .enumerate()
        .map(|(index, asset)| Item {
            id: ItemId(index as u32),
            asset: asset.clone(),
            position: index,
        })
        .collect();

    tracing::debug!(
        target: "swapgrid.generator",
        level = level.get(),
        items = items.len(),
        pool = pool.len(),
        "generated stimulus grid"
    );
    Ok(items)
}
