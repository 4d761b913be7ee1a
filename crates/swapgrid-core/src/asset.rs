//! Asset providers.
//!
//! The plain spatial task and the image ("ecological") variant share one
//! engine and differ only in where stimulus assets come from. Both sources
//! implement [`AssetProvider`]; the engine treats every [`AssetRef`] as an
//! opaque, stable identifier.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Opaque reference to a display asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A source of unique, stable asset references.
pub trait AssetProvider {
    /// Short name used in logs and stored session metadata.
    fn name(&self) -> &str;

    /// The ordered pool the generator samples from.
    fn pool(&self) -> &[AssetRef];
}

impl<P: AssetProvider + ?Sized> AssetProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn pool(&self) -> &[AssetRef] {
        (**self).pool()
    }
}

/// Check that a pool holds no repeated references.
pub fn ensure_unique(pool: &[AssetRef]) -> Result<()> {
    let mut seen = HashSet::with_capacity(pool.len());
    for asset in pool {
        if !seen.insert(asset) {
            return Err(EngineError::DuplicateAsset {
                asset: asset.clone(),
            });
        }
    }
    Ok(())
}

/// Numbered abstract shapes used by the plain spatial-memory task.
#[derive(Debug, Clone)]
pub struct ShapeAssets {
    pool: Vec<AssetRef>,
}

impl ShapeAssets {
    /// Create `count` distinct shape references (`shape-01`, `shape-02`, ...).
    #[must_use]
    pub fn new(count: usize) -> Self {
        let pool = (1..=count)
            .map(|i| AssetRef::new(format!("shape-{i:02}")))
            .collect();
        Self { pool }
    }
}

impl AssetProvider for ShapeAssets {
    fn name(&self) -> &str {
        "shapes"
    }

    fn pool(&self) -> &[AssetRef] {
        &self.pool
    }
}

/// An image catalogue for the ecological variant.
#[derive(Debug, Clone)]
pub struct ImageCatalog {
    pool: Vec<AssetRef>,
}

impl ImageCatalog {
    /// Build a catalogue, rejecting duplicate references.
    pub fn new<I, A>(assets: I) -> Result<Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<AssetRef>,
    {
        let pool: Vec<AssetRef> = assets.into_iter().map(Into::into).collect();
        ensure_unique(&pool)?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl AssetProvider for ImageCatalog {
    fn name(&self) -> &str {
        "images"
    }

    fn pool(&self) -> &[AssetRef] {
        &self.pool
    }
}
