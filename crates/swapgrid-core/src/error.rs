use thiserror::Error;

use crate::asset::AssetRef;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised by the trial engine.
///
/// None of these are transient: each one reflects a configuration or logic
/// defect, so nothing in the engine retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("asset pool too small: {required} assets required, {available} available")]
    InsufficientAssets { required: usize, available: usize },

    #[error("asset pool contains duplicate reference: {asset}")]
    DuplicateAsset { asset: AssetRef },

    #[error("invalid engine configuration: {}", problems.join("; "))]
    InvalidConfig { problems: Vec<String> },

    #[error(
        "invalid swap configuration: level {level} with {items} items cannot move {swaps} items"
    )]
    InvalidSwapConfiguration {
        level: u8,
        items: usize,
        swaps: usize,
    },

    #[error("stale timer fired: generation {fired} while generation {live:?} is live")]
    StaleTimerFired { live: Option<u64>, fired: u64 },

    #[error("level {level} is outside the supported ladder")]
    InvalidLevel { level: u8 },

    #[error("position {position} is outside a grid of {items} items")]
    PositionOutOfRange { position: usize, items: usize },
}

impl EngineError {
    /// Whether the error prevents a level from starting.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::InsufficientAssets { .. }
                | Self::DuplicateAsset { .. }
                | Self::InvalidSwapConfiguration { .. }
                | Self::InvalidLevel { .. }
        )
    }
}

/// Failures raised while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
