use std::path::PathBuf;

use swapgrid_core::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("results repository used before open")]
    RepositoryClosed,

    #[error("unsupported results file version {found} in {path}")]
    UnsupportedVersion { path: PathBuf, found: u64 },

    #[error("message channel disconnected")]
    Disconnected,
}

impl RuntimeError {
    /// Engine error carried by this failure, if any.
    #[must_use]
    pub fn engine(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}
