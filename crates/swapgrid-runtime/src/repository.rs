//! Persistence of level results.
//!
//! A [`ResultsRepository`] has an explicit lifecycle: `open` when the
//! session starts, `record` after each acknowledged level, `flush` once the
//! ladder is complete. The session never touches storage itself; the driver
//! routes [`Cmd::Record`](crate::Cmd::Record) and
//! [`Cmd::Finish`](crate::Cmd::Finish) here.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "info": { "task": "shapes", "started_at": "2026-10-19T09:30:00Z", "config": { ... } },
//!   "results": [ { "level": 1, "correct_selections": 2, ... } ],
//!   "summary": { "records": [ ... ], "summary": { ... } }
//! }
//! ```
//!
//! Writes use a temp-file-then-rename pattern to prevent corruption on crash.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swapgrid_core::{EngineConfig, LevelResult};

use crate::error::{Result, RuntimeError};
use crate::export::ExportTable;

/// Current file format version.
const FORMAT_VERSION: u64 = 1;

/// Metadata captured when a session opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Asset provider name (`shapes`, `images`, ...).
    pub task: String,
    pub started_at: DateTime<Utc>,
    pub config: EngineConfig,
}

impl SessionInfo {
    #[must_use]
    pub fn new(task: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            task: task.into(),
            started_at: Utc::now(),
            config,
        }
    }
}

/// Destination for completed level results.
pub trait ResultsRepository {
    fn open(&mut self, info: &SessionInfo) -> Result<()>;

    fn record(&mut self, result: &LevelResult) -> Result<()>;

    fn flush(&mut self, table: &ExportTable) -> Result<()>;
}

impl<R: ResultsRepository + ?Sized> ResultsRepository for Box<R> {
    fn open(&mut self, info: &SessionInfo) -> Result<()> {
        (**self).open(info)
    }

    fn record(&mut self, result: &LevelResult) -> Result<()> {
        (**self).record(result)
    }

    fn flush(&mut self, table: &ExportTable) -> Result<()> {
        (**self).flush(table)
    }
}

/// Everything a repository has seen for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub version: u64,
    pub info: SessionInfo,
    pub results: Vec<LevelResult>,
    /// Present once the session completed.
    pub summary: Option<ExportTable>,
}

impl StoredSession {
    fn new(info: SessionInfo) -> Self {
        Self {
            version: FORMAT_VERSION,
            info,
            results: Vec::new(),
            summary: None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    /// Export table for whatever was recorded, complete or not.
    #[must_use]
    pub fn table(&self) -> ExportTable {
        self.summary
            .clone()
            .unwrap_or_else(|| ExportTable::from_results(&self.results))
    }
}

/// In-memory repository for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    stored: Option<StoredSession>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stored(&self) -> Option<&StoredSession> {
        self.stored.as_ref()
    }

    #[must_use]
    pub fn results(&self) -> &[LevelResult] {
        self.stored
            .as_ref()
            .map(|s| s.results.as_slice())
            .unwrap_or_default()
    }
}

impl ResultsRepository for MemoryRepository {
    fn open(&mut self, info: &SessionInfo) -> Result<()> {
        self.stored = Some(StoredSession::new(info.clone()));
        Ok(())
    }

    fn record(&mut self, result: &LevelResult) -> Result<()> {
        let stored = self.stored.as_mut().ok_or(RuntimeError::RepositoryClosed)?;
        stored.results.push(result.clone());
        Ok(())
    }

    fn flush(&mut self, table: &ExportTable) -> Result<()> {
        let stored = self.stored.as_mut().ok_or(RuntimeError::RepositoryClosed)?;
        stored.summary = Some(table.clone());
        Ok(())
    }
}

/// JSON file repository; rewrites the file after every change so partial
/// sessions survive an abort.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    stored: Option<StoredSession>,
}

impl JsonFileRepository {
    /// The parent directory of `path` must already exist.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stored: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a stored session back.
    pub fn load(path: impl AsRef<Path>) -> Result<StoredSession> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let stored: StoredSession = serde_json::from_str(&content)?;
        if stored.version != FORMAT_VERSION {
            return Err(RuntimeError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: stored.version,
            });
        }
        Ok(stored)
    }

    fn write(&self) -> Result<()> {
        let Some(stored) = &self.stored else {
            return Err(RuntimeError::RepositoryClosed);
        };
        let json = serde_json::to_string_pretty(stored)?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes())?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            target: "swapgrid.repository",
            path = %self.path.display(),
            results = stored.results.len(),
            complete = stored.is_complete(),
            "results written"
        );
        Ok(())
    }
}

impl ResultsRepository for JsonFileRepository {
    fn open(&mut self, info: &SessionInfo) -> Result<()> {
        self.stored = Some(StoredSession::new(info.clone()));
        self.write()
    }

    fn record(&mut self, result: &LevelResult) -> Result<()> {
        let stored = self.stored.as_mut().ok_or(RuntimeError::RepositoryClosed)?;
        stored.results.push(result.clone());
        self.write()
    }

    fn flush(&mut self, table: &ExportTable) -> Result<()> {
        let stored = self.stored.as_mut().ok_or(RuntimeError::RepositoryClosed)?;
        stored.summary = Some(table.clone());
        self.write()
    }
}

#[cfg(test)]
mod tests {
    use swapgrid_core::Level;

    use super::*;

    fn result(level: u8) -> LevelResult {
        LevelResult {
            level: Level::new(level).unwrap(),
            correct_selections: 1,
            incorrect_selections: 0,
            total_moved: 2,
            score: 1,
            passed: true,
            pairs: Vec::new(),
        }
    }

    #[test]
    fn memory_repository_requires_open() {
        let mut repo = MemoryRepository::new();
        assert!(matches!(
            repo.record(&result(1)),
            Err(RuntimeError::RepositoryClosed)
        ));
        repo.open(&SessionInfo::new("shapes", EngineConfig::default()))
            .unwrap();
        repo.record(&result(1)).unwrap();
        assert_eq!(repo.results().len(), 1);
        assert!(!repo.stored().unwrap().is_complete());
    }

    #[test]
    fn file_repository_persists_partial_and_complete_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut repo = JsonFileRepository::new(&path);
        repo.open(&SessionInfo::new("images", EngineConfig::default()))
            .unwrap();
        repo.record(&result(1)).unwrap();

        let partial = JsonFileRepository::load(&path).unwrap();
        assert_eq!(partial.info.task, "images");
        assert_eq!(partial.results, vec![result(1)]);
        assert!(!partial.is_complete());
        assert_eq!(partial.table().summary.levels, 1);

        repo.record(&result(2)).unwrap();
        let table = ExportTable::from_results(&[result(1), result(2)]);
        repo.flush(&table).unwrap();

        let complete = JsonFileRepository::load(&path).unwrap();
        assert!(complete.is_complete());
        assert_eq!(complete.table(), table);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        let mut stored = StoredSession::new(SessionInfo::new("shapes", EngineConfig::default()));
        stored.version = 99;
        std::fs::write(&path, serde_json::to_string(&stored).unwrap()).unwrap();
        assert!(matches!(
            JsonFileRepository::load(&path),
            Err(RuntimeError::UnsupportedVersion { found: 99, .. })
        ));
    }
}
