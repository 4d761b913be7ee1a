//! Engine configuration.
//!
//! Every tunable of the trial engine in one struct, loadable from TOML or
//! JSON. Missing fields fall back to the defaults below, so an empty file is
//! a valid configuration.
//!
//! ```toml
//! columns = 4
//! max_level = 5
//! study_ms = 30000
//! min_dwell_ms = 10000
//! tick_ms = 1000
//! pass_policy = "more_correct_than_incorrect"
//! require_selection = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::evaluate::PassPolicy;
use crate::level::{DEFAULT_COLUMNS, Level, MAX_COLUMNS, MAX_LEVEL};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Grid columns; rows equal the level number.
    pub columns: usize,
    /// Last level of the ladder.
    pub max_level: u8,
    /// Study-phase deadline in milliseconds.
    pub study_ms: u64,
    /// Minimum study time before the ready signal is honoured.
    pub min_dwell_ms: u64,
    /// Countdown tick interval.
    pub tick_ms: u64,
    pub pass_policy: PassPolicy,
    /// Ignore submit while nothing is selected.
    pub require_selection: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            max_level: MAX_LEVEL,
            study_ms: 30_000,
            min_dwell_ms: 10_000,
            tick_ms: 1_000,
            pass_policy: PassPolicy::default(),
            require_selection: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a file, choosing the format by extension (`.json`, otherwise TOML),
    /// and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };
        config.validated()
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(2..=MAX_COLUMNS).contains(&self.columns) {
            errors.push(format!(
                "columns must be in 2..={MAX_COLUMNS}, got {}",
                self.columns
            ));
        }
        if !(1..=MAX_LEVEL).contains(&self.max_level) {
            errors.push(format!(
                "max_level must be in 1..={MAX_LEVEL}, got {}",
                self.max_level
            ));
        }
        if self.study_ms == 0 {
            errors.push("study_ms must be > 0".into());
        }
        if self.tick_ms == 0 {
            errors.push("tick_ms must be > 0".into());
        }
        if self.min_dwell_ms > self.study_ms {
            errors.push(format!(
                "min_dwell_ms ({}) must not exceed study_ms ({})",
                self.min_dwell_ms, self.study_ms
            ));
        }

        errors
    }

    /// Return `self` if valid, otherwise every validation problem.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Last level as a typed [`Level`], clamped into the supported ladder.
    #[must_use]
    pub fn last_level(&self) -> Level {
        Level::new(self.max_level.clamp(1, MAX_LEVEL)).unwrap_or(Level::FIRST)
    }

    /// Largest grid the configured ladder needs.
    #[must_use]
    pub fn max_items(&self) -> usize {
        self.last_level().item_count(self.columns)
    }

    #[must_use]
    pub fn study_duration(&self) -> Duration {
        Duration::from_millis(self.study_ms)
    }

    #[must_use]
    pub fn min_dwell(&self) -> Duration {
        Duration::from_millis(self.min_dwell_ms)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.max_items(), 20);
        assert_eq!(config.study_duration(), Duration::from_secs(30));
        assert_eq!(config.min_dwell(), Duration::from_secs(10));
    }

    #[test]
    fn empty_toml_yields_defaults() {
        assert_eq!(
            EngineConfig::from_toml_str("").unwrap(),
            EngineConfig::default()
        );
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = EngineConfig::from_toml_str(
            "study_ms = 5000\npass_policy = \"half_coverage_no_false_positives\"\n",
        )
        .unwrap();
        assert_eq!(config.study_ms, 5000);
        assert_eq!(config.pass_policy, PassPolicy::HalfCoverageNoFalsePositives);
        assert_eq!(config.columns, DEFAULT_COLUMNS);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"colums": 3}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn validation_collects_every_problem() {
        let config = EngineConfig {
            columns: 1,
            max_level: 9,
            study_ms: 1000,
            min_dwell_ms: 2000,
            tick_ms: 0,
            ..EngineConfig::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(matches!(
            config.validated(),
            Err(ConfigError::Validation(list)) if list.len() == 4
        ));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let config = EngineConfig {
            columns: MAX_COLUMNS + 1,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("engine.json");
        std::fs::write(&json, r#"{"max_level": 3}"#).unwrap();
        assert_eq!(EngineConfig::load(&json).unwrap().max_level, 3);

        let toml_path = dir.path().join("engine.toml");
        std::fs::write(&toml_path, "tick_ms = 250\n").unwrap();
        assert_eq!(EngineConfig::load(&toml_path).unwrap().tick_ms, 250);

        std::fs::write(&toml_path, "study_ms = 0\n").unwrap();
        assert!(matches!(
            EngineConfig::load(&toml_path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn toml_output_parses_back() {
        let text = EngineConfig::default().to_toml_string().unwrap();
        assert_eq!(
            EngineConfig::from_toml_str(&text).unwrap(),
            EngineConfig::default()
        );
    }
}
