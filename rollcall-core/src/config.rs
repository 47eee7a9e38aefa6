// JSON configuration file

use crate::classify::JunkRules;
use crate::error::ConfigError;
use crate::expand::ExpansionConfig;
use crate::orchestrator::RetryPolicy;
use crate::store::KeyPolicy;
use rollcall_driver::FormSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/rollcall/config.json";

/// Reference data locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory of municipality/county tables.
    pub reference_dir: PathBuf,
    /// Postal code listing.
    pub postal_file: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("csv-dataset"),
            postal_file: PathBuf::from("zip-database/zip-codes.txt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub results_dir: PathBuf,
    pub key: KeyPolicy,
    pub log_file: PathBuf,
    /// Where page dumps go when a session cannot be opened.
    pub artifact_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            key: KeyPolicy::default(),
            log_file: PathBuf::from("log.txt"),
            artifact_dir: PathBuf::from("."),
        }
    }
}

/// Everything configurable, each section defaulting independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    pub data: DataConfig,
    pub retry: RetryPolicy,
    pub junk: JunkRules,
    pub expansion: ExpansionConfig,
    pub store: StoreConfig,
    /// Lookup form description; `run` needs it unless `--dry-run` is given.
    pub driver: Option<FormSpec>,
}

impl RollcallConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// An explicit path must exist. Without one the default location is
    /// used when present, and built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = default_config_path();
                if default_path.is_file() {
                    Self::load(&default_path)
                } else {
                    debug!("No config at {}, using defaults", default_path.display());
                    Ok(Self::default())
                }
            }
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::ExpansionMode;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: RollcallConfig = serde_json::from_str(
            r#"{ "retry": { "recycle_every": 5 }, "store": { "key": "full" } }"#,
        )
        .unwrap();

        assert_eq!(config.retry.recycle_every, 5);
        assert_eq!(config.retry.max_junk_retries, 2);
        assert_eq!(config.store.key, KeyPolicy::Full);
        assert_eq!(config.store.results_dir, PathBuf::from("results"));
        assert_eq!(config.expansion.default_mode, ExpansionMode::DayWrap);
        assert_eq!(config.junk, JunkRules::default());
        assert!(config.driver.is_none());
    }

    #[test]
    fn test_expansion_mode_names() {
        let config: RollcallConfig =
            serde_json::from_str(r#"{ "expansion": { "default_mode": "single" } }"#).unwrap();
        assert_eq!(config.expansion.default_mode, ExpansionMode::Single);
    }
}
