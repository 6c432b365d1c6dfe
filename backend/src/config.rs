//! # Configuration
//!
//! Settings are read from a YAML file. Every field is optional, so an empty
//! file (or no file at all) gives the default setup:
//!
//! ```yaml
//! database_path: /var/lib/library/library.db
//! seed_data_dir: /var/lib/library/data
//! card_id_prefix: ID
//! card_id_width: 6
//! policy:
//!   loan_period_days: 14
//!   max_outstanding_loans: 3
//!   max_checkin_selections: 3
//!   daily_fine_rate: 0.25
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::models::CardIdFormat;
use crate::domain::CirculationPolicy;

/// Environment variable naming the config file when `--config` is not given
pub const CONFIG_ENV_VAR: &str = "LIBRARY_CIRCULATION_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub database_path: PathBuf,
    /// Directory holding the CSV files used by `init`
    pub seed_data_dir: PathBuf,
    pub card_id_prefix: String,
    pub card_id_width: usize,
    pub policy: CirculationPolicy,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        let card_format = CardIdFormat::default();
        Self {
            database_path: data_dir.join("library.db"),
            seed_data_dir: data_dir.join("data"),
            card_id_prefix: card_format.prefix,
            card_id_width: card_format.width,
            policy: CirculationPolicy::default(),
        }
    }
}

impl LibraryConfig {
    /// Load from `explicit`, else from the file named by
    /// `LIBRARY_CIRCULATION_CONFIG`, else fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        Self::load_from(explicit, from_env.as_deref())
    }

    fn load_from(explicit: Option<&Path>, from_env: Option<&Path>) -> Result<Self> {
        match explicit.or(from_env) {
            Some(path) => Self::from_file(path),
            None => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        let config = Self::from_yaml(&yaml).with_context(|| format!("parsing config file {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn card_id_format(&self) -> CardIdFormat {
        CardIdFormat {
            prefix: self.card_id_prefix.clone(),
            width: self.card_id_width,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("library-circulation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LibraryConfig::default();
        assert_eq!(config.card_id_format(), CardIdFormat::default());
        assert_eq!(config.policy, CirculationPolicy::default());
        assert!(config.database_path.ends_with("library-circulation/library.db"));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = LibraryConfig::from_yaml(
            "database_path: /tmp/lib.db\npolicy:\n  daily_fine_rate: 0.5\n",
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/lib.db"));
        assert_eq!(config.policy.daily_fine_rate, 0.5);
        assert_eq!(config.policy.loan_period_days, 14);
        assert_eq!(config.card_id_prefix, "ID");
    }

    #[test]
    fn test_explicit_path_wins_over_env() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = temp_dir.path().join("explicit.yaml");
        let from_env = temp_dir.path().join("env.yaml");
        fs::write(&explicit, "card_id_prefix: LB\n").unwrap();
        fs::write(&from_env, "card_id_prefix: EN\n").unwrap();

        let config = LibraryConfig::load_from(Some(&explicit), Some(&from_env)).unwrap();
        assert_eq!(config.card_id_prefix, "LB");

        let config = LibraryConfig::load_from(None, Some(&from_env)).unwrap();
        assert_eq!(config.card_id_prefix, "EN");

        let config = LibraryConfig::load_from(None, None).unwrap();
        assert_eq!(config, LibraryConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.yaml");
        assert!(LibraryConfig::load_from(Some(&missing), None).is_err());
    }
}
