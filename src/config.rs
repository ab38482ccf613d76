//! TOML configuration
//!
//! Looked up at `--config <path>` when given, otherwise at
//! `<config home>/perftrack/config.toml`. A missing default file means
//! defaults; a missing explicit file is an error.
//!
//! ```toml
//! [engine]
//! fiscal_year_start_month = 4
//! last_row = "zero"                 # or "carry_trailing_flows"
//! valuation_dating = "as_reported"  # or "previous_day"
//! days_per_year = 365.25
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::EngineConfig;
use crate::error::PerftrackError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
}

pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::config_home)
        .ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(config_dir.join("perftrack").join("config.toml"))
}

pub fn parse_config(text: &str) -> Result<Config> {
    let config: Config =
        toml::from_str(text).map_err(|e| PerftrackError::ConfigError(e.to_string()))?;
    config
        .engine
        .validate()
        .map_err(|e| PerftrackError::ConfigError(e.to_string()))?;
    Ok(config)
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                debug!("No config file at {:?}; using defaults", path);
                return Ok(Config::default());
            }
            path
        }
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config = parse_config(&text).with_context(|| format!("Invalid config file {:?}", path))?;
    info!("Loaded config from {:?}", path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LastRowPolicy, ValuationDating};
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[engine]\nfiscal_year_start_month = 1\nlast_row = \"carry_trailing_flows\"\nvaluation_dating = \"previous_day\"\ndays_per_year = 365"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.engine.fiscal_year_start_month, 1);
        assert_eq!(config.engine.last_row, LastRowPolicy::CarryTrailingFlows);
        assert_eq!(config.engine.valuation_dating, ValuationDating::PreviousDay);
        assert_eq!(config.engine.days_per_year, dec!(365));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config("[engine]\nfiscal_year_start_month = 14\n").unwrap_err();
        assert!(err.to_string().contains("fiscal year start month"));

        assert!(parse_config("[engine]\nlast_row = \"sometimes\"\n").is_err());
    }
}
