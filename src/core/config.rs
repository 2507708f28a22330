//! Tool configuration
//!
//! Read from `config.yaml` in the state directory. Every field is optional;
//! a missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::plan::LaneFilter;

/// Config file name inside the state directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "WINGTRIM_STATE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tolerance in mm used instead of the one on the imported sheet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance_override: Option<f64>,

    /// Lanes the target plan covers by default, e.g. "ABC"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_lanes: Option<String>,
}

impl Config {
    /// Load `config.yaml` from a state directory
    pub fn load(state_dir: &Path) -> Result<Self, ConfigError> {
        let path = state_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Lane filter for plans; invalid or missing settings include all lanes
    pub fn lanes(&self) -> LaneFilter {
        match self.plan_lanes.as_deref().map(str::parse::<LaneFilter>) {
            Some(Ok(lanes)) => lanes,
            Some(Err(e)) => {
                tracing::warn!("Ignoring plan_lanes in config: {}", e);
                LaneFilter::all()
            }
            None => LaneFilter::all(),
        }
    }
}

/// State directory: explicit path, else the platform data directory
pub fn default_state_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "wingtrim")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".wingtrim"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Config::load(tmp.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_parse_fields() {
        let config = Config::parse(
            "tolerance_override: 8.5\nplan_lanes: AB\n",
            Path::new("config.yaml"),
        )
        .unwrap();
        assert_eq!(config.tolerance_override, Some(8.5));
        assert!(config.lanes().is_enabled('A'));
        assert!(!config.lanes().is_enabled('C'));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let err = Config::parse("tolerance_override: [", Path::new("c.yaml")).unwrap_err();
        assert!(err.to_string().contains("c.yaml"));
    }

    #[test]
    fn test_invalid_lanes_fall_back_to_all() {
        let config = Config {
            plan_lanes: Some("XYZ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.lanes(), LaneFilter::all());
    }
}
