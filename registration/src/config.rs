//! Configuration management for the registration engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::catalog::ActivityCatalog;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default buffer size of the roster event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Errors from reading configuration values
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value of the wrong type
    #[error("Invalid value for {variable}: {value}")]
    InvalidValue {
        /// Variable name
        variable: &'static str,
        /// Offending value
        value: String,
    },

    /// The event channel needs room for at least one event
    #[error("REGISTRATION_EVENT_CAPACITY must be greater than zero")]
    ZeroEventCapacity,
}

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// JSON catalog definition; the built-in school catalog when unset
    pub catalog_path: Option<PathBuf>,
    /// Buffer size of the roster event channel
    pub event_capacity: usize,
    /// Log filter (trace, debug, info, warn, error or a directive list)
    pub log_level: String,
    /// Whether binaries install the Prometheus recorder
    pub metrics_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let event_capacity = match lookup("REGISTRATION_EVENT_CAPACITY") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                variable: "REGISTRATION_EVENT_CAPACITY",
                value,
            })?,
            None => defaults.event_capacity,
        };
        if event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }

        let metrics_enabled = match lookup("REGISTRATION_METRICS") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                variable: "REGISTRATION_METRICS",
                value,
            })?,
            None => defaults.metrics_enabled,
        };

        Ok(Self {
            catalog_path: lookup("REGISTRATION_CATALOG_PATH")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            event_capacity,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            metrics_enabled,
        })
    }

    /// Loads the configured catalog
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the definition file is unreadable or invalid.
    pub fn load_catalog(&self) -> Result<ActivityCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => ActivityCatalog::from_path(path),
            None => ActivityCatalog::school(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.load_catalog().unwrap().len(), 9);
    }

    #[test]
    fn test_reads_values() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("REGISTRATION_CATALOG_PATH", "/etc/activities.json"),
            ("REGISTRATION_EVENT_CAPACITY", "16"),
            ("REGISTRATION_METRICS", "false"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.catalog_path, Some(PathBuf::from("/etc/activities.json")));
        assert_eq!(config.event_capacity, 16);
        assert!(!config.metrics_enabled);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let result = EngineConfig::from_lookup(lookup(&[("REGISTRATION_EVENT_CAPACITY", "lots")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                variable: "REGISTRATION_EVENT_CAPACITY",
                value: "lots".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = EngineConfig::from_lookup(lookup(&[("REGISTRATION_EVENT_CAPACITY", "0")]));
        assert_eq!(result, Err(ConfigError::ZeroEventCapacity));
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = EngineConfig::from_lookup(lookup(&[(
            "REGISTRATION_CATALOG_PATH",
            "/nonexistent/activities.json",
        )]))
        .unwrap();
        assert!(matches!(config.load_catalog(), Err(CatalogError::Io(_))));
    }
}
