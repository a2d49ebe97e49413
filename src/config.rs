//! Machine configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. Command-line flags override file values.

use crate::word::Radix;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default memory size in bytes (512 words).
pub const DEFAULT_MEMORY_BYTES: usize = 1024;

/// Settings for one emulated machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Memory size in bytes. Must be even and non-zero.
    pub memory_bytes: usize,
    /// Stop after this many instructions, if set.
    pub max_cycles: Option<u64>,
    /// Number base used when rendering state.
    pub base: Radix,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_bytes: DEFAULT_MEMORY_BYTES,
            max_cycles: None,
            base: Radix::Hex,
        }
    }
}

impl MachineConfig {
    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::debug!("loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Errors from loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MachineConfig::default();
        assert_eq!(config.memory_bytes, 1024);
        assert_eq!(config.max_cycles, None);
        assert_eq!(config.base, Radix::Hex);
    }

    #[test]
    fn test_partial_json() {
        let config = MachineConfig::from_json(r#"{ "max_cycles": 500, "base": "dec" }"#).unwrap();
        assert_eq!(config.memory_bytes, DEFAULT_MEMORY_BYTES);
        assert_eq!(config.max_cycles, Some(500));
        assert_eq!(config.base, Radix::Dec);
    }

    #[test]
    fn test_invalid_json() {
        let err = MachineConfig::from_json(r#"{ "memory_bytes": "lots" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = MachineConfig::load("/nonexistent/zedecim.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
