//! Deployment configuration
//!
//! Loaded from an optional `slipway.toml`; every field has a default so
//! the tool works without one. Credentials never live in the config
//! file: they come from the environment (REGISTRY_TOKEN,
//! PLATFORM_API_TOKEN) and are handed to components as explicit
//! structs at construction.

pub mod registry;

pub use registry::{PlatformConfig, RegistryConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "slipway.toml";

/// Top-level configuration for a deployment run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub release: ReleasePollConfig,
}

/// Push retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Retries after a transient push failure (backoff doubles per retry)
    #[serde(default = "default_push_retries")]
    pub retries: u32,
}

fn default_push_retries() -> u32 {
    3
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            retries: default_push_retries(),
        }
    }
}

/// Release status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasePollConfig {
    /// Seconds to wait for the release to reach a terminal state
    #[serde(default = "default_release_timeout")]
    pub timeout_secs: u64,

    /// Seconds between release status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_release_timeout() -> u64 {
    120
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for ReleasePollConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_release_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl DeployConfig {
    /// Load configuration
    ///
    /// An explicitly provided path must exist; otherwise the default
    /// config file is used when present and built-in defaults when not.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_config_file() {
        let config = DeployConfig::default();
        assert_eq!(config.registry.host, "registry.heroku.com");
        assert_eq!(config.registry.process_type, "web");
        assert_eq!(config.push.retries, 3);
        assert_eq!(config.release.timeout_secs, 120);
        assert_eq!(config.release.poll_interval_secs, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[registry]
host = "registry.example.com"
process_type = "worker"

[push]
retries = 5

[release]
timeout_secs = 60
"#
        )
        .unwrap();

        let config = DeployConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.registry.host, "registry.example.com");
        assert_eq!(config.registry.process_type, "worker");
        // Unspecified fields keep their defaults
        assert_eq!(config.registry.username, "_");
        assert_eq!(config.push.retries, 5);
        assert_eq!(config.release.timeout_secs, 60);
        assert_eq!(config.release.poll_interval_secs, 5);
        assert_eq!(config.platform.cli_tool, "heroku");
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let err = DeployConfig::load(Some("/nonexistent/slipway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        let err = DeployConfig::load(Some(file.path().to_str().unwrap())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
