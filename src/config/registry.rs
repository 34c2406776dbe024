//! Registry and platform endpoint configuration.

use serde::{Deserialize, Serialize};

/// Container registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry host (e.g. "registry.heroku.com")
    #[serde(default = "default_registry_host")]
    pub host: String,

    /// Username paired with the registry token. PaaS container
    /// registries commonly accept a fixed placeholder here.
    #[serde(default = "default_registry_username")]
    pub username: String,

    /// Process type segment of the image path (e.g. "web")
    #[serde(default = "default_process_type")]
    pub process_type: String,
}

fn default_registry_host() -> String {
    "registry.heroku.com".to_string()
}

fn default_registry_username() -> String {
    "_".to_string()
}

fn default_process_type() -> String {
    "web".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: default_registry_host(),
            username: default_registry_username(),
            process_type: default_process_type(),
        }
    }
}

/// Platform (PaaS) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform API, used for release status polling
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Platform CLI used to trigger releases
    #[serde(default = "default_cli_tool")]
    pub cli_tool: String,
}

fn default_api_url() -> String {
    "https://api.heroku.com".to_string()
}

fn default_cli_tool() -> String {
    "heroku".to_string()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            cli_tool: default_cli_tool(),
        }
    }
}
