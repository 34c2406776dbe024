//! Release trigger for the PaaS control plane
//!
//! Triggers a release through the platform CLI, then polls the
//! platform HTTP API until the release reaches a terminal state or the
//! poll window expires. The control plane's release mechanics stay
//! opaque; this module only coordinates.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::{PlatformConfig, ReleasePollConfig};
use crate::domain::deploy::{DeploymentTarget, ReleaseOutcome, ReleaseStatus};
use crate::error::{ConfigError, ReleaseError};
use crate::tools::get_tool_path;

/// Client for platform release operations
pub struct PlatformClient {
    cli: String,
    api_url: String,
    api_token: String,
    http: Client,
    timeout: Duration,
    poll_interval: Duration,
}

/// Release entry as reported by the platform API
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub version: u64,
    pub status: ReleaseState,
    #[serde(default)]
    pub description: String,
}

/// Remote release state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseState {
    Pending,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl PlatformClient {
    pub fn new(
        platform: &PlatformConfig,
        poll: &ReleasePollConfig,
        api_token: String,
    ) -> Result<Self, ReleaseError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ReleaseError::Api(e.to_string()))?;

        Ok(Self {
            cli: get_tool_path(&platform.cli_tool),
            api_url: platform.api_url.trim_end_matches('/').to_string(),
            api_token,
            http,
            timeout: Duration::from_secs(poll.timeout_secs),
            poll_interval: Duration::from_secs(poll.poll_interval_secs),
        })
    }

    /// Discover the platform API token.
    ///
    /// Priority: provided token parameter, then PLATFORM_API_TOKEN.
    /// The token is never logged.
    pub fn token_from_env(token: Option<String>) -> Result<String, ConfigError> {
        token
            .or_else(|| std::env::var("PLATFORM_API_TOKEN").ok())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingField {
                field: "PLATFORM_API_TOKEN".to_string(),
            })
    }

    /// Trigger a release and wait for it to reach a terminal state.
    ///
    /// The latest release version is snapshotted before triggering so a
    /// stale terminal record cannot be mistaken for the release this
    /// run created.
    pub async fn release(&self, target: &DeploymentTarget) -> Result<ReleaseOutcome, ReleaseError> {
        let baseline = self.latest_version(&target.app_name).await;
        self.trigger(target).await?;
        let outcome = self.await_terminal(target, baseline).await?;
        if outcome.status == ReleaseStatus::Failed {
            return Err(ReleaseError::Rejected {
                detail: outcome.detail,
            });
        }
        Ok(outcome)
    }

    async fn trigger(&self, target: &DeploymentTarget) -> Result<(), ReleaseError> {
        info!(
            "🚀 Releasing {} on {}",
            target.process_type, target.app_name
        );

        let output = Command::new(&self.cli)
            .args([
                "container:release",
                &target.process_type,
                "--app",
                &target.app_name,
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReleaseError::TriggerFailed {
                code: None,
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReleaseError::TriggerFailed {
                code: output.status.code(),
                detail: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    /// Version of the latest release, or 0 when none exists yet.
    async fn latest_version(&self, app_name: &str) -> u64 {
        self.latest_release(app_name)
            .await
            .map(|release| release.version)
            .unwrap_or(0)
    }

    /// Poll the platform API until a release newer than the baseline
    /// reaches a terminal state.
    async fn await_terminal(
        &self,
        target: &DeploymentTarget,
        baseline: u64,
    ) -> Result<ReleaseOutcome, ReleaseError> {
        let deadline = Instant::now() + self.timeout;
        info!(
            "⏳ Waiting up to {}s for the release to finish...",
            self.timeout.as_secs()
        );

        loop {
            let release = self.latest_release(&target.app_name).await?;
            if release.version <= baseline {
                // The record for the triggered release has not landed yet
                debug!("Latest release is still v{}", release.version);
            } else {
                match release.status {
                    ReleaseState::Succeeded => {
                        info!("✅ Release v{} is live", release.version);
                        return Ok(ReleaseOutcome::success(format!(
                            "release v{} succeeded",
                            release.version
                        )));
                    }
                    ReleaseState::Failed => {
                        return Ok(ReleaseOutcome::failed(format!(
                            "release v{} failed: {}",
                            release.version, release.description
                        )));
                    }
                    ReleaseState::Pending | ReleaseState::Unknown => {
                        debug!("Release v{} still pending", release.version);
                    }
                }
            }

            if Instant::now() + self.poll_interval >= deadline {
                return Err(ReleaseError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn latest_release(&self, app_name: &str) -> Result<ReleaseInfo, ReleaseError> {
        let url = format!("{}/apps/{}/releases/latest", self.api_url, app_name);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ReleaseError::Api(format!("release status request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReleaseError::Api(format!(
                "release status returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ReleaseError::Api(format!("failed to parse release status: {}", e)))
    }
}
