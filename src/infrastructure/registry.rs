//! Push coordinator for the container registry
//!
//! Pushes built images via the container tool, retrying transient
//! network failures with exponential backoff. Authentication failures
//! are terminal and never retried.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

use crate::domain::deploy::{BuildArtifact, DeploymentTarget};
use crate::error::{ConfigError, PushError};
use crate::infrastructure::retry::{retry_async, BackoffPolicy};
use crate::tools::{get_tool_path, tools};

/// Registry credentials for authentication
#[derive(Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub token: String,
}

impl RegistryCredentials {
    /// Discover the registry token.
    ///
    /// Priority: provided token parameter, then REGISTRY_TOKEN.
    /// The token is never logged.
    pub fn discover(token: Option<String>, username: &str) -> Result<Self, ConfigError> {
        token
            .or_else(|| std::env::var("REGISTRY_TOKEN").ok())
            .filter(|t| !t.is_empty())
            .map(|token| Self {
                username: username.to_string(),
                token,
            })
            .ok_or(ConfigError::MissingField {
                field: "REGISTRY_TOKEN".to_string(),
            })
    }
}

/// Client for container registry push operations
pub struct RegistryClient {
    tool: String,
    retries: u32,
    backoff: Duration,
}

impl RegistryClient {
    pub fn new() -> Self {
        Self {
            tool: get_tool_path(tools::DOCKER),
            retries: 3,
            backoff: Duration::from_secs(1),
        }
    }

    /// Override the container tool binary (used by tests)
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Set the retry count for transient failures
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the base backoff delay (used by tests)
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Authenticate with the registry, feeding the token over stdin so
    /// it never appears in the process list.
    pub async fn login(
        &self,
        host: &str,
        credentials: &RegistryCredentials,
    ) -> Result<(), PushError> {
        let auth_err = |detail: String| PushError::AuthenticationFailed {
            registry: host.to_string(),
            detail,
        };

        let mut child = Command::new(&self.tool)
            .args([
                "login",
                host,
                "--username",
                &credentials.username,
                "--password-stdin",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| auth_err(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(credentials.token.as_bytes())
                .await
                .map_err(|e| auth_err(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| auth_err(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(auth_err(stderr.trim().to_string()));
        }

        info!("🔐 Authenticated with {}", host);
        Ok(())
    }

    /// Push the artifact to the resolved registry location.
    ///
    /// Returns the number of push attempts on success. Transient
    /// failures are retried per the configured policy; authentication
    /// failures surface immediately.
    pub async fn push(
        &self,
        artifact: &BuildArtifact,
        target: &DeploymentTarget,
    ) -> Result<u32, PushError> {
        info!(
            "📤 Pushing {} ({} retries on transient failure)",
            artifact.image_ref, self.retries
        );

        let policy = BackoffPolicy {
            base: self.backoff,
            max_retries: self.retries,
        };

        let result = retry_async(
            || self.push_once(artifact),
            &policy,
            |e| matches!(e, PushFailure::Transient(_)),
        )
        .await;

        match result {
            Ok(((), attempts)) => {
                info!("✅ Pushed {} (attempt {})", artifact.image_ref, attempts);
                Ok(attempts)
            }
            Err((attempts, PushFailure::Auth(detail))) => {
                // Auth rejections can follow transient retries; keep the
                // attempt count visible
                let detail = if attempts > 1 {
                    format!("{} (after {} attempts)", detail, attempts)
                } else {
                    detail
                };
                Err(PushError::AuthenticationFailed {
                    registry: target.registry_host.clone(),
                    detail,
                })
            }
            Err((attempts, PushFailure::Transient(detail))) => {
                Err(PushError::RetriesExhausted { attempts, detail })
            }
        }
    }

    async fn push_once(&self, artifact: &BuildArtifact) -> Result<(), PushFailure> {
        let output = Command::new(&self.tool)
            .args(["push", &artifact.image_ref])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PushFailure::Transient(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            format!("exit code: {:?}", output.status.code())
        } else {
            stderr.trim().to_string()
        };
        Err(classify_push_failure(&detail))
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// One failed push attempt, split by whether a retry can help
#[derive(Debug)]
pub(crate) enum PushFailure {
    /// Logical rejection by the registry; retrying cannot succeed
    Auth(String),
    /// Presumed network-level failure; retriable
    Transient(String),
}

pub(crate) fn classify_push_failure(detail: &str) -> PushFailure {
    const AUTH_MARKERS: [&str; 4] = [
        "unauthorized",
        "authentication required",
        "access denied",
        "denied:",
    ];

    let lower = detail.to_lowercase();
    if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
        PushFailure::Auth(detail.to_string())
    } else {
        PushFailure::Transient(detail.to_string())
    }
}
