//! Deployment domain types
//!
//! Defines the deployment workflow as a state machine with explicit
//! phases, plus the values that flow between steps.

use std::time::Duration;

use crate::config::RegistryConfig;
use crate::error::ConfigError;

/// A logical deployment target resolved to concrete registry coordinates.
///
/// Immutable once constructed; created from operator-supplied
/// configuration and dropped at process exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Application name on the platform
    pub app_name: String,
    /// Image platform (e.g. "linux/amd64")
    pub platform: String,
    /// Registry host (e.g. "registry.heroku.com")
    pub registry_host: String,
    /// Process type segment of the image path (e.g. "web")
    pub process_type: String,
}

impl DeploymentTarget {
    /// Resolve an app name to concrete registry coordinates.
    ///
    /// Deterministic and idempotent: the same inputs always produce the
    /// same target. Rejects app names that are empty or would not form a
    /// valid registry path segment.
    pub fn resolve(
        app_name: &str,
        platform: &str,
        registry: &RegistryConfig,
    ) -> Result<Self, ConfigError> {
        if app_name.is_empty() {
            return Err(ConfigError::EmptyAppName);
        }

        let first = app_name.chars().next().unwrap();
        if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
            return Err(ConfigError::InvalidAppName {
                name: app_name.to_string(),
                reason: "must start with a lowercase letter or digit".to_string(),
            });
        }

        if let Some(bad) = app_name.chars().find(|c| !is_path_segment_char(*c)) {
            return Err(ConfigError::InvalidAppName {
                name: app_name.to_string(),
                reason: format!(
                    "'{}' is not valid in a registry path segment (allowed: a-z, 0-9, '-', '_', '.')",
                    bad
                ),
            });
        }

        Ok(Self {
            app_name: app_name.to_string(),
            platform: platform.to_string(),
            registry_host: registry.host.clone(),
            process_type: registry.process_type.clone(),
        })
    }

    /// Image reference without a tag: {host}/{app}/{process_type}
    pub fn image_ref(&self) -> String {
        format!("{}/{}/{}", self.registry_host, self.app_name, self.process_type)
    }

    /// Image reference with the release tag
    pub fn tagged_ref(&self) -> String {
        format!("{}:latest", self.image_ref())
    }
}

fn is_path_segment_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')
}

/// A successfully built image, ready to push.
///
/// Never persisted beyond process lifetime.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    /// Fully tagged image reference
    pub image_ref: String,
    /// Local image digest, when the build tool reports one
    pub digest: Option<String>,
}

/// Terminal status of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    Success,
    Failed,
}

/// Terminal value produced by the orchestrator
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub status: ReleaseStatus,
    pub detail: String,
}

impl ReleaseOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            status: ReleaseStatus::Success,
            detail: detail.into(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: ReleaseStatus::Failed,
            detail: detail.into(),
        }
    }
}

/// Individual steps in a deployment run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    Build,
    Push,
    Release,
}

impl DeployStep {
    /// Strict execution order; each step is gated on the prior one.
    pub const SEQUENCE: [DeployStep; 3] = [Self::Build, Self::Push, Self::Release];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Build => "Build",
            Self::Push => "Push",
            Self::Release => "Release",
        }
    }
}

/// Current phase of a deployment run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    Idle,
    Building,
    Pushing,
    Releasing,
    Done,
    Failed(DeployStep),
}

impl DeployPhase {
    /// Phase entered when a step starts executing
    pub fn entering(step: DeployStep) -> Self {
        match step {
            DeployStep::Build => Self::Building,
            DeployStep::Push => Self::Pushing,
            DeployStep::Release => Self::Releasing,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Pushing => "pushing",
            Self::Releasing => "releasing",
            Self::Done => "done",
            Self::Failed(_) => "failed",
        }
    }
}

/// Result of a single deployment step
#[derive(Debug)]
pub struct StepResult {
    pub step: DeployStep,
    pub success: bool,
    pub duration: Duration,
    pub message: Option<String>,
}

impl StepResult {
    pub fn success(step: DeployStep, duration: Duration) -> Self {
        Self {
            step,
            success: true,
            duration,
            message: None,
        }
    }

    pub fn failure(step: DeployStep, duration: Duration, message: impl Into<String>) -> Self {
        Self {
            step,
            success: false,
            duration,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RegistryConfig {
        RegistryConfig::default()
    }

    #[test]
    fn test_resolve_is_deterministic_and_idempotent() {
        let a = DeploymentTarget::resolve("pathfinder-alpha-goerli", "linux/amd64", &registry())
            .unwrap();
        let b = DeploymentTarget::resolve("pathfinder-alpha-goerli", "linux/amd64", &registry())
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.tagged_ref(),
            "registry.heroku.com/pathfinder-alpha-goerli/web:latest"
        );
    }

    #[test]
    fn test_resolve_rejects_empty_app_name() {
        let err = DeploymentTarget::resolve("", "linux/amd64", &registry()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyAppName));
    }

    #[test]
    fn test_resolve_rejects_invalid_characters() {
        for name in ["my app", "my/app", "MyApp", "app:tag", "-leading-dash"] {
            let result = DeploymentTarget::resolve(name, "linux/amd64", &registry());
            assert!(result.is_err(), "expected rejection for {:?}", name);
        }
    }

    #[test]
    fn test_resolve_accepts_segment_characters() {
        for name in ["app", "app-1", "app_v2", "app.staging", "0day"] {
            assert!(
                DeploymentTarget::resolve(name, "linux/amd64", &registry()).is_ok(),
                "expected acceptance for {:?}",
                name
            );
        }
    }

    #[test]
    fn test_step_sequence_order() {
        assert_eq!(
            DeployStep::SEQUENCE,
            [DeployStep::Build, DeployStep::Push, DeployStep::Release]
        );
    }

    #[test]
    fn test_phase_entering() {
        assert_eq!(DeployPhase::entering(DeployStep::Build), DeployPhase::Building);
        assert_eq!(DeployPhase::entering(DeployStep::Push), DeployPhase::Pushing);
        assert_eq!(
            DeployPhase::entering(DeployStep::Release),
            DeployPhase::Releasing
        );
    }
}
