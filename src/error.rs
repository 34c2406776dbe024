//! Centralized error types for slipway
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.
//! Each category maps to a distinct process exit code.

use thiserror::Error;

/// Top-level error type for deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Push error: {0}")]
    Push(#[from] PushError),

    #[error("Release error: {0}")]
    Release(#[from] ReleaseError),

    #[error("Deployment cancelled by operator")]
    Cancelled,
}

impl DeployError {
    /// Process exit code for this error category
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Build(_) => 3,
            Self::Push(_) => 4,
            Self::Release(_) => 5,
            Self::Cancelled => 130,
        }
    }
}

/// Configuration and operator input errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("App name must not be empty")]
    EmptyAppName,

    #[error("Invalid app name '{name}': {reason}")]
    InvalidAppName { name: String, reason: String },

    #[error("Required configuration missing: {field}")]
    MissingField { field: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("{tool} not found on PATH. Install it or set {env_var}")]
    ToolNotFound { tool: String, env_var: String },
}

/// Image build errors
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Image build failed for {image_ref} (exit code: {code:?}):\n{detail}")]
    BuildFailed {
        image_ref: String,
        code: Option<i32>,
        detail: String,
    },

    #[error("Failed to invoke build tool: {message}")]
    InvocationFailed { message: String },
}

/// Container registry push errors
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Registry authentication failed for {registry}: {detail}")]
    AuthenticationFailed { registry: String, detail: String },

    #[error("Push failed after {attempts} attempts: {detail}")]
    RetriesExhausted { attempts: u32, detail: String },

    #[error("Image not found locally: {image_ref}. Run 'slipway build' first")]
    ImageNotFound { image_ref: String },
}

/// Platform release errors
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Release did not reach a terminal state within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Platform rejected the release: {detail}")]
    Rejected { detail: String },

    #[error("Release trigger failed (exit code: {code:?}):\n{detail}")]
    TriggerFailed { code: Option<i32>, detail: String },

    #[error("Platform API error: {0}")]
    Api(String),
}

/// Resolve the exit code for an error chain
///
/// Commands propagate through anyhow; walk the chain to find the
/// typed error that decides the exit code. Unknown errors exit 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<DeployError>() {
            return e.exit_code();
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
        if cause.downcast_ref::<BuildError>().is_some() {
            return 3;
        }
        if cause.downcast_ref::<PushError>().is_some() {
            return 4;
        }
        if cause.downcast_ref::<ReleaseError>().is_some() {
            return 5;
        }
    }
    1
}
