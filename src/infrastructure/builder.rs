//! Image build invoker
//!
//! Wraps the external container build tool as a subprocess. Single
//! responsibility: produce a tagged image for the target's platform.

use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::deploy::{BuildArtifact, DeploymentTarget};
use crate::error::BuildError;
use crate::tools::{get_tool_path, tools};

/// Wrapper around the container build tool
pub struct ImageBuilder {
    tool: String,
    context_dir: String,
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            tool: get_tool_path(tools::DOCKER),
            context_dir: ".".to_string(),
        }
    }

    /// Override the build tool binary (used by tests)
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Set the build context directory
    pub fn with_context(mut self, context_dir: impl Into<String>) -> Self {
        self.context_dir = context_dir.into();
        self
    }

    /// Build a tagged image for the target's platform.
    ///
    /// Captured subprocess output is surfaced as the error detail on a
    /// non-zero exit.
    pub async fn build(&self, target: &DeploymentTarget) -> Result<BuildArtifact, BuildError> {
        let image_ref = target.tagged_ref();
        info!("🔨 Building {} for {}", image_ref, target.platform);

        let output = Command::new(&self.tool)
            .args([
                "build",
                "--platform",
                &target.platform,
                "-t",
                &image_ref,
                &self.context_dir,
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BuildError::InvocationFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(BuildError::BuildFailed {
                image_ref,
                code: output.status.code(),
                detail: captured_output(&output.stdout, &output.stderr),
            });
        }

        let digest = self.image_digest(&image_ref).await;
        if let Some(ref digest) = digest {
            debug!("Image digest: {}", digest);
        }

        Ok(BuildArtifact { image_ref, digest })
    }

    /// Look up the local digest of an image, if the tool can report one.
    pub async fn image_digest(&self, image_ref: &str) -> Option<String> {
        let output = Command::new(&self.tool)
            .args(["image", "inspect", "--format", "{{.Id}}", image_ref])
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!id.is_empty()).then_some(id)
    }
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn captured_output(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);
    let combined = format!("{}\n{}", stdout.trim(), stderr.trim());
    combined.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;

    fn target() -> DeploymentTarget {
        DeploymentTarget::resolve("pathfinder-alpha-goerli", "linux/amd64", &RegistryConfig::default())
            .unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_failure_surfaces_exit_code() {
        let builder = ImageBuilder::new().with_tool("false");
        let err = builder.build(&target()).await.unwrap_err();
        match err {
            BuildError::BuildFailed { image_ref, code, .. } => {
                assert_eq!(
                    image_ref,
                    "registry.heroku.com/pathfinder-alpha-goerli/web:latest"
                );
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_success_without_digest() {
        // `true` exits 0 and prints nothing, so inspect yields no digest
        let builder = ImageBuilder::new().with_tool("true");
        let artifact = builder.build(&target()).await.unwrap();
        assert_eq!(
            artifact.image_ref,
            "registry.heroku.com/pathfinder-alpha-goerli/web:latest"
        );
        assert!(artifact.digest.is_none());
    }

    #[tokio::test]
    async fn test_missing_tool_is_invocation_failure() {
        let builder = ImageBuilder::new().with_tool("definitely-not-a-real-build-tool");
        let err = builder.build(&target()).await.unwrap_err();
        assert!(matches!(err, BuildError::InvocationFailed { .. }));
    }

    #[test]
    fn test_captured_output_merges_streams() {
        assert_eq!(captured_output(b"out\n", b"err\n"), "out\nerr");
        assert_eq!(captured_output(b"", b"err only"), "err only");
        assert_eq!(captured_output(b"", b""), "");
    }
}
