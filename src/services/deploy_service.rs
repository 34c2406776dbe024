//! Deploy service - orchestrates the deployment workflow
//!
//! Sequences build, push and release as a strict state machine:
//! Idle -> Building -> Pushing -> Releasing -> Done | Failed. Each
//! transition is gated on the prior step's success; the first failure
//! moves straight to Failed carrying the originating error. External
//! services own their own consistency, so there is no rollback.

use std::future::Future;
use std::time::Instant;

use colored::Colorize;
use tracing::{debug, info};

use crate::domain::deploy::{
    DeployPhase, DeployStep, DeploymentTarget, ReleaseOutcome, StepResult,
};
use crate::error::DeployError;
use crate::infrastructure::builder::ImageBuilder;
use crate::infrastructure::platform::PlatformClient;
use crate::infrastructure::registry::{RegistryClient, RegistryCredentials};
use crate::ui;

/// Service orchestrating a single deployment run
pub struct DeployService {
    builder: ImageBuilder,
    registry: RegistryClient,
    platform: PlatformClient,
    credentials: Option<RegistryCredentials>,
}

impl DeployService {
    pub fn new(builder: ImageBuilder, registry: RegistryClient, platform: PlatformClient) -> Self {
        Self {
            builder,
            registry,
            platform,
            credentials: None,
        }
    }

    /// Authenticate with the registry before pushing
    pub fn with_credentials(mut self, credentials: RegistryCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Execute the full deployment workflow for a resolved target.
    pub async fn execute(&self, target: &DeploymentTarget) -> Result<ReleaseOutcome, DeployError> {
        let total = DeployStep::SEQUENCE.len();
        let mut results: Vec<StepResult> = Vec::new();

        let mut phase = DeployPhase::Idle;
        debug!("Phase: {}", phase.name());

        // Build
        phase = DeployPhase::entering(DeployStep::Build);
        debug!("Phase: {}", phase.name());
        ui::print_stage(1, total, DeployStep::Build.name());
        let start = Instant::now();
        let artifact = match cancellable(self.builder.build(target)).await? {
            Ok(artifact) => {
                results.push(StepResult::success(DeployStep::Build, start.elapsed()));
                artifact
            }
            Err(e) => {
                return self.fail(DeployStep::Build, start, &mut results, target, e.into());
            }
        };

        // Push - only reached once the build reported success
        phase = DeployPhase::entering(DeployStep::Push);
        debug!("Phase: {}", phase.name());
        ui::print_stage(2, total, DeployStep::Push.name());
        let start = Instant::now();
        if let Some(credentials) = &self.credentials {
            if let Err(e) =
                cancellable(self.registry.login(&target.registry_host, credentials)).await?
            {
                return self.fail(DeployStep::Push, start, &mut results, target, e.into());
            }
        }
        match cancellable(self.registry.push(&artifact, target)).await? {
            Ok(attempts) => {
                debug!("Push confirmed after {} attempt(s)", attempts);
                results.push(StepResult::success(DeployStep::Push, start.elapsed()));
            }
            Err(e) => {
                return self.fail(DeployStep::Push, start, &mut results, target, e.into());
            }
        }

        // Release - only reached once the push confirmed completion
        phase = DeployPhase::entering(DeployStep::Release);
        debug!("Phase: {}", phase.name());
        ui::print_stage(3, total, DeployStep::Release.name());
        let start = Instant::now();
        let outcome = match cancellable(self.platform.release(target)).await? {
            Ok(outcome) => {
                results.push(StepResult::success(DeployStep::Release, start.elapsed()));
                outcome
            }
            Err(e) => {
                return self.fail(DeployStep::Release, start, &mut results, target, e.into());
            }
        };

        phase = DeployPhase::Done;
        self.print_summary(target, &results, phase);
        Ok(outcome)
    }

    fn fail<T>(
        &self,
        step: DeployStep,
        start: Instant,
        results: &mut Vec<StepResult>,
        target: &DeploymentTarget,
        err: DeployError,
    ) -> Result<T, DeployError> {
        results.push(StepResult::failure(step, start.elapsed(), err.to_string()));
        self.print_summary(target, results, DeployPhase::Failed(step));
        Err(err)
    }

    fn print_summary(&self, target: &DeploymentTarget, results: &[StepResult], phase: DeployPhase) {
        println!();
        println!(
            "{}",
            "════════════════════════════════════════════════════════════".bright_blue()
        );

        match phase {
            DeployPhase::Done => {
                println!(
                    "{}",
                    format!("✅ Deployment complete: {}", target.app_name)
                        .bright_green()
                        .bold()
                );
            }
            DeployPhase::Failed(step) => {
                println!(
                    "{}",
                    format!("❌ Deployment failed at {}: {}", step.name(), target.app_name)
                        .bright_red()
                        .bold()
                );
            }
            _ => {}
        }

        println!();
        for result in results {
            let status = if result.success { "✅" } else { "❌" };
            println!(
                "   {} {} ({:.1}s)",
                status,
                result.step.name(),
                result.duration.as_secs_f64()
            );
            if let Some(message) = &result.message {
                println!("      {}", message);
            }
        }
        println!();
    }
}

/// Run a step future, aborting on operator cancellation.
///
/// Dropping the step future kills the active subprocess
/// (kill_on_drop), so no orphaned external operation is left behind.
async fn cancellable<T>(fut: impl Future<Output = T>) -> Result<T, DeployError> {
    tokio::select! {
        result = fut => Ok(result),
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, aborting the active step");
            Err(DeployError::Cancelled)
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::config::{PlatformConfig, RegistryConfig, ReleasePollConfig};
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    fn target() -> DeploymentTarget {
        DeploymentTarget::resolve("pathfinder-alpha-goerli", "linux/amd64", &RegistryConfig::default())
            .unwrap()
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn platform_client(cli: &Path, api_url: &str) -> PlatformClient {
        let platform = PlatformConfig {
            api_url: api_url.to_string(),
            cli_tool: cli.to_str().unwrap().to_string(),
        };
        let poll = ReleasePollConfig {
            timeout_secs: 5,
            poll_interval_secs: 0,
        };
        PlatformClient::new(&platform, &poll, "tok".into()).unwrap()
    }

    /// Minimal platform API stub answering one request per body, in order.
    fn serve_release_states(bodies: Vec<&'static str>) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for body in bodies {
                let (mut stream, _) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_build_failure_stops_before_push() {
        let dir = tempfile::tempdir().unwrap();
        let push_log = dir.path().join("push.log");
        let release_log = dir.path().join("release.log");

        let build_tool = write_script(dir.path(), "build-tool", "exit 1");
        let push_tool = write_script(
            dir.path(),
            "push-tool",
            &format!("echo invoked >> {}", push_log.display()),
        );
        let release_cli = write_script(
            dir.path(),
            "release-cli",
            &format!("echo invoked >> {}", release_log.display()),
        );

        let service = DeployService::new(
            ImageBuilder::new().with_tool(build_tool.to_str().unwrap()),
            RegistryClient::new()
                .with_tool(push_tool.to_str().unwrap())
                .with_backoff(Duration::ZERO),
            platform_client(&release_cli, "http://127.0.0.1:1"),
        );

        let err = service.execute(&target()).await.unwrap_err();
        assert!(matches!(err, DeployError::Build(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(!push_log.exists(), "push must not run after a failed build");
        assert!(!release_log.exists(), "release must not run after a failed build");
    }

    #[tokio::test]
    async fn test_push_failure_stops_before_release() {
        let dir = tempfile::tempdir().unwrap();
        let push_log = dir.path().join("push.log");
        let release_log = dir.path().join("release.log");

        let push_tool = write_script(
            dir.path(),
            "push-tool",
            &format!("echo invoked >> {}\nexit 1", push_log.display()),
        );
        let release_cli = write_script(
            dir.path(),
            "release-cli",
            &format!("echo invoked >> {}", release_log.display()),
        );

        let service = DeployService::new(
            ImageBuilder::new().with_tool("true"),
            RegistryClient::new()
                .with_tool(push_tool.to_str().unwrap())
                .with_retries(3)
                .with_backoff(Duration::ZERO),
            platform_client(&release_cli, "http://127.0.0.1:1"),
        );

        let err = service.execute(&target()).await.unwrap_err();
        match err {
            DeployError::Push(crate::error::PushError::RetriesExhausted { attempts, .. }) => {
                assert_eq!(attempts, 4)
            }
            other => panic!("unexpected error: {other}"),
        }

        let push_attempts = std::fs::read_to_string(&push_log).unwrap().lines().count();
        assert_eq!(push_attempts, 4, "initial attempt plus three retries");
        assert!(
            !release_log.exists(),
            "release must not run after a failed push"
        );
    }

    #[tokio::test]
    async fn test_happy_path_reaches_done() {
        use crate::domain::deploy::ReleaseStatus;

        let dir = tempfile::tempdir().unwrap();
        let release_log = dir.path().join("release.log");
        let release_cli = write_script(
            dir.path(),
            "release-cli",
            &format!("echo invoked >> {}", release_log.display()),
        );
        // v41 is the pre-trigger baseline; v42 is the release this run
        // creates
        let api_url = serve_release_states(vec![
            r#"{"version": 41, "status": "succeeded"}"#,
            r#"{"version": 42, "status": "succeeded"}"#,
        ]);

        let service = DeployService::new(
            ImageBuilder::new().with_tool("true"),
            RegistryClient::new()
                .with_tool("true")
                .with_backoff(Duration::ZERO),
            platform_client(&release_cli, &api_url),
        );

        let outcome = service.execute(&target()).await.unwrap();
        assert_eq!(outcome.status, ReleaseStatus::Success);
        assert!(outcome.detail.contains("v42"), "detail: {}", outcome.detail);
        let triggers = std::fs::read_to_string(&release_log).unwrap().lines().count();
        assert_eq!(triggers, 1, "release trigger runs exactly once");
    }
}
