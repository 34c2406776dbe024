use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::DeployConfig;
use crate::domain::deploy::{BuildArtifact, DeploymentTarget};
use crate::error::{DeployError, PushError};
use crate::infrastructure::builder::ImageBuilder;
use crate::infrastructure::registry::{RegistryClient, RegistryCredentials};
use crate::ui;

pub async fn execute(
    app: String,
    platform: String,
    retries: Option<u32>,
    token: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let config = DeployConfig::load(config_path.as_deref()).map_err(DeployError::Config)?;
    let target = DeploymentTarget::resolve(&app, &platform, &config.registry)
        .map_err(DeployError::Config)?;

    ui::print_header("Push to Container Registry");
    info!("🎯 Target: {}", target.registry_host);
    info!("📦 Image: {}", target.tagged_ref());
    println!();

    // The image must exist locally; push does not build
    let builder = ImageBuilder::new();
    let image_ref = target.tagged_ref();
    let digest = builder.image_digest(&image_ref).await;
    if digest.is_none() {
        return Err(DeployError::Push(PushError::ImageNotFound { image_ref }).into());
    }

    let client = RegistryClient::new().with_retries(retries.unwrap_or(config.push.retries));

    match RegistryCredentials::discover(token, &config.registry.username) {
        Ok(credentials) => {
            client
                .login(&target.registry_host, &credentials)
                .await
                .map_err(DeployError::Push)?;
        }
        Err(_) => {
            warn!("REGISTRY_TOKEN not set, relying on existing registry login");
        }
    }

    let artifact = BuildArtifact {
        image_ref: target.tagged_ref(),
        digest,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Pushing {}...", artifact.image_ref));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let push_result = client.push(&artifact, &target).await;
    spinner.finish_and_clear();
    let attempts = push_result.map_err(DeployError::Push)?;

    ui::print_success(&format!(
        "Pushed {} ({} attempt{})",
        artifact.image_ref,
        attempts,
        if attempts == 1 { "" } else { "s" }
    ));
    println!();

    Ok(())
}
