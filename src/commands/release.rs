use anyhow::Result;
use tracing::info;

use crate::config::DeployConfig;
use crate::domain::deploy::DeploymentTarget;
use crate::error::DeployError;
use crate::infrastructure::platform::PlatformClient;
use crate::ui;

pub async fn execute(
    app: String,
    timeout: Option<u64>,
    api_token: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let config = DeployConfig::load(config_path.as_deref()).map_err(DeployError::Config)?;
    let target = DeploymentTarget::resolve(&app, "linux/amd64", &config.registry)
        .map_err(DeployError::Config)?;

    let mut poll = config.release.clone();
    if let Some(timeout_secs) = timeout {
        poll.timeout_secs = timeout_secs;
    }

    ui::print_header("Trigger Platform Release");
    info!("🎯 App: {}", target.app_name);
    info!("⚙️  Process type: {}", target.process_type);
    println!();

    let api_token = PlatformClient::token_from_env(api_token).map_err(DeployError::Config)?;
    let client =
        PlatformClient::new(&config.platform, &poll, api_token).map_err(DeployError::Release)?;

    let outcome = client.release(&target).await.map_err(DeployError::Release)?;

    ui::print_success(&outcome.detail);
    println!();

    Ok(())
}
