use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::DeployConfig;
use crate::domain::deploy::DeploymentTarget;
use crate::error::{ConfigError, DeployError};
use crate::infrastructure::builder::ImageBuilder;
use crate::infrastructure::platform::PlatformClient;
use crate::infrastructure::registry::{RegistryClient, RegistryCredentials};
use crate::services::deploy_service::DeployService;
use crate::tools::{get_tool_path, tools};
use crate::ui;

pub async fn execute(
    app: String,
    platform: String,
    context: String,
    token: Option<String>,
    api_token: Option<String>,
    config_path: Option<String>,
) -> Result<()> {
    let config = DeployConfig::load(config_path.as_deref()).map_err(DeployError::Config)?;
    let target = DeploymentTarget::resolve(&app, &platform, &config.registry)
        .map_err(DeployError::Config)?;

    preflight(&config).map_err(DeployError::Config)?;

    let run_id = Uuid::new_v4();
    ui::print_header("Deploy");
    info!(run_id = %run_id, "🎯 Deploying {} ({})", target.app_name, target.platform);
    info!("📦 Image: {}", target.tagged_ref());
    println!();

    let api_token = PlatformClient::token_from_env(api_token).map_err(DeployError::Config)?;
    let platform_client = PlatformClient::new(&config.platform, &config.release, api_token)
        .map_err(DeployError::Release)?;

    let mut service = DeployService::new(
        ImageBuilder::new().with_context(context),
        RegistryClient::new().with_retries(config.push.retries),
        platform_client,
    );

    match RegistryCredentials::discover(token, &config.registry.username) {
        Ok(credentials) => service = service.with_credentials(credentials),
        Err(_) => warn!("REGISTRY_TOKEN not set, relying on existing registry login"),
    }

    let outcome = service.execute(&target).await?;

    info!(run_id = %run_id, "Deployed {}: {}", target.app_name, outcome.detail);
    Ok(())
}

/// Verify the external tools a deploy run needs are reachable.
///
/// A `{TOOL}_BIN` override is trusted as-is; otherwise the tool must
/// be on PATH.
fn preflight(config: &DeployConfig) -> Result<(), ConfigError> {
    for tool in [tools::DOCKER, config.platform.cli_tool.as_str()] {
        let resolved = get_tool_path(tool);
        if resolved == tool && which::which(tool).is_err() {
            return Err(ConfigError::ToolNotFound {
                tool: tool.to_string(),
                env_var: format!("{}_BIN", tool.to_uppercase()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preflight_reports_missing_tool() {
        let mut config = DeployConfig::default();
        config.platform.cli_tool = "definitely-not-a-real-cli".to_string();
        // docker may be absent too; either way the error names a tool
        let err = preflight(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ToolNotFound { .. }));
    }
}
