use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::DeployConfig;
use crate::domain::deploy::DeploymentTarget;
use crate::error::DeployError;
use crate::infrastructure::builder::ImageBuilder;
use crate::ui;

pub async fn execute(
    app: String,
    platform: String,
    context: String,
    config_path: Option<String>,
) -> Result<()> {
    let config = DeployConfig::load(config_path.as_deref()).map_err(DeployError::Config)?;
    let target = DeploymentTarget::resolve(&app, &platform, &config.registry)
        .map_err(DeployError::Config)?;

    ui::print_header("Build Container Image");
    info!("🎯 App: {}", target.app_name);
    info!("📦 Image: {}", target.tagged_ref());
    info!("🏗️  Platform: {}", target.platform);
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Building image...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let builder = ImageBuilder::new().with_context(context);
    let artifact = builder.build(&target).await.map_err(DeployError::Build)?;

    spinner.finish_and_clear();

    ui::print_success(&format!("Built {}", artifact.image_ref));
    if let Some(digest) = &artifact.digest {
        info!("   Digest: {}", digest);
    }
    println!();

    Ok(())
}
