//! CLI definitions for slipway
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "slipway",
    version,
    about = "Container deployment orchestrator for PaaS releases",
    long_about = "Builds a container image, pushes it to the platform registry and\ntriggers a release, replacing the fragile shell script equivalent with\ntype-safe, testable code."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file (default: slipway.toml if present)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full deployment workflow: build, push, release
    Deploy {
        /// Application name on the platform
        #[arg(long, required = true)]
        app: String,

        /// Image platform passed to the build tool
        #[arg(long, default_value = "linux/amd64")]
        platform: String,

        /// Build context directory
        #[arg(long, default_value = ".")]
        context: String,

        /// Registry token (or set REGISTRY_TOKEN)
        #[arg(long, env = "REGISTRY_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Platform API token (or set PLATFORM_API_TOKEN)
        #[arg(long, env = "PLATFORM_API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,
    },

    /// Build the container image
    Build {
        /// Application name on the platform
        #[arg(long, required = true)]
        app: String,

        /// Image platform passed to the build tool
        #[arg(long, default_value = "linux/amd64")]
        platform: String,

        /// Build context directory
        #[arg(long, default_value = ".")]
        context: String,
    },

    /// Push the built image to the container registry
    Push {
        /// Application name on the platform
        #[arg(long, required = true)]
        app: String,

        /// Image platform (only used to resolve the image reference)
        #[arg(long, default_value = "linux/amd64")]
        platform: String,

        /// Retries on transient push failure
        #[arg(long)]
        retries: Option<u32>,

        /// Registry token (or set REGISTRY_TOKEN)
        #[arg(long, env = "REGISTRY_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Trigger a platform release and wait for it to finish
    Release {
        /// Application name on the platform
        #[arg(long, required = true)]
        app: String,

        /// Seconds to wait for a terminal release state
        #[arg(long)]
        timeout: Option<u64>,

        /// Platform API token (or set PLATFORM_API_TOKEN)
        #[arg(long, env = "PLATFORM_API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,
    },
}
