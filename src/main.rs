use clap::Parser;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod tools;
mod ui;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    let config_path = cli.config;
    let result = match cli.command {
        Commands::Deploy {
            app,
            platform,
            context,
            token,
            api_token,
        } => commands::deploy::execute(app, platform, context, token, api_token, config_path).await,
        Commands::Build {
            app,
            platform,
            context,
        } => commands::build::execute(app, platform, context, config_path).await,
        Commands::Push {
            app,
            platform,
            retries,
            token,
        } => commands::push::execute(app, platform, retries, token, config_path).await,
        Commands::Release {
            app,
            timeout,
            api_token,
        } => commands::release::execute(app, timeout, api_token, config_path).await,
    };

    if let Err(err) = result {
        ui::print_error(&format!("{:#}", err));
        std::process::exit(error::exit_code(&err));
    }
}
