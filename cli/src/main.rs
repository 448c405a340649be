//! CLI entrypoint for toolwarden
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;
mod review;

use anyhow::Result;
use clap::Parser;
use commands::{Cli, Command};
use toolwarden_infrastructure::ConfigLoader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    // Keeps the background log writer alive until exit
    let _log_guard = match &cli.log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path.file_name().unwrap_or(path.as_os_str());
            let appender = tracing_appender::rolling::never(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    };

    info!("Starting toolwarden");

    match cli.command {
        Command::Config => {
            ConfigLoader::print_config_sources(cli.config.as_ref());
            let config = ConfigLoader::load(cli.config.as_ref())?;
            println!();
            println!("Effective configuration:");
            println!("{}", toml::to_string_pretty(&config)?);
            println!("Execution settings:");
            println!("{}", toml::to_string_pretty(&config.execution_settings()?)?);
        }
        Command::Review(args) => {
            let config = ConfigLoader::load(cli.config.as_ref())?;
            review::run(args, config).await?;
        }
    }

    Ok(())
}
