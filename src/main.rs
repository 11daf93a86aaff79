//! awsmap - AWS network topology diagrams
//!
//! CLI entry point that dispatches to subcommands.

use awsmap::cli::commands::{self, MapSession};
use awsmap::cli::{Cli, Commands};
use awsmap::config::{Config, ConfigManager};
use awsmap::error::AwsmapResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("awsmap=warn"),
        1 => EnvFilter::new("awsmap=info"),
        _ => EnvFilter::new("awsmap=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

async fn run() -> AwsmapResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = manager.load().await?;
    cli.apply_overrides(&mut config);

    init_logging(cli.verbose, &config);
    awsmap::ui::init_theme();
    debug!(
        "profile={} region={} cache={}",
        config.aws.profile,
        config.aws.region,
        ConfigManager::cache_dir(&config).display()
    );

    match cli.command {
        Commands::Vpcs => commands::vpcs(&MapSession::from_config(&config, cli.dry_run)?).await,
        Commands::Subnets(args) => {
            commands::subnets(args, &MapSession::from_config(&config, cli.dry_run)?).await
        }
        Commands::Network => {
            commands::network(&MapSession::from_config(&config, cli.dry_run)?).await
        }
        Commands::DockerCompose(args) => {
            commands::docker_compose(args, &MapSession::from_config(&config, cli.dry_run)?).await
        }
        Commands::ClearCache(args) => commands::clear_cache(args, &config, cli.dry_run).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &manager).await,
    }
}
