//! Festboard CLI entry point

use clap::Parser;
use console::style;
use festboard::cli::{commands, Cli, Commands};
use festboard::config::ConfigManager;
use festboard::error::FestResult;
use festboard::ui;
use std::process::ExitCode;
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

fn init_logging(verbose: u8, json: bool) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("festboard=warn"),
        1 => EnvFilter::new("festboard=info"),
        _ => EnvFilter::new("festboard=debug"),
    };

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run() -> FestResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Config commands load the file themselves; path and init work on a broken one
    if let Commands::Config(args) = cli.command {
        init_logging(cli.verbose, false);
        return commands::config(args, &config_manager).await;
    }

    let config = config_manager.load().await?;
    init_logging(cli.verbose, config.general.log_format == "json");
    ui::init_theme();

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Home(args) => commands::home(args, &config).await,
        Commands::Schedule(args) => commands::schedule(args, &config).await,
        Commands::Leaderboard(args) => commands::leaderboard(args, &config).await,
        Commands::Results(args) => commands::results(args, &config).await,
        Commands::Admin(args) => commands::admin(args, &config).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
    }
}
