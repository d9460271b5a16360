//! Cache command - inspect and manage the offline cache

use crate::app::start_router;
use crate::cache::{CacheRouter, CacheStorage, GenerationInfo, GenerationState, RouteTable};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::{self, CacheMode, Config, ConfigManager};
use crate::error::FestResult;
use crate::fetch::{Fetcher, NetworkFetcher};
use crate::ui::{self, TaskSpinner, UiContext};
use console::style;
use std::sync::Arc;
use std::time::Duration;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> FestResult<()> {
    match args.action {
        CacheAction::Status { format } => status(config, format).await,
        CacheAction::Classify { url } => classify(config, &url),
        CacheAction::Install => install(config).await,
        CacheAction::Clear { yes } => clear(config, yes).await,
    }
}

async fn status(config: &Config, format: OutputFormat) -> FestResult<()> {
    let storage = CacheStorage::new(ConfigManager::cache_dir_for(config));
    let generations = storage.generations().await?;

    match format {
        OutputFormat::Table => print_status_table(config, &storage, &generations),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&generations)?),
        OutputFormat::Plain => {
            for generation in &generations {
                println!("{}", generation.name);
            }
        }
    }

    Ok(())
}

fn print_status_table(config: &Config, storage: &CacheStorage, generations: &[GenerationInfo]) {
    let ctx = UiContext::detect();
    ui::key_value(&ctx, "Cache root", &storage.root().display().to_string());
    ui::key_value(&ctx, "Current generation", &config.cache.generation);
    let mode = match config.cache.mode {
        CacheMode::Tiered => "tiered",
        CacheMode::NetworkOnly => "network-only",
    };
    ui::key_value(&ctx, "Mode", mode);
    println!();

    if generations.is_empty() {
        ui::step_info(&ctx, "No cache generations on disk");
        return;
    }

    println!(
        "{:<30} {:<10} {:>8}",
        style("GENERATION").bold(),
        style("STATE").bold(),
        style("ENTRIES").bold()
    );
    println!("{}", "-".repeat(50));

    for generation in generations {
        let state = match generation.state {
            GenerationState::Complete => style("complete").green(),
            GenerationState::Building => style("building").yellow(),
        };
        let name = if generation.name == config.cache.generation {
            format!("{} *", generation.name)
        } else {
            generation.name.clone()
        };
        println!("{:<30} {:<10} {:>8}", name, state, generation.entries);
    }

    println!();
    println!("Total: {} generation(s)", generations.len());
}

fn classify(config: &Config, raw: &str) -> FestResult<()> {
    let url = config::resolve_asset(config, raw)?;
    let class = RouteTable::from_config(config)?.classify(&url);
    println!("{}\t{}", class, url);
    Ok(())
}

async fn install(config: &Config) -> FestResult<()> {
    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!(
        "Installing cache generation {}...",
        config.cache.generation
    ));

    let router = match start_router(config).await {
        Ok(router) => router,
        Err(e) => {
            spinner.stop_error("Cache install failed");
            return Err(e);
        }
    };

    if router.mode().await != config.cache.mode {
        spinner.stop_warn("Install failed; running network-only");
    } else {
        let entries = router
            .status()
            .await?
            .into_iter()
            .find(|g| g.name == router.generation())
            .map(|g| g.entries)
            .unwrap_or(0);
        spinner.stop(&format!(
            "Generation {} {} ({} entries)",
            router.generation(),
            router.state().await,
            entries
        ));
    }

    Ok(())
}

async fn clear(config: &Config, yes: bool) -> FestResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);

    if !ui::confirm(&ctx, "Remove every cache generation?", false).await? {
        ui::step_warn_hint(&ctx, "Nothing removed", "Use --yes to skip the prompt");
        return Ok(());
    }

    let network: Arc<dyn Fetcher> = Arc::new(NetworkFetcher::new(Duration::from_secs(
        config.general.timeout_secs,
    )));
    let storage = CacheStorage::new(ConfigManager::cache_dir_for(config));
    let router = CacheRouter::from_config(config, storage, network)?;

    let removed = router.clear().await?;
    ui::step_ok(&ctx, &format!("Removed {} cache generation(s)", removed));
    Ok(())
}
