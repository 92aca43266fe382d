//! Fetch command - select tiles and download them into the cache.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tilesieve::cache::{format_size, TileCache};
use tilesieve::config::FetchSettings;
use tilesieve::orchestrator::{FetchOrchestrator, FetchReport};
use tilesieve::provider::AsyncReqwestClient;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::common::{GlobalArgs, SelectionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Cache root directory
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// In-flight requests per provider
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Only fetch from this provider (repeatable)
    #[arg(long = "provider", value_name = "NAME")]
    pub providers: Vec<String>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Run the fetch command.
pub fn run(args: FetchArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(global.config.as_deref(), global.debug)?;
    runner.log_startup("fetch");

    let mut overrides = args.selection.to_overrides()?;
    overrides.cache_dir = args.cache_dir;
    overrides.concurrency = args.concurrency;
    overrides.providers = args.providers;

    // Everything below is validated before the first request goes out
    let settings = FetchSettings::resolve(runner.config(), overrides)?;
    settings.require_providers()?;
    let selector = settings.selector()?;

    let client = Arc::new(AsyncReqwestClient::with_timeout(settings.download.timeout())?);
    let providers = settings.registry.build_providers(
        client,
        settings.download.retry_policy(),
        &settings.provider_filter,
    )?;
    let provider_names: Vec<String> = providers.iter().map(|p| p.name().to_string()).collect();

    if !args.json {
        println!("Cache:       {}", settings.cache_dir.display());
        println!("Providers:   {}", provider_names.join(", "));
        println!("Zoom levels: {:?}", settings.zoom_levels);
        println!();
    }

    let orchestrator = FetchOrchestrator::new(
        TileCache::new(&settings.cache_dir),
        providers,
        selector,
        settings.zoom_levels.clone(),
    )
    .with_concurrency(settings.download.concurrency());

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let cancellation = CancellationToken::new();

    let report = runtime.block_on(async {
        let signal_token = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, waiting for in-flight fetches");
                signal_token.cancel();
            }
        });

        orchestrator.run(cancellation.clone()).await
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &provider_names);
    }

    if report.cancelled {
        info!("Run cancelled by user");
        return Err(CliError::Cancelled);
    }
    if report.is_degraded() {
        eprintln!();
        eprintln!(
            "Warning: no tiles were fetched and {} failed. Check the provider URL, credentials and network.",
            report.failed_count()
        );
    }

    Ok(())
}

fn print_report(report: &FetchReport, providers: &[String]) {
    println!(
        "{:<20} {:>4} {:>9} {:>9} {:>9} {:>7} {:>10}",
        "PROVIDER", "ZOOM", "SELECTED", "FETCHED", "CACHED", "FAILED", "SIZE"
    );
    for provider in providers {
        let Some(zooms) = report.providers.get(provider) else {
            continue;
        };
        for (zoom, stats) in zooms {
            println!(
                "{:<20} {:>4} {:>9} {:>9} {:>9} {:>7} {:>10}",
                provider,
                zoom,
                stats.selected,
                stats.success,
                stats.skipped,
                stats.failed,
                format_size(stats.bytes)
            );
        }
    }

    let totals = report.totals();
    println!();
    println!(
        "Fetched {} tiles ({}), {} already cached, {} failed in {:.1}s",
        totals.success,
        format_size(totals.bytes),
        totals.skipped,
        totals.failed,
        report.elapsed_ms as f64 / 1000.0
    );

    for abort in &report.aborted {
        println!(
            "Stopped {} at zoom {} after a cache write failure: {}",
            abort.provider, abort.zoom, abort.error
        );
    }
    if report.cancelled {
        println!("Run was cancelled; remaining tiles will be fetched on the next run.");
    }
}
