//! Cache inspection CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use tilesieve::cache::{format_size, TileCache};

use super::common::GlobalArgs;
use crate::error::CliError;
use crate::runner::load_config;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show tile counts and sizes per provider and zoom level
    Stats {
        /// Cache root directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Print statistics as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Remove temp files left behind by interrupted runs.
    ///
    /// Do not run while a fetch is writing to the same cache.
    Clean {
        /// Cache root directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, global: &GlobalArgs) -> Result<(), CliError> {
    let config = load_config(global.config.as_deref())?;

    match action {
        CacheAction::Stats { cache_dir, json } => {
            let cache = TileCache::new(cache_dir.unwrap_or(config.cache.directory));
            let stats = cache.stats()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!("Tile cache: {}", cache.root().display());
            for (provider, zooms) in &stats.providers {
                let usage = stats.provider_usage(provider);
                println!(
                    "  {}: {} tiles, {}",
                    provider,
                    usage.tiles,
                    format_size(usage.bytes)
                );
                for (zoom, usage) in zooms {
                    println!(
                        "    z{:<3} {:>10} tiles {:>12}",
                        zoom,
                        usage.tiles,
                        format_size(usage.bytes)
                    );
                }
            }
            println!(
                "  Total: {} tiles, {}",
                stats.total_tiles(),
                format_size(stats.total_bytes())
            );
            if stats.temp_files > 0 {
                println!(
                    "  {} leftover temp files (run 'tilesieve cache clean')",
                    stats.temp_files
                );
            }
            Ok(())
        }
        CacheAction::Clean { cache_dir } => {
            let cache = TileCache::new(cache_dir.unwrap_or(config.cache.directory));
            println!("Cleaning temp files in: {}", cache.root().display());

            let removed = cache.clean_temp_files()?;
            println!("Removed {} temp files", removed);
            Ok(())
        }
    }
}
