//! tilesieve CLI - Command-line interface
//!
//! This binary provides a command-line interface to the tilesieve library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::common::GlobalArgs;
use commands::fetch::FetchArgs;
use commands::select::SelectArgs;

#[derive(Parser)]
#[command(name = "tilesieve")]
#[command(version = tilesieve::VERSION)]
#[command(about = "Select map tiles for a region and cache them for offline use", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tilesieve/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select tiles and download them into the cache
    Fetch(FetchArgs),
    /// Count the tiles a fetch would cover, without downloading
    Select(SelectArgs),
    /// List configured providers and built-in presets
    Providers,
    /// Inspect or clean the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        config: cli.config,
        debug: cli.debug,
    };

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &global),
        Commands::Select(args) => commands::select::run(args, &global),
        Commands::Providers => commands::providers::run(&global),
        Commands::Cache { action } => commands::cache::run(action, &global),
    };

    if let Err(e) = result {
        e.exit();
    }
}
