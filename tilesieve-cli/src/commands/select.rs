//! Select command - count the tiles a fetch would cover, without network.

use clap::Args;
use serde_json::json;
use tilesieve::config::{ConfigFileError, FetchSettings};

use super::common::{GlobalArgs, SelectionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the select command.
#[derive(Debug, Args)]
pub struct SelectArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print the counts as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Run the select command.
pub fn run(args: SelectArgs, global: &GlobalArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(global.config.as_deref(), global.debug)?;
    runner.log_startup("select");

    let settings = FetchSettings::resolve(runner.config(), args.selection.to_overrides()?)?;
    let selector = settings.selector()?;
    let plan = selector
        .plan(&settings.zoom_levels)
        .map_err(ConfigFileError::from)?;
    let total: usize = plan.iter().map(|(_, count)| count).sum();

    if args.json {
        let zooms: Vec<_> = plan
            .iter()
            .map(|(zoom, tiles)| json!({ "zoom": zoom, "tiles": tiles }))
            .collect();
        let output = json!({
            "bbox": [
                settings.bbox.min_lon,
                settings.bbox.min_lat,
                settings.bbox.max_lon,
                settings.bbox.max_lat,
            ],
            "neighborhood": settings.neighborhood,
            "buffer": settings.buffer,
            "geometry": settings.geometry.as_ref().map(|p| p.display().to_string()),
            "zooms": zooms,
            "total": total,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Region: {:.6},{:.6} to {:.6},{:.6}",
        settings.bbox.min_lon, settings.bbox.min_lat, settings.bbox.max_lon, settings.bbox.max_lat
    );
    match &settings.geometry {
        Some(path) => println!(
            "Geometry: {} (buffer {})",
            path.display(),
            settings.buffer.map_or("none".to_string(), |b| format!("{} deg", b))
        ),
        None => println!("Geometry: none (dense grid)"),
    }
    println!("Neighborhood: {}", settings.neighborhood);
    println!();
    println!("{:>4} {:>12}", "ZOOM", "TILES");
    for (zoom, tiles) in &plan {
        println!("{:>4} {:>12}", zoom, tiles);
    }
    println!("{:>4} {:>12}", "", total);

    Ok(())
}
