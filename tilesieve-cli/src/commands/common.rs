//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use tilesieve::config::{parse_bbox, parse_buffer, parse_zoom_levels, SettingsOverrides};
use tilesieve::coord::GeoBoundingBox;

use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file overriding ~/.tilesieve/config.ini
    pub config: Option<PathBuf>,
    /// Force debug-level logging
    pub debug: bool,
}

/// Selection flags shared by `fetch` and `select`.
///
/// Every flag overrides the matching config file value.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: Option<GeoBoundingBox>,

    /// Zoom levels, e.g. "10,12" or "10-14"
    #[arg(long)]
    pub zoom: Option<String>,

    /// Also select tiles within this many tiles of each selected tile
    #[arg(long)]
    pub neighborhood: Option<u32>,

    /// Buffer distance around the geometry, in degrees
    #[arg(long, value_parser = parse_buffer)]
    pub buffer: Option<f64>,

    /// GeoJSON file restricting the selection
    #[arg(long)]
    pub geometry: Option<PathBuf>,
}

impl SelectionArgs {
    /// Converts the flags into settings overrides.
    pub fn to_overrides(&self) -> Result<SettingsOverrides, CliError> {
        let zoom_levels = self
            .zoom
            .as_deref()
            .map(parse_zoom_levels)
            .transpose()
            .map_err(|reason| CliError::Argument(format!("--zoom: {}", reason)))?;

        Ok(SettingsOverrides {
            bbox: self.bbox,
            zoom_levels,
            neighborhood: self.neighborhood,
            buffer: self.buffer,
            geometry: self.geometry.clone(),
            ..SettingsOverrides::default()
        })
    }
}
