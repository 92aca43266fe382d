//! Cache path construction and filename handling.

use crate::coord::TileCoord;
use std::path::{Path, PathBuf};

/// Extension of every cached tile.
pub const TILE_EXTENSION: &str = "png";

/// Prefix of in-progress writes. Hidden so they never look like tiles.
pub(crate) const TEMP_PREFIX: &str = ".";

/// Suffix of in-progress writes.
pub(crate) const TEMP_SUFFIX: &str = ".tmp";

/// Construct the full path for a cached tile.
///
/// Creates a hierarchical path structure:
/// ```text
/// <cache_dir>/<provider>/<zoom>/<x>_<y>.png
/// ```
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use tilesieve::cache::tile_path;
/// use tilesieve::coord::TileCoord;
///
/// let cache_dir = PathBuf::from("/cache");
/// let tile = TileCoord { zoom: 10, x: 833, y: 447 };
/// let path = tile_path(&cache_dir, "google-satellite", &tile);
///
/// assert_eq!(path, PathBuf::from("/cache/google-satellite/10/833_447.png"));
/// ```
pub fn tile_path(cache_dir: &Path, provider: &str, tile: &TileCoord) -> PathBuf {
    zoom_directory(cache_dir, provider, tile.zoom).join(tile_file_name(tile))
}

/// Get the directory holding all of a provider's tiles at one zoom level.
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use tilesieve::cache::zoom_directory;
///
/// let dir = zoom_directory(&PathBuf::from("/cache"), "osm", 12);
/// assert_eq!(dir, PathBuf::from("/cache/osm/12"));
/// ```
pub fn zoom_directory(cache_dir: &Path, provider: &str, zoom: u8) -> PathBuf {
    provider_directory(cache_dir, provider).join(zoom.to_string())
}

/// Get the provider directory path.
pub fn provider_directory(cache_dir: &Path, provider: &str) -> PathBuf {
    cache_dir.join(provider)
}

fn tile_file_name(tile: &TileCoord) -> String {
    format!("{}_{}.{}", tile.x, tile.y, TILE_EXTENSION)
}

/// Parses `<x>_<y>.png` back into its indices.
pub(crate) fn parse_tile_file_name(name: &str) -> Option<(u32, u32)> {
    let stem = name.strip_suffix(TILE_EXTENSION)?.strip_suffix('.')?;
    let (x, y) = stem.split_once('_')?;
    Some((x.parse().ok()?, y.parse().ok()?))
}

/// True for leftovers of interrupted writes.
pub(crate) fn is_temp_file_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}
