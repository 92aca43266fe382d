//! On-disk tile cache with atomic writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::cache::path::{
    is_temp_file_name, parse_tile_file_name, provider_directory, tile_path, zoom_directory,
    TEMP_PREFIX, TEMP_SUFFIX,
};
use crate::cache::types::{CacheError, CacheStats};
use crate::coord::TileCoord;

/// Disk cache for fetched tiles.
///
/// The filesystem is the index: a tile is cached iff a regular file exists
/// at its canonical path. Writes go to a hidden temp file in the target
/// directory and are renamed into place, so readers never observe a
/// partially written tile.
#[derive(Debug, Clone)]
pub struct TileCache {
    /// Cache directory root
    root: PathBuf,
}

impl TileCache {
    /// Create a cache rooted at `root`. Nothing is touched until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path of a tile in this cache.
    pub fn path_for(&self, provider: &str, tile: &TileCoord) -> PathBuf {
        tile_path(&self.root, provider, tile)
    }

    /// Check whether a tile is already cached.
    pub fn exists(&self, provider: &str, tile: &TileCoord) -> bool {
        self.path_for(provider, tile).is_file()
    }

    /// [`exists`](Self::exists) for a batch of tiles, in order.
    pub fn exists_many(&self, provider: &str, tiles: &[TileCoord]) -> Vec<bool> {
        tiles.iter().map(|tile| self.exists(provider, tile)).collect()
    }

    /// Atomically write a tile and return its final path.
    ///
    /// Creates the zoom directory on first use. Concurrent writers to the
    /// same tile resolve last-rename-wins.
    pub fn store(
        &self,
        provider: &str,
        tile: &TileCoord,
        bytes: &[u8],
    ) -> Result<PathBuf, CacheError> {
        let dir = zoom_directory(&self.root, provider, tile.zoom);
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&dir)
            .map_err(|e| CacheError::io(&dir, e))?;

        temp.write_all(bytes)
            .map_err(|e| CacheError::io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(temp.path(), e))?;

        let path = tile_path(&self.root, provider, tile);
        temp.persist(&path)
            .map_err(|e| CacheError::io(&path, e.error))?;

        trace!(provider, tile = %tile, bytes = bytes.len(), "Stored tile");
        Ok(path)
    }

    /// Walk the cache and count tiles and bytes per provider and zoom.
    ///
    /// Entries that don't follow the cache layout are ignored.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats::default();

        for (provider, provider_dir) in self.provider_dirs()? {
            for (zoom, zoom_dir) in zoom_dirs(&provider_dir)? {
                for entry in read_dir(&zoom_dir)? {
                    let entry = entry.map_err(|e| CacheError::io(&zoom_dir, e))?;
                    let name = entry.file_name();
                    let Some(name) = name.to_str() else {
                        continue;
                    };

                    if is_temp_file_name(name) {
                        stats.temp_files += 1;
                        continue;
                    }
                    if parse_tile_file_name(name).is_none() {
                        continue;
                    }

                    let metadata = entry.metadata().map_err(|e| CacheError::io(entry.path(), e))?;
                    if !metadata.is_file() {
                        continue;
                    }

                    let usage = stats
                        .providers
                        .entry(provider.clone())
                        .or_default()
                        .entry(zoom)
                        .or_default();
                    usage.tiles += 1;
                    usage.bytes += metadata.len();
                }
            }
        }

        debug!(
            tiles = stats.total_tiles(),
            bytes = stats.total_bytes(),
            temp_files = stats.temp_files,
            "Scanned cache"
        );
        Ok(stats)
    }

    /// Remove temp files left behind by interrupted runs.
    ///
    /// Returns how many were removed. Must not run concurrently with a fetch
    /// into the same cache.
    pub fn clean_temp_files(&self) -> Result<usize, CacheError> {
        let mut removed = 0;

        for (_, provider_dir) in self.provider_dirs()? {
            for (_, zoom_dir) in zoom_dirs(&provider_dir)? {
                for entry in read_dir(&zoom_dir)? {
                    let entry = entry.map_err(|e| CacheError::io(&zoom_dir, e))?;
                    let is_temp = entry.file_name().to_str().is_some_and(is_temp_file_name);
                    if !is_temp {
                        continue;
                    }

                    let path = entry.path();
                    match fs::remove_file(&path) {
                        Ok(()) => removed += 1,
                        // Raced with another cleaner
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                        }
                    }
                }
            }
        }

        debug!(removed, "Cleaned temp files");
        Ok(removed)
    }

    /// Provider directories directly under the root.
    fn provider_dirs(&self) -> Result<Vec<(String, PathBuf)>, CacheError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in read_dir(&self.root)? {
            let entry = entry.map_err(|e| CacheError::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                dirs.push((name.to_string(), provider_directory(&self.root, name)));
            }
        }
        Ok(dirs)
    }
}

/// Zoom directories of one provider, skipping anything not named by a zoom level.
fn zoom_dirs(provider_dir: &Path) -> Result<Vec<(u8, PathBuf)>, CacheError> {
    let mut dirs = Vec::new();
    for entry in read_dir(provider_dir)? {
        let entry = entry.map_err(|e| CacheError::io(provider_dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(zoom) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
            dirs.push((zoom, path));
        }
    }
    Ok(dirs)
}

fn read_dir(dir: &Path) -> Result<fs::ReadDir, CacheError> {
    fs::read_dir(dir).map_err(|e| CacheError::io(dir, e))
}
