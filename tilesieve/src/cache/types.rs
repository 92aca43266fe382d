//! Error and statistics types for the tile cache.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Cache-related errors.
///
/// Any of these aborts the provider/zoom subtree that hit it.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Tile count and size for one provider at one zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoomUsage {
    pub tiles: u64,
    pub bytes: u64,
}

/// Snapshot of what the cache holds on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// provider → zoom → usage
    pub providers: BTreeMap<String, BTreeMap<u8, ZoomUsage>>,
    /// Leftover temp files from interrupted writes
    pub temp_files: u64,
}

impl CacheStats {
    pub fn total_tiles(&self) -> u64 {
        self.providers
            .values()
            .flat_map(|zooms| zooms.values())
            .map(|usage| usage.tiles)
            .sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.providers
            .values()
            .flat_map(|zooms| zooms.values())
            .map(|usage| usage.bytes)
            .sum()
    }

    /// Usage summed over all zoom levels of one provider.
    pub fn provider_usage(&self, provider: &str) -> ZoomUsage {
        self.providers
            .get(provider)
            .map(|zooms| {
                zooms.values().fold(ZoomUsage::default(), |acc, usage| ZoomUsage {
                    tiles: acc.tiles + usage.tiles,
                    bytes: acc.bytes + usage.bytes,
                })
            })
            .unwrap_or_default()
    }
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_sum_all_providers_and_zooms() {
        let mut stats = CacheStats::default();
        stats
            .providers
            .entry("a".to_string())
            .or_default()
            .insert(10, ZoomUsage { tiles: 2, bytes: 100 });
        stats
            .providers
            .entry("a".to_string())
            .or_default()
            .insert(11, ZoomUsage { tiles: 3, bytes: 50 });
        stats
            .providers
            .entry("b".to_string())
            .or_default()
            .insert(10, ZoomUsage { tiles: 1, bytes: 7 });

        assert_eq!(stats.total_tiles(), 6);
        assert_eq!(stats.total_bytes(), 157);
        assert_eq!(stats.provider_usage("a"), ZoomUsage { tiles: 5, bytes: 150 });
        assert_eq!(stats.provider_usage("missing"), ZoomUsage::default());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
