//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use crate::coord::GeoBoundingBox;
use crate::provider::ProviderSpec;
use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Area of interest
    pub region: RegionSettings,
    /// Tile selection settings
    pub selection: SelectionSettings,
    /// Cache settings
    pub cache: CacheSettings,
    /// Download settings
    pub download: DownloadSettings,
    /// Logging settings
    pub logging: LoggingSettings,
    /// One entry per `[provider.<name>]` section, in file order
    pub providers: Vec<ProviderSpec>,
}

/// `[region]` section.
#[derive(Debug, Clone, Default)]
pub struct RegionSettings {
    /// Bounding box; `None` until all four corners are given
    pub bbox: Option<GeoBoundingBox>,
}

/// `[selection]` section.
#[derive(Debug, Clone, Default)]
pub struct SelectionSettings {
    /// Zoom levels in fetch order
    pub zoom_levels: Vec<u8>,
    /// Chebyshev radius added around each selected tile
    pub neighborhood: u32,
    /// Buffer distance applied to the geometry, in degrees
    pub buffer: Option<f64>,
    /// GeoJSON file restricting the selection
    pub geometry: Option<PathBuf>,
}

/// `[cache]` section.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Root of the tile cache
    pub directory: PathBuf,
}

/// `[download]` section.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// In-flight requests per provider
    pub concurrency: usize,
    /// Extra attempts for transport errors
    pub retries: u32,
    /// Delay before the first retry in milliseconds
    pub retry_base_delay_ms: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file, cleared at the start of each run
    pub file: PathBuf,
}
