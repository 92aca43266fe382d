//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

/// Default per-request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default in-flight requests per provider.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Upper bound on per-provider concurrency; tile servers throttle well below this.
pub const MAX_CONCURRENCY: usize = 64;

/// Default extra attempts for transport errors.
pub const DEFAULT_RETRIES: u32 = 0;

/// Default delay before the first retry (milliseconds).
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;

/// Default neighborhood radius.
pub const DEFAULT_NEIGHBORHOOD: u32 = 0;

/// Default cache root (`<platform cache dir>/tilesieve`).
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tilesieve")
}

/// Default log file (`~/.tilesieve/logs/tilesieve.log`).
pub fn default_log_file() -> PathBuf {
    config_directory().join("logs").join("tilesieve.log")
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            retries: DEFAULT_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            region: RegionSettings::default(),
            selection: SelectionSettings {
                neighborhood: DEFAULT_NEIGHBORHOOD,
                ..SelectionSettings::default()
            },
            cache: CacheSettings::default(),
            download: DownloadSettings::default(),
            logging: LoggingSettings::default(),
            providers: Vec::new(),
        }
    }
}
