//! Configuration for tilesieve.
//!
//! The INI file at `~/.tilesieve/config.ini` is parsed into a
//! [`ConfigFile`], then merged with command-line overrides into
//! [`FetchSettings`], which is what a run actually consumes.
//!
//! # Example
//!
//! ```
//! use tilesieve::config::{ConfigFile, FetchSettings, SettingsOverrides};
//!
//! let config = ConfigFile::from_ini_str(
//!     "[region]\nmin_lon = 113.0\nmin_lat = 22.0\nmax_lon = 113.1\nmax_lat = 22.1\n\
//!      [selection]\nzoom_levels = 10-11\n\
//!      [provider.osm]\nurl = https://tile.example/{z}/{x}/{y}.png\n",
//! )
//! .unwrap();
//!
//! let settings = FetchSettings::resolve(&config, SettingsOverrides::default()).unwrap();
//! assert_eq!(settings.zoom_levels, vec![10, 11]);
//! ```

pub mod defaults;
mod download;
mod fetch;
mod file;
mod parser;
mod settings;

pub use download::DownloadConfig;
pub use fetch::{FetchSettings, SettingsOverrides};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use parser::{parse_bbox, parse_buffer, parse_zoom_levels};
pub use settings::{
    CacheSettings, ConfigFile, DownloadSettings, LoggingSettings, RegionSettings,
    SelectionSettings,
};
