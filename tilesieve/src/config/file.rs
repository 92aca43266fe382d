//! Configuration file handling for ~/.tilesieve/config.ini.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`], and parsing in [`super::parser`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;
use crate::coord::CoordError;
use crate::geometry::GeometryError;
use crate::provider::ProviderError;

/// Configuration errors. All of them are fatal before any tile is fetched.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Required setting absent from both file and command line
    #[error("Missing configuration: {section}.{key}")]
    Missing { section: String, key: String },

    /// Geometry file could not be loaded
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Provider definition rejected
    #[error("Invalid provider configuration: {0}")]
    Provider(#[from] ProviderError),

    /// Coordinates rejected
    #[error("Invalid coordinates: {0}")]
    Coord(#[from] CoordError),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilesieve/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(text).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }
}

/// Get the path to the config directory (~/.tilesieve).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilesieve")
}

/// Get the path to the config file (~/.tilesieve/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert!(config.region.bbox.is_none());
        assert!(config.providers.is_empty());
        assert_eq!(config.download.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.download.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.cache.directory, default_cache_directory());
        assert!(config.logging.file.ends_with("logs/tilesieve.log"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config.download.timeout, DEFAULT_TIMEOUT_SECS);
        assert!(config.selection.zoom_levels.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[selection]\nzoom_levels = 14\n\n[provider.google]\npreset = google-satellite\n",
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config.selection.zoom_levels, vec![14]);
        assert_eq!(config.providers.len(), 1);
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigFile::from_ini_str("[selection]\nneighborhood = -1\n").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid configuration: selection.neighborhood = '-1' - must be a non-negative integer"
        );
    }

    #[test]
    fn test_config_path_is_under_home() {
        assert!(config_file_path().ends_with(".tilesieve/config.ini"));
    }
}
