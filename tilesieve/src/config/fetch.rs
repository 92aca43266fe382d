//! Resolved settings for a fetch run.
//!
//! Values from the config file are overlaid with command-line overrides and
//! validated once, before any network activity.

use std::path::PathBuf;
use std::sync::Arc;

use super::download::DownloadConfig;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::{GeoBoundingBox, MAX_ZOOM};
use crate::geometry::{FeatureCollection, GeometryFilter};
use crate::provider::ProviderRegistry;
use crate::selection::TileSelector;

/// Command-line values that take precedence over the config file.
///
/// `None` (or an empty list) leaves the file value in place.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub bbox: Option<GeoBoundingBox>,
    pub zoom_levels: Option<Vec<u8>>,
    pub neighborhood: Option<u32>,
    pub buffer: Option<f64>,
    pub geometry: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    /// Restrict the run to these providers
    pub providers: Vec<String>,
}

/// Everything a fetch or select run needs, validated.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub bbox: GeoBoundingBox,
    pub zoom_levels: Vec<u8>,
    pub neighborhood: u32,
    pub buffer: Option<f64>,
    pub geometry: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub download: DownloadConfig,
    pub registry: ProviderRegistry,
    /// Empty means every enabled provider
    pub provider_filter: Vec<String>,
}

impl FetchSettings {
    /// Merges the config file with overrides and validates the result.
    ///
    /// # Errors
    ///
    /// - [`ConfigFileError::Missing`] without a bounding box or zoom levels
    /// - [`ConfigFileError::InvalidValue`] for out-of-range overrides
    /// - [`ConfigFileError::Provider`] for invalid provider definitions
    pub fn resolve(config: &ConfigFile, overrides: SettingsOverrides) -> Result<Self, ConfigFileError> {
        let bbox = overrides
            .bbox
            .or(config.region.bbox)
            .ok_or_else(|| ConfigFileError::Missing {
                section: "region".to_string(),
                key: "min_lon/min_lat/max_lon/max_lat".to_string(),
            })?;

        let zoom_levels = overrides
            .zoom_levels
            .unwrap_or_else(|| config.selection.zoom_levels.clone());
        if zoom_levels.is_empty() {
            return Err(ConfigFileError::Missing {
                section: "selection".to_string(),
                key: "zoom_levels".to_string(),
            });
        }
        if let Some(zoom) = zoom_levels.iter().find(|z| **z > MAX_ZOOM) {
            return Err(ConfigFileError::InvalidValue {
                section: "selection".to_string(),
                key: "zoom_levels".to_string(),
                value: zoom.to_string(),
                reason: format!("zoom must be at most {}", MAX_ZOOM),
            });
        }

        let buffer = overrides.buffer.or(config.selection.buffer);
        if let Some(b) = buffer {
            if !b.is_finite() || b < 0.0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "selection".to_string(),
                    key: "buffer".to_string(),
                    value: b.to_string(),
                    reason: "must be a non-negative number (degrees)".to_string(),
                });
            }
        }

        let mut download = DownloadConfig::from(&config.download);
        if let Some(concurrency) = overrides.concurrency {
            if concurrency == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "download".to_string(),
                    key: "concurrency".to_string(),
                    value: concurrency.to_string(),
                    reason: "must be a positive integer".to_string(),
                });
            }
            download = download.with_concurrency(concurrency);
        }

        let registry = ProviderRegistry::new(config.providers.iter().cloned())?;
        for name in &overrides.providers {
            if registry.get(name).is_none() {
                return Err(ConfigFileError::InvalidValue {
                    section: "provider".to_string(),
                    key: "name".to_string(),
                    value: name.clone(),
                    reason: "no such provider configured".to_string(),
                });
            }
        }

        Ok(Self {
            bbox,
            zoom_levels,
            neighborhood: overrides.neighborhood.unwrap_or(config.selection.neighborhood),
            buffer,
            geometry: overrides.geometry.or_else(|| config.selection.geometry.clone()),
            cache_dir: overrides
                .cache_dir
                .unwrap_or_else(|| config.cache.directory.clone()),
            download,
            registry,
            provider_filter: overrides.providers,
        })
    }

    /// Checks that at least one provider takes part in the run.
    pub fn require_providers(&self) -> Result<(), ConfigFileError> {
        let any = if self.provider_filter.is_empty() {
            self.registry.enabled().next().is_some()
        } else {
            true
        };
        if any {
            Ok(())
        } else {
            Err(ConfigFileError::Missing {
                section: "provider.<name>".to_string(),
                key: "url".to_string(),
            })
        }
    }

    /// Loads the geometry file, if any, and prepares it for the bounding box.
    pub fn load_filter(&self) -> Result<Option<GeometryFilter>, ConfigFileError> {
        let Some(path) = &self.geometry else {
            return Ok(None);
        };
        let (features, _summary) = FeatureCollection::load(path)?;
        Ok(Some(GeometryFilter::new(&features, &self.bbox, self.buffer)))
    }

    /// Builds the selector for this run, loading the geometry file.
    pub fn selector(&self) -> Result<TileSelector, ConfigFileError> {
        let mut selector = TileSelector::new(self.bbox).with_neighborhood(self.neighborhood);
        if let Some(filter) = self.load_filter()? {
            selector = selector.with_filter(Arc::new(filter));
        }
        Ok(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderSpec;
    use tempfile::TempDir;

    fn config() -> ConfigFile {
        let mut config = ConfigFile::default();
        config.region.bbox = Some(GeoBoundingBox::new(113.0, 22.0, 113.1, 22.1).unwrap());
        config.selection.zoom_levels = vec![10, 11];
        config.providers = vec![
            ProviderSpec::url("osm", "https://t.example/{z}/{x}/{y}.png"),
            ProviderSpec::url("spare", "https://s.example/{z}/{x}/{y}.png").disabled(),
        ];
        config
    }

    #[test]
    fn test_resolve_uses_file_values() {
        let settings = FetchSettings::resolve(&config(), SettingsOverrides::default()).unwrap();

        assert_eq!(settings.zoom_levels, vec![10, 11]);
        assert_eq!(settings.neighborhood, 0);
        assert_eq!(settings.download.concurrency(), 4);
        assert_eq!(settings.registry.len(), 2);
        assert!(settings.require_providers().is_ok());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = SettingsOverrides {
            zoom_levels: Some(vec![12]),
            neighborhood: Some(2),
            concurrency: Some(16),
            cache_dir: Some(PathBuf::from("/tmp/tiles")),
            providers: vec!["spare".to_string()],
            ..SettingsOverrides::default()
        };

        let settings = FetchSettings::resolve(&config(), overrides).unwrap();

        assert_eq!(settings.zoom_levels, vec![12]);
        assert_eq!(settings.neighborhood, 2);
        assert_eq!(settings.download.concurrency(), 16);
        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/tiles"));
        assert_eq!(settings.provider_filter, vec!["spare".to_string()]);
    }

    #[test]
    fn test_missing_bbox() {
        let mut config = config();
        config.region.bbox = None;

        let result = FetchSettings::resolve(&config, SettingsOverrides::default());

        assert!(matches!(result, Err(ConfigFileError::Missing { section, .. }) if section == "region"));
    }

    #[test]
    fn test_missing_zoom_levels() {
        let mut config = config();
        config.selection.zoom_levels.clear();

        let result = FetchSettings::resolve(&config, SettingsOverrides::default());

        assert!(matches!(result, Err(ConfigFileError::Missing { key, .. }) if key == "zoom_levels"));
    }

    #[test]
    fn test_zero_concurrency_override_is_invalid() {
        let overrides = SettingsOverrides {
            concurrency: Some(0),
            ..SettingsOverrides::default()
        };

        let err = FetchSettings::resolve(&config(), overrides).unwrap_err();
        assert!(err.to_string().contains("download.concurrency"));
    }

    #[test]
    fn test_unknown_provider_filter_is_invalid() {
        let overrides = SettingsOverrides {
            providers: vec!["bing".to_string()],
            ..SettingsOverrides::default()
        };

        assert!(matches!(
            FetchSettings::resolve(&config(), overrides),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_no_enabled_providers() {
        let mut config = config();
        config.providers = vec![ProviderSpec::url("spare", "https://s/{z}/{x}/{y}").disabled()];

        let settings = FetchSettings::resolve(&config, SettingsOverrides::default()).unwrap();

        assert!(matches!(
            settings.require_providers(),
            Err(ConfigFileError::Missing { .. })
        ));
    }

    #[test]
    fn test_invalid_provider_template_is_fatal() {
        let mut config = config();
        config.providers = vec![ProviderSpec::url("bad", "https://t/{z}/{x}")];

        assert!(matches!(
            FetchSettings::resolve(&config, SettingsOverrides::default()),
            Err(ConfigFileError::Provider(_))
        ));
    }

    #[test]
    fn test_selector_without_geometry_is_dense() {
        let settings = FetchSettings::resolve(&config(), SettingsOverrides::default()).unwrap();

        let selector = settings.selector().unwrap();

        assert!(selector.filter().is_none());
        assert_eq!(selector.select(10).unwrap().len(), 1);
    }

    #[test]
    fn test_selector_loads_geometry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("area.geojson");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[113.05,22.05]}}
            ]}"#,
        )
        .unwrap();
        let overrides = SettingsOverrides {
            geometry: Some(path),
            neighborhood: Some(1),
            ..SettingsOverrides::default()
        };
        let settings = FetchSettings::resolve(&config(), overrides).unwrap();

        let selector = settings.selector().unwrap();

        assert!(selector.filter().is_some());
        assert_eq!(selector.select(10).unwrap().len(), 9);
    }

    #[test]
    fn test_malformed_geometry_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.geojson");
        std::fs::write(&path, "{ not json").unwrap();
        let overrides = SettingsOverrides {
            geometry: Some(path),
            ..SettingsOverrides::default()
        };
        let settings = FetchSettings::resolve(&config(), overrides).unwrap();

        assert!(matches!(settings.selector(), Err(ConfigFileError::Geometry(_))));
    }
}
