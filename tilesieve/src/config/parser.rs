//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::{GeoBoundingBox, MAX_ZOOM};
use crate::provider::{ProviderSource, ProviderSpec};

/// Prefix of per-provider sections, e.g. `[provider.satellite]`.
pub(super) const PROVIDER_SECTION_PREFIX: &str = "provider.";

/// Keys of a provider section that are not credentials.
const PROVIDER_RESERVED_KEYS: [&str; 4] = ["url", "preset", "subdomains", "enabled"];

const REGION_KEYS: [&str; 4] = ["min_lon", "min_lat", "max_lon", "max_lat"];

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [region] section
    if let Some(section) = ini.section(Some("region")) {
        config.region.bbox = parse_region(section)?;
    }

    // [selection] section
    if let Some(section) = ini.section(Some("selection")) {
        if let Some(v) = section.get("zoom_levels") {
            config.selection.zoom_levels = parse_zoom_levels(v)
                .map_err(|reason| invalid("selection", "zoom_levels", v, reason))?;
        }
        if let Some(v) = section.get("neighborhood") {
            config.selection.neighborhood = v.trim().parse().map_err(|_| {
                invalid("selection", "neighborhood", v, "must be a non-negative integer")
            })?;
        }
        if let Some(v) = section.get("buffer") {
            let v = v.trim();
            if !v.is_empty() {
                config.selection.buffer = Some(
                    parse_buffer(v).map_err(|reason| invalid("selection", "buffer", v, reason))?,
                );
            }
        }
        if let Some(v) = section.get("geometry") {
            let v = v.trim();
            if !v.is_empty() {
                config.selection.geometry = Some(expand_tilde(v));
            }
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout") {
            config.download.timeout = v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|t| *t > 0)
                .ok_or_else(|| invalid("download", "timeout", v, "must be a positive integer (seconds)"))?;
        }
        if let Some(v) = section.get("concurrency") {
            config.download.concurrency = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|c| *c > 0)
                .ok_or_else(|| invalid("download", "concurrency", v, "must be a positive integer"))?;
        }
        if let Some(v) = section.get("retries") {
            config.download.retries = v.trim().parse().map_err(|_| {
                invalid("download", "retries", v, "must be a non-negative integer")
            })?;
        }
        if let Some(v) = section.get("retry_base_delay_ms") {
            config.download.retry_base_delay_ms = v.trim().parse().map_err(|_| {
                invalid(
                    "download",
                    "retry_base_delay_ms",
                    v,
                    "must be a non-negative integer (milliseconds)",
                )
            })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    // [provider.<name>] sections
    for (name, section) in ini.iter() {
        let Some(provider) = name.and_then(|n| n.strip_prefix(PROVIDER_SECTION_PREFIX)) else {
            continue;
        };
        config.providers.push(parse_provider(provider, section)?);
    }

    Ok(config)
}

/// All four corners or none.
fn parse_region(section: &Properties) -> Result<Option<GeoBoundingBox>, ConfigFileError> {
    let present = REGION_KEYS.iter().filter(|k| section.get(**k).is_some()).count();
    if present == 0 {
        return Ok(None);
    }

    let mut values = [0.0f64; 4];
    for (slot, key) in values.iter_mut().zip(REGION_KEYS) {
        let v = section.get(key).ok_or_else(|| ConfigFileError::Missing {
            section: "region".to_string(),
            key: key.to_string(),
        })?;
        *slot = v
            .trim()
            .parse()
            .map_err(|_| invalid("region", key, v, "must be a number (degrees)"))?;
    }

    let [min_lon, min_lat, max_lon, max_lat] = values;
    GeoBoundingBox::new(min_lon, min_lat, max_lon, max_lat)
        .map(Some)
        .map_err(|e| {
            invalid(
                "region",
                "min_lon/min_lat/max_lon/max_lat",
                &format!("{}, {}, {}, {}", min_lon, min_lat, max_lon, max_lat),
                e.to_string(),
            )
        })
}

fn parse_provider(name: &str, section: &Properties) -> Result<ProviderSpec, ConfigFileError> {
    let section_name = format!("{}{}", PROVIDER_SECTION_PREFIX, name);

    let url = section.get("url").map(str::trim).filter(|v| !v.is_empty());
    let preset = section.get("preset").map(str::trim).filter(|v| !v.is_empty());
    let source = match (url, preset) {
        (Some(url), None) => ProviderSource::Url(url.to_string()),
        (None, Some(preset)) => ProviderSource::Preset(preset.to_string()),
        (Some(url), Some(_)) => {
            return Err(invalid(
                &section_name,
                "url",
                url,
                "set either 'url' or 'preset', not both",
            ))
        }
        (None, None) => {
            return Err(ConfigFileError::Missing {
                section: section_name,
                key: "url".to_string(),
            })
        }
    };

    let subdomains = section
        .get("subdomains")
        .map(parse_list)
        .unwrap_or_default();

    let enabled = match section.get("enabled") {
        Some(value) => {
            parse_bool(value).map_err(|reason| invalid(&section_name, "enabled", value, reason))?
        }
        None => true,
    };

    let mut credentials = BTreeMap::new();
    for (key, value) in section.iter() {
        if PROVIDER_RESERVED_KEYS.contains(&key) {
            continue;
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(invalid(&section_name, key, value, "credential is empty"));
        }
        credentials.insert(key.to_string(), value.to_string());
    }

    Ok(ProviderSpec {
        name: name.to_string(),
        source,
        subdomains,
        credentials,
        enabled,
    })
}

/// Parses a zoom list such as `10, 11, 13-15`.
///
/// Ranges are inclusive. Order is kept; a level listed twice is an error.
pub fn parse_zoom_levels(value: &str) -> Result<Vec<u8>, String> {
    let parse_zoom = |s: &str| -> Result<u8, String> {
        let zoom: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a zoom level", s.trim()))?;
        if zoom > MAX_ZOOM {
            return Err(format!("zoom {} exceeds maximum {}", zoom, MAX_ZOOM));
        }
        Ok(zoom)
    };

    let mut levels = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let range = match item.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse_zoom(start)?, parse_zoom(end)?);
                if start > end {
                    return Err(format!("range {} is reversed", item));
                }
                start..=end
            }
            None => {
                let zoom = parse_zoom(item)?;
                zoom..=zoom
            }
        };
        for zoom in range {
            if levels.contains(&zoom) {
                return Err(format!("zoom {} is listed twice", zoom));
            }
            levels.push(zoom);
        }
    }

    if levels.is_empty() {
        return Err("at least one zoom level is required".to_string());
    }
    Ok(levels)
}

/// Parses a buffer distance in degrees.
pub fn parse_buffer(value: &str) -> Result<f64, String> {
    let distance: f64 = value
        .trim()
        .parse()
        .map_err(|_| "must be a number (degrees)".to_string())?;
    if !distance.is_finite() || distance < 0.0 {
        return Err("must be a finite, non-negative number".to_string());
    }
    Ok(distance)
}

/// Parses a bounding box given as `min_lon,min_lat,max_lon,max_lat`.
pub fn parse_bbox(value: &str) -> Result<GeoBoundingBox, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| "expected four numbers: min_lon,min_lat,max_lon,max_lat".to_string())?;

    match parts.as_slice() {
        [min_lon, min_lat, max_lon, max_lat] => {
            GeoBoundingBox::new(*min_lon, *min_lat, *max_lon, *max_lat).map_err(|e| e.to_string())
        }
        _ => Err("expected four numbers: min_lon,min_lat,max_lon,max_lat".to_string()),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(super) fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err("expected true/false, yes/no, on/off or 1/0".to_string()),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse("").unwrap();

        assert!(config.region.bbox.is_none());
        assert!(config.selection.zoom_levels.is_empty());
        assert_eq!(config.selection.neighborhood, DEFAULT_NEIGHBORHOOD);
        assert_eq!(config.download.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.download.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.download.retries, DEFAULT_RETRIES);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
[region]
min_lon = 113.0
min_lat = 22.0
max_lon = 113.1
max_lat = 22.1

[selection]
zoom_levels = 10, 12-13
neighborhood = 1
buffer = 0.01
geometry = /data/waterways.geojson

[cache]
directory = /srv/tiles

[download]
timeout = 20
concurrency = 8
retries = 2
retry_base_delay_ms = 50

[logging]
file = /tmp/tilesieve.log

[provider.satellite]
preset = mapbox-satellite
mapbox_token = pk.abc

[provider.osm]
url = https://{s}.tile.example/{z}/{x}/{y}.png
subdomains = a, b, c
enabled = false
"#,
        )
        .unwrap();

        let bbox = config.region.bbox.unwrap();
        assert_eq!((bbox.min_lon, bbox.max_lat), (113.0, 22.1));
        assert_eq!(config.selection.zoom_levels, vec![10, 12, 13]);
        assert_eq!(config.selection.neighborhood, 1);
        assert_eq!(config.selection.buffer, Some(0.01));
        assert_eq!(
            config.selection.geometry,
            Some(PathBuf::from("/data/waterways.geojson"))
        );
        assert_eq!(config.cache.directory, PathBuf::from("/srv/tiles"));
        assert_eq!(config.download.timeout, 20);
        assert_eq!(config.download.concurrency, 8);
        assert_eq!(config.download.retries, 2);
        assert_eq!(config.download.retry_base_delay_ms, 50);
        assert_eq!(config.logging.file, PathBuf::from("/tmp/tilesieve.log"));

        assert_eq!(config.providers.len(), 2);
        let satellite = &config.providers[0];
        assert_eq!(satellite.name, "satellite");
        assert_eq!(
            satellite.source,
            ProviderSource::Preset("mapbox-satellite".to_string())
        );
        assert_eq!(satellite.credentials["mapbox_token"], "pk.abc");
        assert!(satellite.enabled);

        let osm = &config.providers[1];
        assert_eq!(osm.subdomains, vec!["a", "b", "c"]);
        assert!(!osm.enabled);
        assert!(osm.credentials.is_empty());
    }

    #[test]
    fn test_partial_region_is_missing_key() {
        let result = parse("[region]\nmin_lon = 1\nmin_lat = 2\nmax_lon = 3\n");
        match result {
            Err(ConfigFileError::Missing { section, key }) => {
                assert_eq!(section, "region");
                assert_eq!(key, "max_lat");
            }
            other => panic!("expected Missing, got {:?}", other),
        }
    }

    #[test]
    fn test_inverted_region_is_invalid() {
        let result = parse("[region]\nmin_lon = 3\nmin_lat = 2\nmax_lon = 1\nmax_lat = 4\n");
        assert!(matches!(result, Err(ConfigFileError::InvalidValue { .. })));
    }

    #[test]
    fn test_invalid_concurrency() {
        let err = parse("[download]\nconcurrency = 0\n").unwrap_err();
        assert!(err.to_string().contains("download.concurrency"));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = parse("[download]\ntimeout = soon\n").unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_provider_needs_url_or_preset() {
        let result = parse("[provider.empty]\nenabled = true\n");
        assert!(matches!(result, Err(ConfigFileError::Missing { .. })));

        let result = parse("[provider.both]\nurl = https://t/{z}/{x}/{y}\npreset = google-satellite\n");
        assert!(matches!(result, Err(ConfigFileError::InvalidValue { .. })));
    }

    #[test]
    fn test_misspelled_enabled_is_invalid() {
        let err = parse("[provider.osm]\nurl = https://t/{z}/{x}/{y}.png\nenabled = ture\n")
            .unwrap_err();

        match err {
            ConfigFileError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "enabled");
                assert_eq!(value, "ture");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_zoom_levels() {
        assert_eq!(parse_zoom_levels("10").unwrap(), vec![10]);
        assert_eq!(parse_zoom_levels("12, 10").unwrap(), vec![12, 10]);
        assert_eq!(parse_zoom_levels("8-10,15").unwrap(), vec![8, 9, 10, 15]);
        assert!(parse_zoom_levels("").is_err());
        assert!(parse_zoom_levels("23").is_err());
        assert!(parse_zoom_levels("12-10").is_err());
        assert!(parse_zoom_levels("10,10").is_err());
        assert!(parse_zoom_levels("ten").is_err());
    }

    #[test]
    fn test_buffer() {
        assert_eq!(parse_buffer("0.02").unwrap(), 0.02);
        assert_eq!(parse_buffer("0").unwrap(), 0.0);
        assert!(parse_buffer("-1").is_err());
        assert!(parse_buffer("NaN").is_err());
        assert!(parse_buffer("wide").is_err());
    }

    #[test]
    fn test_bbox() {
        let bbox = parse_bbox("113.0,22.0,113.1,22.1").unwrap();
        assert_eq!(bbox.max_lon, 113.1);
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("3,2,1,4").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("Yes"), Ok(true));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("false"), Ok(false));
        assert_eq!(parse_bool(" off "), Ok(false));
        assert!(parse_bool("ture").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("test/path"));
        }

        // Non-tilde paths should be unchanged
        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
