//! Feature collections loaded from GeoJSON.

use std::path::Path;

use geo::{Buffer, CoordsIter, Geometry, Intersects, MultiPolygon, Polygon, Validation};
use geojson::{JsonObject, JsonValue};
use tracing::{debug, info, warn};

use super::error::GeometryError;
use crate::coord::GeoBoundingBox;

/// A single vector feature: a planar geometry in lon/lat degrees plus its
/// GeoJSON properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Option<JsonObject>,
}

impl Feature {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: None,
        }
    }
}

/// Counts reported after loading a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Features kept.
    pub loaded: usize,
    /// Features dropped because they were malformed.
    pub skipped: usize,
}

/// Ordered, immutable set of features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Loads a GeoJSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its top level is not a
    /// GeoJSON FeatureCollection, Feature or Geometry. Malformed individual
    /// features are skipped with a warning instead.
    pub fn load(path: &Path) -> Result<(Self, LoadSummary), GeometryError> {
        let text = std::fs::read_to_string(path).map_err(|source| GeometryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (collection, summary) = Self::from_geojson_str(&text)?;
        info!(
            path = %path.display(),
            loaded = summary.loaded,
            skipped = summary.skipped,
            "Loaded geometry overlay"
        );
        Ok((collection, summary))
    }

    /// Parses a GeoJSON document held in memory.
    pub fn from_geojson_str(text: &str) -> Result<(Self, LoadSummary), GeometryError> {
        let value: JsonValue = serde_json::from_str(text)?;
        let JsonValue::Object(object) = value else {
            return Err(GeometryError::NotGeoJson(
                "top-level value must be an object".to_string(),
            ));
        };

        let kind = object
            .get("type")
            .and_then(JsonValue::as_str)
            .map(str::to_owned)
            .ok_or_else(|| GeometryError::NotGeoJson("missing \"type\" member".to_string()))?;

        let mut summary = LoadSummary::default();
        let mut features = Vec::new();

        match kind.as_str() {
            "FeatureCollection" => {
                let Some(JsonValue::Array(items)) = object.get("features") else {
                    return Err(GeometryError::NotGeoJson(
                        "FeatureCollection without a \"features\" array".to_string(),
                    ));
                };
                for (index, item) in items.iter().enumerate() {
                    match parse_feature(item.clone()) {
                        Ok(feature) => features.push(feature),
                        Err(reason) => {
                            warn!(index, reason = %reason, "Skipping malformed feature");
                            summary.skipped += 1;
                        }
                    }
                }
            }
            "Feature" => match parse_feature(JsonValue::Object(object)) {
                Ok(feature) => features.push(feature),
                Err(reason) => {
                    warn!(reason = %reason, "Skipping malformed feature");
                    summary.skipped += 1;
                }
            },
            _ => {
                let geometry = geojson::Geometry::from_json_value(JsonValue::Object(object))
                    .map_err(|e| GeometryError::NotGeoJson(e.to_string()))?;
                match convert_geometry(geometry) {
                    Ok(geometry) => features.push(Feature::new(geometry)),
                    Err(reason) => {
                        warn!(reason = %reason, "Skipping malformed geometry");
                        summary.skipped += 1;
                    }
                }
            }
        }

        summary.loaded = features.len();
        Ok((Self { features }, summary))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Keeps only features whose geometry intersects `bbox`.
    ///
    /// Applying this twice with the same box gives the same result as once.
    pub fn restrict_to_bbox(&self, bbox: &GeoBoundingBox) -> Self {
        let area = bbox.to_rect().to_polygon();
        let features: Vec<Feature> = self
            .features
            .iter()
            .filter(|f| area.intersects(&f.geometry))
            .cloned()
            .collect();

        debug!(
            before = self.features.len(),
            after = features.len(),
            bbox = %bbox,
            "Restricted features to bounding box"
        );
        Self { features }
    }

    /// Expands every geometry outward by `distance` coordinate units.
    ///
    /// For unprojected data the unit is degrees. A non-positive distance
    /// leaves the collection unchanged.
    pub fn buffer(&self, distance: f64) -> Self {
        if !(distance > 0.0) {
            return self.clone();
        }

        let features = self
            .features
            .iter()
            .map(|feature| {
                let buffered: MultiPolygon<f64> = feature.geometry.buffer(distance);
                if buffered.0.is_empty() {
                    warn!(distance, "Buffering produced an empty geometry, keeping original");
                    return feature.clone();
                }
                Feature {
                    geometry: Geometry::MultiPolygon(buffered),
                    properties: feature.properties.clone(),
                }
            })
            .collect();

        Self { features }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

/// True if the tile outline shares any point with any feature.
///
/// Touching at a single boundary point counts as intersecting.
pub fn tile_intersects(tile_polygon: &Polygon<f64>, features: &FeatureCollection) -> bool {
    features
        .iter()
        .any(|feature| tile_polygon.intersects(&feature.geometry))
}

fn parse_feature(value: JsonValue) -> Result<Feature, String> {
    let feature = geojson::Feature::from_json_value(value).map_err(|e| e.to_string())?;
    let geometry = feature
        .geometry
        .ok_or_else(|| "feature has no geometry".to_string())?;

    Ok(Feature {
        geometry: convert_geometry(geometry)?,
        properties: feature.properties,
    })
}

fn convert_geometry(geometry: geojson::Geometry) -> Result<Geometry<f64>, String> {
    let geometry = Geometry::<f64>::try_from(geometry.value).map_err(|e| e.to_string())?;

    if geometry.coords_count() == 0 {
        return Err("geometry has no coordinates".to_string());
    }
    if !geometry
        .coords_iter()
        .all(|c| c.x.is_finite() && c.y.is_finite())
    {
        return Err("geometry has non-finite coordinates".to_string());
    }
    if !geometry.is_valid() {
        return Err("geometry is not valid".to_string());
    }

    Ok(geometry)
}
