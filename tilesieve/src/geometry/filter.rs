//! Prepared geometry filter used during tile selection.

use geo::{BoundingRect, Intersects};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::collection::FeatureCollection;
use crate::coord::{tile_bounds, tile_polygon, GeoBoundingBox, TileCoord};

/// Envelope of one feature, pointing back into the feature list.
#[derive(Debug, Clone)]
struct FeatureEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Feature set restricted to the area of interest, optionally buffered, and
/// indexed by envelope so a tile is only tested against nearby features.
pub struct GeometryFilter {
    features: FeatureCollection,
    index: RTree<FeatureEnvelope>,
    buffer_distance: Option<f64>,
}

impl GeometryFilter {
    /// Prepares `features` for selection over `bbox`.
    ///
    /// Features are first restricted to the box (grown by the buffer
    /// distance, so features just outside whose buffer reaches in are kept)
    /// and then buffered.
    pub fn new(features: &FeatureCollection, bbox: &GeoBoundingBox, buffer: Option<f64>) -> Self {
        let buffer_distance = buffer.filter(|d| *d > 0.0);

        let area = match buffer_distance {
            Some(d) => GeoBoundingBox {
                min_lon: bbox.min_lon - d,
                min_lat: bbox.min_lat - d,
                max_lon: bbox.max_lon + d,
                max_lat: bbox.max_lat + d,
            },
            None => *bbox,
        };

        let restricted = features.restrict_to_bbox(&area);
        let prepared = match buffer_distance {
            Some(d) => restricted.buffer(d),
            None => restricted,
        };

        info!(
            total = features.len(),
            kept = prepared.len(),
            buffer = ?buffer_distance,
            "Prepared geometry filter"
        );

        Self::build(prepared, buffer_distance)
    }

    /// Wraps features that are already restricted and buffered.
    pub fn from_prepared(features: FeatureCollection) -> Self {
        Self::build(features, None)
    }

    fn build(features: FeatureCollection, buffer_distance: Option<f64>) -> Self {
        let envelopes = features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                feature.geometry.bounding_rect().map(|rect| FeatureEnvelope {
                    index,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self {
            features,
            index: RTree::bulk_load(envelopes),
            buffer_distance,
        }
    }

    /// True if the tile's outline intersects any prepared feature.
    pub fn matches(&self, tile: &TileCoord) -> bool {
        let bounds = tile_bounds(tile);
        let envelope = AABB::from_corners(
            [bounds.min_lon, bounds.min_lat],
            [bounds.max_lon, bounds.max_lat],
        );

        let mut candidates = self.index.locate_in_envelope_intersecting(&envelope).peekable();
        if candidates.peek().is_none() {
            return false;
        }

        let polygon = tile_polygon(tile);
        candidates.any(|candidate| {
            polygon.intersects(&self.features.features()[candidate.index].geometry)
        })
    }

    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    pub fn buffer_distance(&self) -> Option<f64> {
        self.buffer_distance
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl std::fmt::Debug for GeometryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryFilter")
            .field("features", &self.features.len())
            .field("indexed", &self.index.size())
            .field("buffer_distance", &self.buffer_distance)
            .finish()
    }
}
