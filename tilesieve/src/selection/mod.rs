//! Tile selection.
//!
//! Turns a bounding box, a zoom level and an optional geometry filter into
//! the set of tiles to fetch. Without a filter every tile covering the box
//! is selected (dense mode). With a filter only tiles whose outline
//! intersects a prepared feature are kept. In both modes each accepted tile
//! then pulls in its neighbors up to the configured Chebyshev radius.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::coord::{tile_range, CoordError, GeoBoundingBox, TileCoord};
use crate::geometry::GeometryFilter;

/// Selects the tiles to fetch for one zoom level.
///
/// Neighbors outside the box's tile range but inside the world grid are
/// kept; neighbors outside `[0, 2^zoom)` are dropped.
pub fn select_tiles(
    bbox: &GeoBoundingBox,
    zoom: u8,
    filter: Option<&GeometryFilter>,
    neighborhood: u32,
) -> Result<HashSet<TileCoord>, CoordError> {
    let range = tile_range(bbox, zoom)?;

    let accepted = range
        .iter()
        .filter(|tile| filter.map_or(true, |f| f.matches(tile)));

    let mut selected = HashSet::new();
    let mut matched = 0u64;
    for tile in accepted {
        matched += 1;
        if neighborhood == 0 {
            selected.insert(tile);
        } else {
            selected.extend(tile.neighborhood(neighborhood));
        }
    }

    debug!(
        zoom,
        candidates = range.len(),
        matched,
        selected = selected.len(),
        neighborhood,
        "Selected tiles"
    );

    Ok(selected)
}

/// Reusable selection parameters shared by every zoom level of a run.
#[derive(Debug, Clone)]
pub struct TileSelector {
    bbox: GeoBoundingBox,
    filter: Option<Arc<GeometryFilter>>,
    neighborhood: u32,
}

impl TileSelector {
    /// Dense selector over `bbox`.
    pub fn new(bbox: GeoBoundingBox) -> Self {
        Self {
            bbox,
            filter: None,
            neighborhood: 0,
        }
    }

    pub fn with_filter(mut self, filter: Arc<GeometryFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_neighborhood(mut self, neighborhood: u32) -> Self {
        self.neighborhood = neighborhood;
        self
    }

    pub fn bbox(&self) -> &GeoBoundingBox {
        &self.bbox
    }

    pub fn filter(&self) -> Option<&GeometryFilter> {
        self.filter.as_deref()
    }

    pub fn neighborhood(&self) -> u32 {
        self.neighborhood
    }

    /// Selects the tiles for one zoom level.
    pub fn select(&self, zoom: u8) -> Result<HashSet<TileCoord>, CoordError> {
        select_tiles(&self.bbox, zoom, self.filter(), self.neighborhood)
    }

    /// Counts the selection at each zoom level without keeping the tiles.
    ///
    /// Used for dry runs. Zoom levels keep their given order.
    pub fn plan(&self, zooms: &[u8]) -> Result<Vec<(u8, usize)>, CoordError> {
        zooms
            .iter()
            .map(|&zoom| self.select(zoom).map(|tiles| (zoom, tiles.len())))
            .collect()
    }
}
