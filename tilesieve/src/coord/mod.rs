//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates, plus the inverse mapping from a tile
//! back to its geographic extent.

mod types;

pub use types::{
    tiles_per_axis, CoordError, GeoBoundingBox, TileCoord, TileRange, MAX_LAT, MAX_LON, MAX_ZOOM,
    MIN_LAT, MIN_LON, MIN_ZOOM,
};

use geo::{Polygon, Rect};
use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
///
/// Points on the far east or far south edge of the world map to the last
/// tile rather than one past it.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = tiles_per_axis(zoom) as f64;
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).floor();

    // ln(tan φ + sec φ) == asinh(tan φ)
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    Ok(TileCoord {
        zoom,
        x: x.clamp(0.0, max_index) as u32,
        y: y.clamp(0.0, max_index) as u32,
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    corner_lat_lon(tile.x, tile.y, tile.zoom)
}

/// Returns the geographic extent of a tile.
pub fn tile_bounds(tile: &TileCoord) -> GeoBoundingBox {
    let (north, west) = corner_lat_lon(tile.x, tile.y, tile.zoom);
    let (south, east) = corner_lat_lon(tile.x + 1, tile.y + 1, tile.zoom);

    GeoBoundingBox {
        min_lon: west,
        min_lat: south,
        max_lon: east,
        max_lat: north,
    }
}

/// Returns the tile's outline as a closed four-corner ring.
///
/// Used for intersection tests only; x is longitude and y is latitude.
pub fn tile_polygon(tile: &TileCoord) -> Polygon<f64> {
    let bounds = tile_bounds(tile);
    Rect::new(
        geo::coord! { x: bounds.min_lon, y: bounds.min_lat },
        geo::coord! { x: bounds.max_lon, y: bounds.max_lat },
    )
    .to_polygon()
}

/// Clamps a latitude into the range the projection is defined for.
#[inline]
pub fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(MIN_LAT, MAX_LAT)
}

/// Computes the rectangle of tile indices covering a bounding box.
///
/// The box's latitudes are clamped to the projection's range first, so a
/// box reaching the poles covers the full height of the grid.
pub fn tile_range(bbox: &GeoBoundingBox, zoom: u8) -> Result<TileRange, CoordError> {
    let north_west = to_tile_coords(clamp_latitude(bbox.max_lat), bbox.min_lon, zoom)?;
    let south_east = to_tile_coords(clamp_latitude(bbox.min_lat), bbox.max_lon, zoom)?;

    Ok(TileRange {
        zoom,
        min_x: north_west.x,
        min_y: north_west.y,
        max_x: south_east.x,
        max_y: south_east.y,
    })
}

/// Latitude/longitude of the northwest corner of grid cell `(x, y)`.
///
/// `x` and `y` may equal `2^zoom` to address the far east/south edge.
fn corner_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom) as f64;

    let lon = x as f64 / n * 360.0 - 180.0;

    let lat_rad = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan();
    (lat_rad.to_degrees(), lon)
}
