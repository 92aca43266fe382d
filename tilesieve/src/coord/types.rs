//! Coordinate type definitions

use std::fmt;

use serde::Serialize;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported zoom levels
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Number of tiles along one axis at the given zoom level.
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << zoom
}

/// Tile coordinates in the Web Mercator / Slippy Map system.
///
/// `x` counts west to east and `y` north to south, both in `[0, 2^zoom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoord {
    /// Zoom level (0-22)
    pub zoom: u8,
    /// X coordinate (east-west), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
}

impl TileCoord {
    /// Creates a tile coordinate, checking that it lies inside the grid.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = tiles_per_axis(zoom);
        if x >= n || y >= n {
            return Err(CoordError::InvalidTile { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Returns every tile within Chebyshev distance `radius` of this one,
    /// including the tile itself.
    ///
    /// Neighbors that would fall outside `[0, 2^zoom)` are dropped, so tiles
    /// on the edge of the world yield a truncated neighborhood.
    pub fn neighborhood(&self, radius: u32) -> impl Iterator<Item = TileCoord> {
        let max = tiles_per_axis(self.zoom) - 1;
        let zoom = self.zoom;
        let min_x = self.x.saturating_sub(radius);
        let max_x = self.x.saturating_add(radius).min(max);
        let min_y = self.y.saturating_sub(radius);
        let max_y = self.y.saturating_add(radius).min(max);

        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| TileCoord { zoom, x, y }))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Axis-aligned geographic rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBoundingBox {
    /// Creates a bounding box, rejecting inverted or out-of-range extents.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, CoordError> {
        let bbox = Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };

        let finite = [min_lon, min_lat, max_lon, max_lat]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CoordError::InvalidBoundingBox {
                bbox,
                reason: "coordinates must be finite",
            });
        }
        if min_lon > max_lon || min_lat > max_lat {
            return Err(CoordError::InvalidBoundingBox {
                bbox,
                reason: "minimum exceeds maximum",
            });
        }
        if min_lon < MIN_LON || max_lon > MAX_LON {
            return Err(CoordError::InvalidBoundingBox {
                bbox,
                reason: "longitude outside [-180, 180]",
            });
        }
        if min_lat < -90.0 || max_lat > 90.0 {
            return Err(CoordError::InvalidBoundingBox {
                bbox,
                reason: "latitude outside [-90, 90]",
            });
        }

        Ok(bbox)
    }

    /// Returns the midpoint as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Checks whether the point lies inside or on the edge of the box.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    /// Converts to a planar rectangle with x = longitude, y = latitude.
    pub fn to_rect(&self) -> geo::Rect<f64> {
        geo::Rect::new(
            geo::coord! { x: self.min_lon, y: self.min_lat },
            geo::coord! { x: self.max_lon, y: self.max_lat },
        )
    }
}

impl fmt::Display for GeoBoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Inclusive rectangle of tile indices at a single zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Number of tiles in the rectangle.
    pub fn len(&self) -> u64 {
        let width = (self.max_x - self.min_x) as u64 + 1;
        let height = (self.max_y - self.min_y) as u64 + 1;
        width * height
    }

    /// A range always holds at least its corner tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Iterates the tiles in row-major order (north row first).
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> {
        let TileRange {
            zoom,
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| TileCoord { zoom, x, y }))
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 22)
    InvalidZoom(u8),
    /// Tile index outside the grid for its zoom level
    InvalidTile { zoom: u8, x: u32, y: u32 },
    /// Bounding box is inverted, non-finite or out of range
    InvalidBoundingBox {
        bbox: GeoBoundingBox,
        reason: &'static str,
    },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidTile { zoom, x, y } => {
                write!(
                    f,
                    "Invalid tile {}/{}/{} (indices must be below {})",
                    zoom,
                    x,
                    y,
                    tiles_per_axis(*zoom)
                )
            }
            CoordError::InvalidBoundingBox { bbox, reason } => {
                write!(f, "Invalid bounding box {}: {}", bbox, reason)
            }
        }
    }
}

impl std::error::Error for CoordError {}
