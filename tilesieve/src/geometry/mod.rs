//! Vector overlay handling for tile selection.
//!
//! Loads a GeoJSON feature collection (e.g. waterways), restricts it to the
//! area of interest, optionally buffers it, and answers whether a tile's
//! outline intersects any remaining feature.
//!
//! Coordinates are treated as planar lon/lat degrees, so buffer distances
//! are in degrees as well.
//!
//! # Example
//!
//! ```
//! use tilesieve::coord::{to_tile_coords, GeoBoundingBox};
//! use tilesieve::geometry::{FeatureCollection, GeometryFilter};
//!
//! let text = r#"{"type": "FeatureCollection", "features": [
//!     {"type": "Feature", "properties": {},
//!      "geometry": {"type": "Point", "coordinates": [113.05, 22.05]}}
//! ]}"#;
//! let (features, summary) = FeatureCollection::from_geojson_str(text).unwrap();
//! assert_eq!(summary.skipped, 0);
//!
//! let bbox = GeoBoundingBox::new(113.0, 22.0, 113.1, 22.1).unwrap();
//! let filter = GeometryFilter::new(&features, &bbox, None);
//! assert!(filter.matches(&to_tile_coords(22.05, 113.05, 10).unwrap()));
//! ```

mod collection;
mod error;
mod filter;

pub use collection::{tile_intersects, Feature, FeatureCollection, LoadSummary};
pub use error::GeometryError;
pub use filter::GeometryFilter;
