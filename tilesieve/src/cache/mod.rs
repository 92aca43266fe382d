//! Offline tile cache on the local filesystem.
//!
//! Tiles live at `<root>/<provider>/<zoom>/<x>_<y>.png`. There is no
//! separate index: a tile is cached iff its file exists.

mod disk;
mod path;
mod types;

pub use disk::TileCache;
pub use path::{provider_directory, tile_path, zoom_directory, TILE_EXTENSION};
pub use types::{format_size, CacheError, CacheStats, ZoomUsage};
