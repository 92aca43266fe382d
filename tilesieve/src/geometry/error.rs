//! Error types for the geometry module.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors while loading a vector overlay.
///
/// Problems with individual features are not errors: those features are
/// skipped and counted in [`LoadSummary`](super::LoadSummary).
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The geometry file could not be read.
    #[error("Failed to read geometry file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The document is not valid JSON.
    #[error("Geometry file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is JSON but not a GeoJSON object we can read.
    #[error("Not a GeoJSON document: {0}")]
    NotGeoJson(String),
}
