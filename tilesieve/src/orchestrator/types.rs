//! Per-tile results and run errors.

use serde::Serialize;
use thiserror::Error;

use crate::coord::{CoordError, TileCoord};

/// What happened to one tile for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Fetched and stored
    Success { bytes: usize },
    /// Already cached, no request made
    Skipped,
    /// Network, image or storage failure; the tile stays uncached
    Failed { reason: String },
}

/// Result of processing a single tile for a single provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResult {
    pub provider: String,
    pub tile: TileCoord,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn new(provider: impl Into<String>, tile: TileCoord, outcome: FetchOutcome) -> Self {
        Self {
            provider: provider.into(),
            tile,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Failed { .. })
    }
}

/// Errors that end a run early.
///
/// Individual tile failures never surface here; they are recorded in the
/// [`FetchReport`](super::FetchReport).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Tile selection rejected the zoom level or bounding box
    #[error("Tile selection failed at zoom {zoom}: {source}")]
    Selection {
        zoom: u8,
        #[source]
        source: CoordError,
    },

    /// A background task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// Nothing to fetch from
    #[error("No providers configured for this run")]
    NoProviders,
}
