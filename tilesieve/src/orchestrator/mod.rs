//! Fetch orchestration
//!
//! Runs tile selection per zoom level and fetches every selected tile from
//! every provider into the cache, with a bounded pool per provider.

mod fetch;
mod report;
mod types;

pub use fetch::{FetchOrchestrator, DEFAULT_CONCURRENCY};
pub use report::{FetchReport, SubtreeAbort, TileFailure, ZoomStats};
pub use types::{FetchOutcome, FetchResult, OrchestratorError};
