//! Aggregated outcome of a fetch run.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{FetchOutcome, FetchResult};
use crate::coord::TileCoord;

/// Counts for one provider at one zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoomStats {
    /// Tiles chosen by selection
    pub selected: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Bytes written for successful tiles
    pub bytes: u64,
}

impl ZoomStats {
    fn add(&mut self, other: &ZoomStats) {
        self.selected += other.selected;
        self.success += other.success;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.bytes += other.bytes;
    }
}

/// A tile that could not be fetched or stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileFailure {
    pub provider: String,
    pub tile: TileCoord,
    pub reason: String,
}

/// A provider/zoom subtree abandoned after a cache write failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtreeAbort {
    pub provider: String,
    pub zoom: u8,
    pub error: String,
}

/// Summary of a fetch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    /// provider → zoom → counts
    pub providers: BTreeMap<String, BTreeMap<u8, ZoomStats>>,
    pub failures: Vec<TileFailure>,
    pub aborted: Vec<SubtreeAbort>,
    /// Set when the run stopped on cancellation
    pub cancelled: bool,
    pub elapsed_ms: u64,
}

impl FetchReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, provider: &str, zoom: u8) -> &mut ZoomStats {
        self.providers
            .entry(provider.to_string())
            .or_default()
            .entry(zoom)
            .or_default()
    }

    /// Records how many tiles selection produced for a provider and zoom.
    pub fn record_selected(&mut self, provider: &str, zoom: u8, count: usize) {
        self.entry(provider, zoom).selected = count;
    }

    /// Adds one tile result.
    pub fn record(&mut self, result: &FetchResult) {
        let stats = self.entry(&result.provider, result.tile.zoom);
        match &result.outcome {
            FetchOutcome::Success { bytes } => {
                stats.success += 1;
                stats.bytes += *bytes as u64;
            }
            FetchOutcome::Skipped => stats.skipped += 1,
            FetchOutcome::Failed { reason } => {
                stats.failed += 1;
                self.failures.push(TileFailure {
                    provider: result.provider.clone(),
                    tile: result.tile,
                    reason: reason.clone(),
                });
            }
        }
    }

    /// Records an abandoned subtree. Only the first error per subtree is kept.
    pub fn record_abort(&mut self, provider: &str, zoom: u8, error: impl Into<String>) {
        let known = self
            .aborted
            .iter()
            .any(|a| a.provider == provider && a.zoom == zoom);
        if !known {
            self.aborted.push(SubtreeAbort {
                provider: provider.to_string(),
                zoom,
                error: error.into(),
            });
        }
    }

    /// Counts for one provider at one zoom (zero if never touched).
    pub fn zoom_stats(&self, provider: &str, zoom: u8) -> ZoomStats {
        self.providers
            .get(provider)
            .and_then(|zooms| zooms.get(&zoom))
            .copied()
            .unwrap_or_default()
    }

    /// Counts for one provider over all zoom levels.
    pub fn provider_totals(&self, provider: &str) -> ZoomStats {
        let mut total = ZoomStats::default();
        if let Some(zooms) = self.providers.get(provider) {
            for stats in zooms.values() {
                total.add(stats);
            }
        }
        total
    }

    /// Counts over the whole run.
    pub fn totals(&self) -> ZoomStats {
        let mut total = ZoomStats::default();
        for stats in self.providers.values().flat_map(|zooms| zooms.values()) {
            total.add(stats);
        }
        total
    }

    pub fn success_count(&self) -> usize {
        self.totals().success
    }

    pub fn skipped_count(&self) -> usize {
        self.totals().skipped
    }

    pub fn failed_count(&self) -> usize {
        self.totals().failed
    }

    /// Nothing was fetched and something failed.
    ///
    /// A degraded run is reported, not treated as a process failure.
    pub fn is_degraded(&self) -> bool {
        let totals = self.totals();
        totals.success == 0 && totals.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(x: u32) -> TileCoord {
        TileCoord { zoom: 10, x, y: 447 }
    }

    fn result(provider: &str, x: u32, outcome: FetchOutcome) -> FetchResult {
        FetchResult::new(provider, tile(x), outcome)
    }

    #[test]
    fn test_record_counts_outcomes() {
        let mut report = FetchReport::new();
        report.record_selected("osm", 10, 3);
        report.record(&result("osm", 1, FetchOutcome::Success { bytes: 100 }));
        report.record(&result("osm", 2, FetchOutcome::Skipped));
        report.record(&result(
            "osm",
            3,
            FetchOutcome::Failed {
                reason: "HTTP 500".into(),
            },
        ));

        let stats = report.zoom_stats("osm", 10);
        assert_eq!(
            stats,
            ZoomStats {
                selected: 3,
                success: 1,
                skipped: 1,
                failed: 1,
                bytes: 100
            }
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tile, tile(3));
        assert!(!report.is_degraded());
    }

    #[test]
    fn test_totals_span_providers_and_zooms() {
        let mut report = FetchReport::new();
        report.record(&result("a", 1, FetchOutcome::Success { bytes: 10 }));
        report.record(&result("b", 1, FetchOutcome::Success { bytes: 20 }));
        report.record(&FetchResult::new(
            "a",
            TileCoord { zoom: 11, x: 0, y: 0 },
            FetchOutcome::Skipped,
        ));

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.totals().bytes, 30);
        assert_eq!(report.provider_totals("a").success, 1);
        assert_eq!(report.provider_totals("a").skipped, 1);
        assert_eq!(report.provider_totals("missing"), ZoomStats::default());
    }

    #[test]
    fn test_degraded_only_when_nothing_succeeded() {
        let mut report = FetchReport::new();
        assert!(!report.is_degraded());

        report.record(&result("osm", 1, FetchOutcome::Skipped));
        assert!(!report.is_degraded());

        report.record(&result(
            "osm",
            2,
            FetchOutcome::Failed {
                reason: "timeout".into(),
            },
        ));
        assert!(report.is_degraded());

        report.record(&result("osm", 3, FetchOutcome::Success { bytes: 1 }));
        assert!(!report.is_degraded());
    }

    #[test]
    fn test_abort_recorded_once_per_subtree() {
        let mut report = FetchReport::new();
        report.record_abort("osm", 10, "disk full");
        report.record_abort("osm", 10, "disk still full");
        report.record_abort("osm", 11, "disk full");

        assert_eq!(report.aborted.len(), 2);
        assert_eq!(report.aborted[0].error, "disk full");
    }

    #[test]
    fn test_report_serializes() {
        let mut report = FetchReport::new();
        report.record(&result("osm", 1, FetchOutcome::Success { bytes: 5 }));

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["providers"]["osm"]["10"]["success"], 1);
        assert_eq!(json["cancelled"], false);
    }

    #[test]
    fn test_result_serializes_flat() {
        let json = serde_json::to_value(result(
            "osm",
            1,
            FetchOutcome::Failed {
                reason: "HTTP 404".into(),
            },
        ))
        .unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "HTTP 404");
        assert_eq!(json["tile"]["x"], 1);
    }
}
