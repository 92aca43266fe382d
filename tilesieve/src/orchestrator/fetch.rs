//! Fetch orchestration across zoom levels and providers.
//!
//! For every zoom level, in configured order, selection runs once on the
//! blocking pool. Every provider then works through the selected tiles
//! concurrently: cached tiles are skipped, the rest are fetched under that
//! provider's semaphore and written to the cache.
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = FetchOrchestrator::new(cache, providers, selector, vec![10, 11])
//!     .with_concurrency(4);
//!
//! let report = orchestrator.run(CancellationToken::new()).await?;
//! println!("{} fetched, {} cached", report.success_count(), report.skipped_count());
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::report::FetchReport;
use super::types::{FetchOutcome, FetchResult, OrchestratorError};
use crate::cache::TileCache;
use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, TileProvider};
use crate::selection::TileSelector;

/// Default in-flight fetches per provider.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Capacity of the internal result channel.
const RESULT_CHANNEL_CAPACITY: usize = 64;

/// Tiles checked against the cache per blocking task.
const EXISTS_BATCH_SIZE: usize = 256;

/// Messages from dispatch and fetch tasks to the collector.
enum TaskMessage {
    Result(FetchResult),
    /// A cache write failed; the provider/zoom subtree stops dispatching
    Aborted {
        provider: String,
        zoom: u8,
        error: String,
    },
}

/// Drives a complete fetch run.
pub struct FetchOrchestrator<C: AsyncHttpClient> {
    cache: TileCache,
    providers: Vec<Arc<TileProvider<C>>>,
    selector: Arc<TileSelector>,
    zoom_levels: Vec<u8>,
    concurrency: usize,
    progress: Option<mpsc::Sender<FetchResult>>,
}

impl<C: AsyncHttpClient + 'static> FetchOrchestrator<C> {
    pub fn new(
        cache: TileCache,
        providers: Vec<TileProvider<C>>,
        selector: TileSelector,
        zoom_levels: Vec<u8>,
    ) -> Self {
        Self {
            cache,
            providers: providers.into_iter().map(Arc::new).collect(),
            selector: Arc::new(selector),
            zoom_levels,
            concurrency: DEFAULT_CONCURRENCY,
            progress: None,
        }
    }

    /// Sets the number of in-flight fetches per provider (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sends every [`FetchResult`] to `progress` as it is collected.
    ///
    /// The receiver must keep draining the channel or the run stalls.
    pub fn with_progress(mut self, progress: mpsc::Sender<FetchResult>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every zoom level for every provider.
    ///
    /// Tile failures are recorded in the report and never end the run.
    /// Once `cancellation` fires no new fetches are dispatched, in-flight
    /// fetches complete, and the report is flagged `cancelled`.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no providers, selection rejects a zoom
    /// level, or a selection task panics.
    pub async fn run(&self, cancellation: CancellationToken) -> Result<FetchReport, OrchestratorError> {
        if self.providers.is_empty() {
            return Err(OrchestratorError::NoProviders);
        }

        let start = Instant::now();
        let mut report = FetchReport::new();

        // One pool per provider, shared across zoom levels
        let semaphores: Vec<Arc<Semaphore>> = self
            .providers
            .iter()
            .map(|_| Arc::new(Semaphore::new(self.concurrency)))
            .collect();

        info!(
            providers = self.providers.len(),
            zooms = ?self.zoom_levels,
            concurrency = self.concurrency,
            cache = %self.cache.root().display(),
            "Starting fetch run"
        );

        for &zoom in &self.zoom_levels {
            if cancellation.is_cancelled() {
                info!(zoom, "Run cancelled, skipping remaining zoom levels");
                report.cancelled = true;
                break;
            }

            let tiles = self.select(zoom).await?;
            info!(zoom, tiles = tiles.len(), "Selected tiles");
            for provider in &self.providers {
                report.record_selected(provider.name(), zoom, tiles.len());
            }

            self.run_zoom(zoom, tiles, &semaphores, &cancellation, &mut report)
                .await;

            if cancellation.is_cancelled() {
                report.cancelled = true;
                break;
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;

        let totals = report.totals();
        info!(
            success = totals.success,
            skipped = totals.skipped,
            failed = totals.failed,
            bytes = totals.bytes,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms,
            "Fetch run complete"
        );
        if report.is_degraded() {
            warn!(failed = totals.failed, "No tiles fetched; every attempt failed");
        }

        Ok(report)
    }

    /// Runs selection for one zoom on the blocking pool.
    ///
    /// Tiles come back sorted so dispatch order is stable between runs.
    async fn select(&self, zoom: u8) -> Result<Arc<Vec<TileCoord>>, OrchestratorError> {
        let selector = Arc::clone(&self.selector);
        let selected: HashSet<TileCoord> = tokio::task::spawn_blocking(move || selector.select(zoom))
            .await
            .map_err(|e| OrchestratorError::TaskFailed(format!("selection at zoom {}: {}", zoom, e)))?
            .map_err(|source| OrchestratorError::Selection { zoom, source })?;

        let mut tiles: Vec<TileCoord> = selected.into_iter().collect();
        tiles.sort_unstable();
        Ok(Arc::new(tiles))
    }

    /// Dispatches one zoom level for all providers and collects the results.
    async fn run_zoom(
        &self,
        zoom: u8,
        tiles: Arc<Vec<TileCoord>>,
        semaphores: &[Arc<Semaphore>],
        cancellation: &CancellationToken,
        report: &mut FetchReport,
    ) {
        let (result_tx, mut result_rx) = mpsc::channel::<TaskMessage>(RESULT_CHANNEL_CAPACITY);

        // Dispatch runs in its own tasks so a full result channel cannot
        // block permit acquisition while the collector waits.
        let dispatchers: Vec<JoinHandle<()>> = self
            .providers
            .iter()
            .zip(semaphores)
            .map(|(provider, semaphore)| {
                tokio::spawn(dispatch_provider(
                    Arc::clone(provider),
                    self.cache.clone(),
                    Arc::clone(&tiles),
                    Arc::clone(semaphore),
                    result_tx.clone(),
                    cancellation.child_token(),
                ))
            })
            .collect();

        // Channel closes once every dispatcher and fetch task is done
        drop(result_tx);

        while let Some(message) = result_rx.recv().await {
            match message {
                TaskMessage::Result(result) => {
                    report.record(&result);
                    if let Some(progress) = &self.progress {
                        let _ = progress.send(result).await;
                    }
                }
                TaskMessage::Aborted {
                    provider,
                    zoom,
                    error,
                } => {
                    error!(provider = %provider, zoom, error = %error, "Cache write failed, abandoning provider at this zoom");
                    report.record_abort(&provider, zoom, error);
                }
            }
        }

        for joined in join_all(dispatchers).await {
            if let Err(e) = joined {
                error!(zoom, error = %e, "Dispatch task failed");
            }
        }

        for provider in &self.providers {
            let stats = report.zoom_stats(provider.name(), zoom);
            info!(
                provider = %provider.name(),
                zoom,
                selected = stats.selected,
                success = stats.success,
                skipped = stats.skipped,
                failed = stats.failed,
                "Zoom level complete"
            );
        }
    }
}

/// Walks the selected tiles for one provider.
///
/// `subtree` is cancelled by the run's token or by a cache write failure;
/// either way no further fetches are dispatched.
async fn dispatch_provider<C: AsyncHttpClient + 'static>(
    provider: Arc<TileProvider<C>>,
    cache: TileCache,
    tiles: Arc<Vec<TileCoord>>,
    semaphore: Arc<Semaphore>,
    result_tx: mpsc::Sender<TaskMessage>,
    subtree: CancellationToken,
) {
    let mut dispatched = 0usize;

    'dispatch: for batch in tiles.chunks(EXISTS_BATCH_SIZE) {
        if subtree.is_cancelled() {
            debug!(provider = %provider.name(), "Dispatch stopped");
            break;
        }

        let cached = cached_flags(&cache, provider.name(), batch).await;

        for (tile, is_cached) in batch.iter().copied().zip(cached) {
            if subtree.is_cancelled() {
                debug!(provider = %provider.name(), "Dispatch stopped");
                break 'dispatch;
            }

            if is_cached {
                let skipped = FetchResult::new(provider.name(), tile, FetchOutcome::Skipped);
                if result_tx.send(TaskMessage::Result(skipped)).await.is_err() {
                    break 'dispatch;
                }
                continue;
            }

            let permit: OwnedSemaphorePermit = tokio::select! {
                biased;
                _ = subtree.cancelled() => break 'dispatch,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => {
                        debug!(provider = %provider.name(), "Semaphore closed during dispatch");
                        break 'dispatch;
                    }
                },
            };

            dispatched += 1;
            let provider = Arc::clone(&provider);
            let cache = cache.clone();
            let result_tx = result_tx.clone();
            let subtree = subtree.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let outcome = fetch_and_store(&provider, &cache, tile, &result_tx, &subtree).await;
                let _ = result_tx
                    .send(TaskMessage::Result(FetchResult::new(provider.name(), tile, outcome)))
                    .await;
            });
        }
    }

    debug!(
        provider = %provider.name(),
        dispatched,
        total = tiles.len(),
        "Dispatch finished"
    );
}

/// Checks a batch of tiles against the cache on the blocking pool.
///
/// If the check task fails every tile is treated as missing and fetched.
async fn cached_flags(cache: &TileCache, provider: &str, batch: &[TileCoord]) -> Vec<bool> {
    let cache = cache.clone();
    let name = provider.to_string();
    let tiles = batch.to_vec();
    match tokio::task::spawn_blocking(move || cache.exists_many(&name, &tiles)).await {
        Ok(flags) => flags,
        Err(e) => {
            warn!(provider, error = %e, "Cache check failed, fetching batch");
            vec![false; batch.len()]
        }
    }
}

async fn fetch_and_store<C: AsyncHttpClient + 'static>(
    provider: &TileProvider<C>,
    cache: &TileCache,
    tile: TileCoord,
    result_tx: &mpsc::Sender<TaskMessage>,
    subtree: &CancellationToken,
) -> FetchOutcome {
    let png = match provider.fetch_until_cancelled(&tile, subtree).await {
        Ok(png) => png,
        Err(e) => {
            warn!(provider = %provider.name(), tile = %tile, error = %e, "Tile fetch failed");
            return FetchOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    let bytes = png.len();
    let store_cache = cache.clone();
    let name = provider.name().to_string();
    let stored = tokio::task::spawn_blocking(move || store_cache.store(&name, &tile, &png)).await;

    match stored {
        Ok(Ok(path)) => {
            debug!(provider = %provider.name(), tile = %tile, path = %path.display(), bytes, "Stored tile");
            FetchOutcome::Success { bytes }
        }
        Ok(Err(e)) => {
            subtree.cancel();
            let _ = result_tx
                .send(TaskMessage::Aborted {
                    provider: provider.name().to_string(),
                    zoom: tile.zoom,
                    error: e.to_string(),
                })
                .await;
            FetchOutcome::Failed {
                reason: e.to_string(),
            }
        }
        Err(e) => FetchOutcome::Failed {
            reason: format!("cache write task failed: {}", e),
        },
    }
}
