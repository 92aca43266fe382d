//! Integration tests for the fetch pipeline.
//!
//! These tests drive the full path from configuration to cache:
//! - Configuration parsing and settings resolution
//! - Tile selection with and without geometry
//! - Fetching through a scripted HTTP client
//! - Cache contents and idempotent re-runs
//! - Failure recording and cancellation

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tilesieve::cache::TileCache;
use tilesieve::config::{ConfigFile, FetchSettings, SettingsOverrides};
use tilesieve::coord::TileCoord;
use tilesieve::orchestrator::{FetchOrchestrator, FetchOutcome, FetchReport};
use tilesieve::provider::{AsyncHttpClient, ProviderError};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Test Helpers
// =============================================================================

/// HTTP client whose response can be swapped between runs.
#[derive(Clone)]
struct ScriptedClient {
    response: Arc<Mutex<Result<Vec<u8>, ProviderError>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedClient {
    fn new(response: Result<Vec<u8>, ProviderError>) -> Self {
        Self {
            response: Arc::new(Mutex::new(response)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn respond_with(&self, response: Result<Vec<u8>, ProviderError>) {
        *self.response.lock().unwrap() = response;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AsyncHttpClient for ScriptedClient {
    async fn get(&self, _url: &str) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().unwrap().clone()
    }
}

fn png_tile() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb([34, 139, 34]));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png).unwrap();
    cursor.into_inner()
}

fn config_text(cache_dir: &Path, zoom_levels: &str) -> String {
    format!(
        "[region]\n\
         min_lon = 113.0\n\
         min_lat = 22.0\n\
         max_lon = 113.1\n\
         max_lat = 22.1\n\
         \n\
         [selection]\n\
         zoom_levels = {}\n\
         \n\
         [cache]\n\
         directory = {}\n\
         \n\
         [download]\n\
         concurrency = 2\n\
         \n\
         [provider.osm]\n\
         url = https://{{s}}.tile.example/{{z}}/{{x}}/{{y}}.png\n\
         subdomains = a,b,c\n",
        zoom_levels,
        cache_dir.display()
    )
}

fn settings(cache_dir: &Path, zoom_levels: &str, overrides: SettingsOverrides) -> FetchSettings {
    let config = ConfigFile::from_ini_str(&config_text(cache_dir, zoom_levels)).unwrap();
    FetchSettings::resolve(&config, overrides).unwrap()
}

async fn run(
    settings: &FetchSettings,
    client: &ScriptedClient,
    cancellation: CancellationToken,
) -> FetchReport {
    let providers = settings
        .registry
        .build_providers(
            Arc::new(client.clone()),
            settings.download.retry_policy(),
            &settings.provider_filter,
        )
        .unwrap();

    FetchOrchestrator::new(
        TileCache::new(&settings.cache_dir),
        providers,
        settings.selector().unwrap(),
        settings.zoom_levels.clone(),
    )
    .with_concurrency(settings.download.concurrency())
    .run(cancellation)
    .await
    .unwrap()
}

fn cached_files(root: &Path) -> usize {
    fn walk(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|e| {
                        let path = e.path();
                        if path.is_dir() {
                            walk(&path)
                        } else {
                            1
                        }
                    })
                    .sum()
            })
            .unwrap_or(0)
    }
    walk(root)
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test]
async fn test_fetch_populates_cache_layout() {
    let temp = TempDir::new().unwrap();
    let settings = settings(temp.path(), "10", SettingsOverrides::default());
    let client = ScriptedClient::new(Ok(png_tile()));

    let report = run(&settings, &client, CancellationToken::new()).await;

    assert_eq!(report.success_count(), 1);
    let expected = temp.path().join("osm").join("10").join("833_447.png");
    assert!(expected.is_file());
    assert_eq!(std::fs::read(&expected).unwrap(), png_tile());
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let settings = settings(temp.path(), "10-11", SettingsOverrides::default());
    let client = ScriptedClient::new(Ok(png_tile()));

    let first = run(&settings, &client, CancellationToken::new()).await;
    let calls_after_first = client.calls();
    let second = run(&settings, &client, CancellationToken::new()).await;

    assert!(first.success_count() > 0);
    assert_eq!(second.success_count(), 0);
    assert_eq!(second.skipped_count(), first.success_count());
    assert_eq!(client.calls(), calls_after_first);
    assert_eq!(cached_files(temp.path()), first.success_count());
}

#[tokio::test]
async fn test_http_error_then_later_success() {
    let temp = TempDir::new().unwrap();
    let settings = settings(temp.path(), "10", SettingsOverrides::default());
    let client = ScriptedClient::new(Err(ProviderError::HttpStatus {
        status: 500,
        url: "https://a.tile.example/10/833/447.png".to_string(),
    }));
    let tile = TileCoord { zoom: 10, x: 833, y: 447 };
    let cache = TileCache::new(&settings.cache_dir);

    let failed = run(&settings, &client, CancellationToken::new()).await;

    assert_eq!(failed.failed_count(), 1);
    assert!(failed.is_degraded());
    assert!(!cache.exists("osm", &tile));
    assert_eq!(cached_files(temp.path()), 0);

    client.respond_with(Ok(png_tile()));
    let recovered = run(&settings, &client, CancellationToken::new()).await;

    assert_eq!(recovered.success_count(), 1);
    assert!(cache.exists("osm", &tile));
}

#[tokio::test]
async fn test_non_image_body_is_failed_and_not_cached() {
    let temp = TempDir::new().unwrap();
    let settings = settings(temp.path(), "10", SettingsOverrides::default());
    let client = ScriptedClient::new(Ok(b"<html><body>Rate limit exceeded</body></html>".to_vec()));

    let report = run(&settings, &client, CancellationToken::new()).await;

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.success_count(), 0);
    assert_eq!(cached_files(temp.path()), 0);
}

#[tokio::test]
async fn test_cancellation_before_run() {
    let temp = TempDir::new().unwrap();
    let settings = settings(temp.path(), "10-12", SettingsOverrides::default());
    let client = ScriptedClient::new(Ok(png_tile()));
    let cancellation = CancellationToken::new();
    cancellation.cancel();

    let report = run(&settings, &client, cancellation).await;

    assert!(report.cancelled);
    assert_eq!(client.calls(), 0);
    assert_eq!(report.success_count() + report.failed_count(), 0);
    assert_eq!(cached_files(temp.path()), 0);
}

#[tokio::test]
async fn test_geometry_restricts_fetch() {
    let temp = TempDir::new().unwrap();
    let geometry = temp.path().join("point.geojson");
    std::fs::write(
        &geometry,
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"pier"},
             "geometry":{"type":"Point","coordinates":[113.05,22.05]}}
        ]}"#,
    )
    .unwrap();
    let cache_dir = temp.path().join("tiles");
    let overrides = SettingsOverrides {
        geometry: Some(geometry),
        neighborhood: Some(1),
        ..SettingsOverrides::default()
    };
    let settings = settings(&cache_dir, "10", overrides);
    let client = ScriptedClient::new(Ok(png_tile()));

    let report = run(&settings, &client, CancellationToken::new()).await;

    assert_eq!(report.zoom_stats("osm", 10).selected, 9);
    assert_eq!(report.success_count(), 9);
    assert_eq!(cached_files(&cache_dir), 9);
}

#[tokio::test]
async fn test_progress_outcomes_match_report() {
    let temp = TempDir::new().unwrap();
    let settings = settings(temp.path(), "11", SettingsOverrides::default());
    let client = ScriptedClient::new(Ok(png_tile()));
    let providers = settings
        .registry
        .build_providers(Arc::new(client.clone()), settings.download.retry_policy(), &[])
        .unwrap();
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel(16);

    let orchestrator = FetchOrchestrator::new(
        TileCache::new(&settings.cache_dir),
        providers,
        settings.selector().unwrap(),
        settings.zoom_levels.clone(),
    )
    .with_progress(progress_tx);
    let collector = tokio::spawn(async move {
        let mut bytes = 0usize;
        let mut count = 0usize;
        while let Some(result) = progress_rx.recv().await {
            if let FetchOutcome::Success { bytes: b } = result.outcome {
                bytes += b;
            }
            count += 1;
        }
        (count, bytes)
    });
    let report = orchestrator.run(CancellationToken::new()).await.unwrap();
    drop(orchestrator);

    let (count, bytes) = collector.await.unwrap();
    assert_eq!(count, report.success_count());
    assert_eq!(bytes as u64, report.totals().bytes);
}
