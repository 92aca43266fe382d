//! tilesieve - offline map tile cache builder
//!
//! Selects the Web Mercator tiles covering a region (optionally restricted
//! to a GeoJSON geometry), downloads them from one or more raster tile
//! providers, and stores them in an on-disk cache laid out as
//! `{cache_root}/{provider}/{zoom}/{x}_{y}.png`.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilesieve::cache::TileCache;
//! use tilesieve::config::{ConfigFile, FetchSettings, SettingsOverrides};
//! use tilesieve::orchestrator::FetchOrchestrator;
//! use tilesieve::provider::AsyncReqwestClient;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ConfigFile::load()?;
//! let settings = FetchSettings::resolve(&config, SettingsOverrides::default())?;
//! let client = Arc::new(AsyncReqwestClient::with_timeout(settings.download.timeout())?);
//! let providers = settings.registry.build_providers(
//!     client,
//!     settings.download.retry_policy(),
//!     &settings.provider_filter,
//! )?;
//!
//! let report = FetchOrchestrator::new(
//!     TileCache::new(&settings.cache_dir),
//!     providers,
//!     settings.selector()?,
//!     settings.zoom_levels.clone(),
//! )
//! .with_concurrency(settings.download.concurrency())
//! .run(CancellationToken::new())
//! .await?;
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod geometry;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod selection;

/// Version of the tilesieve library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
