//! Named tile source: URL template plus a shared HTTP client.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::ImageFormat;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::http::AsyncHttpClient;
use super::template::UrlTemplate;
use super::types::ProviderError;
use crate::coord::TileCoord;

/// Default pause before the first retry.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// In-fetch retry behaviour for transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    /// Delay before the first retry; doubles each attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// No retries.
    pub fn none() -> Self {
        Self {
            retries: 0,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }

    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries,
            base_delay,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// A configured tile source.
///
/// Every provider of a run shares one HTTP client so connections are pooled.
pub struct TileProvider<C: AsyncHttpClient> {
    name: String,
    template: UrlTemplate,
    client: Arc<C>,
    retry: RetryPolicy,
}

impl<C: AsyncHttpClient> TileProvider<C> {
    pub fn new(name: impl Into<String>, template: UrlTemplate, client: Arc<C>) -> Self {
        Self {
            name: name.into(),
            template,
            client,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Provider name, also used as its cache directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    pub fn render_url(&self, tile: &TileCoord) -> String {
        self.template.render_url(tile)
    }

    /// Downloads one tile and returns it as PNG bytes.
    ///
    /// The body must decode as an image. PNG bodies are returned verbatim,
    /// anything else is re-encoded as PNG.
    pub async fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        self.fetch_until_cancelled(tile, &CancellationToken::new()).await
    }

    /// Like [`fetch`](Self::fetch), but stops retrying once `cancel` fires.
    ///
    /// A request already in flight is allowed to finish. When cancelled
    /// between attempts the last transport error is returned.
    pub async fn fetch_until_cancelled(
        &self,
        tile: &TileCoord,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = self.template.render_url(tile);
        let body = self.get_with_retry(&url, tile, cancel).await?;
        let png = ensure_png(body)?;
        trace!(provider = %self.name, tile = %tile, bytes = png.len(), "Fetched tile");
        Ok(png)
    }

    async fn get_with_retry(
        &self,
        url: &str,
        tile: &TileCoord,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.client.get(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.retry.retries => {
                    if cancel.is_cancelled() {
                        debug!(provider = %self.name, tile = %tile, "Cancelled, not retrying");
                        return Err(e);
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!(
                        provider = %self.name,
                        tile = %tile,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying tile"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(e),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Validates an image body and normalises it to PNG.
pub fn ensure_png(body: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
    let format = image::guess_format(&body)
        .map_err(|e| ProviderError::InvalidImage(e.to_string()))?;

    let decoded = image::load_from_memory_with_format(&body, format)
        .map_err(|e| ProviderError::InvalidImage(e.to_string()))?;

    if format == ImageFormat::Png {
        return Ok(body);
    }

    let mut cursor = Cursor::new(Vec::new());
    decoded
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| ProviderError::InvalidImage(format!("PNG re-encode failed: {}", e)))?;
    Ok(cursor.into_inner())
}
