//! Download configuration for a fetch run.

use std::time::Duration;

use super::defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_TIMEOUT_SECS,
    MAX_CONCURRENCY,
};
use super::settings::DownloadSettings;
use crate::provider::RetryPolicy;

/// Configuration for tile downloading.
///
/// # Example
///
/// ```
/// use tilesieve::config::DownloadConfig;
///
/// // Using defaults
/// let config = DownloadConfig::default();
/// assert_eq!(config.timeout_secs(), 10);
/// assert_eq!(config.concurrency(), 4);
/// assert_eq!(config.retries(), 0);
///
/// // Custom configuration
/// let config = DownloadConfig::new()
///     .with_timeout_secs(30)
///     .with_retries(2)
///     .with_concurrency(8);
/// assert_eq!(config.retry_policy().retries, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Per-request timeout (in seconds)
    timeout_secs: u64,
    /// Extra attempts for transport errors
    retries: u32,
    /// Delay before the first retry (in milliseconds)
    retry_base_delay_ms: u64,
    /// In-flight requests per provider
    concurrency: usize,
}

impl DownloadConfig {
    /// Create a new download configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout in seconds. Zero is raised to one.
    pub fn with_timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout.max(1);
        self
    }

    /// Set the number of extra attempts for transport errors.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    /// Set the number of in-flight requests per provider.
    ///
    /// Clamped to `1..=MAX_CONCURRENCY`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        let clamped = concurrency.clamp(1, MAX_CONCURRENCY);
        if clamped != concurrency {
            tracing::warn!(
                requested = concurrency,
                max = MAX_CONCURRENCY,
                "concurrency out of range, clamping to {}",
                clamped
            );
        }
        self.concurrency = clamped;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.retry_base_delay_ms))
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl From<&DownloadSettings> for DownloadConfig {
    fn from(settings: &DownloadSettings) -> Self {
        Self::new()
            .with_timeout_secs(settings.timeout)
            .with_retries(settings.retries)
            .with_retry_base_delay_ms(settings.retry_base_delay_ms)
            .with_concurrency(settings.concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DownloadConfig::default();
        assert_eq!(config.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.retries(), DEFAULT_RETRIES);
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(
            config.retry_policy().base_delay,
            Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS)
        );
    }

    #[test]
    fn test_builder_chain() {
        let config = DownloadConfig::new()
            .with_timeout_secs(45)
            .with_retries(2)
            .with_concurrency(16);

        assert_eq!(config.timeout(), Duration::from_secs(45));
        assert_eq!(config.retries(), 2);
        assert_eq!(config.concurrency(), 16);
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(DownloadConfig::new().with_concurrency(0).concurrency(), 1);
        assert_eq!(
            DownloadConfig::new().with_concurrency(10_000).concurrency(),
            MAX_CONCURRENCY
        );
    }

    #[test]
    fn test_zero_timeout_is_raised() {
        assert_eq!(DownloadConfig::new().with_timeout_secs(0).timeout_secs(), 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = DownloadSettings {
            timeout: 20,
            concurrency: 2,
            retries: 3,
            retry_base_delay_ms: 50,
        };

        let config = DownloadConfig::from(&settings);

        assert_eq!(config.timeout_secs(), 20);
        assert_eq!(config.concurrency(), 2);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(3, Duration::from_millis(50))
        );
    }
}
