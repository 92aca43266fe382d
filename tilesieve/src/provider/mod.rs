//! Tile providers.
//!
//! A provider is a named URL template plus a shared HTTP client. Providers
//! are configured through [`ProviderSpec`]s, either from a literal template
//! or from one of the built-in [`presets`], and collected into an immutable
//! [`ProviderRegistry`] at startup.
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilesieve::provider::{AsyncReqwestClient, ProviderRegistry, ProviderSpec, RetryPolicy};
//!
//! let registry = ProviderRegistry::new(vec![
//!     ProviderSpec::preset("satellite", "google-satellite"),
//! ])?;
//! let client = Arc::new(AsyncReqwestClient::new()?);
//! let providers = registry.build_providers(client, RetryPolicy::none(), &[])?;
//! ```

mod http;
pub mod presets;
mod registry;
mod template;
mod tile;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_TIMEOUT};
pub use presets::{Preset, PRESETS};
pub use registry::{
    validate_provider_name, ProviderEntry, ProviderRegistry, ProviderSource, ProviderSpec,
};
pub use template::UrlTemplate;
pub use tile::{ensure_png, RetryPolicy, TileProvider, DEFAULT_RETRY_BASE_DELAY};
pub use types::ProviderError;

#[cfg(test)]
pub use http::tests::{MockAsyncHttpClient, SequenceHttpClient};
