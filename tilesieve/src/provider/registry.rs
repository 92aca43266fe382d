//! Provider registry: the configured tile sources of a run.
//!
//! Built once at startup from [`ProviderSpec`]s and never mutated. Every
//! template is validated while building, so a registry only ever holds
//! providers whose URLs can be rendered.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::http::AsyncHttpClient;
use super::presets::preset;
use super::template::UrlTemplate;
use super::tile::{RetryPolicy, TileProvider};
use super::types::ProviderError;

/// Where a provider's URL template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSource {
    /// A literal template
    Url(String),
    /// One of the built-in presets, by name
    Preset(String),
}

/// Configuration of a single provider, as read from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    pub name: String,
    pub source: ProviderSource,
    /// Overrides the preset's subdomains when non-empty
    pub subdomains: Vec<String>,
    /// Values for credential placeholders such as `{mapbox_token}`
    pub credentials: BTreeMap<String, String>,
    pub enabled: bool,
}

impl ProviderSpec {
    /// Provider using a literal URL template.
    pub fn url(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: ProviderSource::Url(template.into()),
            subdomains: Vec::new(),
            credentials: BTreeMap::new(),
            enabled: true,
        }
    }

    /// Provider using a built-in preset.
    pub fn preset(name: impl Into<String>, preset: impl Into<String>) -> Self {
        Self {
            source: ProviderSource::Preset(preset.into()),
            ..Self::url(name, String::new())
        }
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    pub fn with_subdomains(mut self, subdomains: Vec<String>) -> Self {
        self.subdomains = subdomains;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Resolves the source and validates the template.
    fn resolve(&self) -> Result<UrlTemplate, ProviderError> {
        let (template, default_subdomains): (&str, Vec<String>) = match &self.source {
            ProviderSource::Url(url) => (url.as_str(), Vec::new()),
            ProviderSource::Preset(name) => {
                let preset = preset(name).ok_or_else(|| ProviderError::InvalidTemplate {
                    template: format!("preset:{}", name),
                    reason: "unknown preset".to_string(),
                })?;
                (
                    preset.template,
                    preset.subdomains.iter().map(|s| s.to_string()).collect(),
                )
            }
        };

        let subdomains = if self.subdomains.is_empty() {
            default_subdomains
        } else {
            self.subdomains.clone()
        };

        UrlTemplate::parse(template, &self.credentials, &subdomains)
    }
}

/// Checks that a provider name is safe to use as a single path component.
pub fn validate_provider_name(name: &str) -> Result<(), ProviderError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if name.is_empty() || !valid_chars || name == "." || name == ".." {
        return Err(ProviderError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A validated provider: name, template and whether it takes part in runs.
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub name: String,
    pub template: UrlTemplate,
    pub enabled: bool,
}

/// Immutable name → provider mapping.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: BTreeMap<String, ProviderEntry>,
}

impl ProviderRegistry {
    /// Validates every spec and builds the registry.
    ///
    /// # Errors
    ///
    /// The first invalid name, duplicate name or invalid template.
    pub fn new(specs: impl IntoIterator<Item = ProviderSpec>) -> Result<Self, ProviderError> {
        let mut entries = BTreeMap::new();

        for spec in specs {
            validate_provider_name(&spec.name)?;
            let template = spec.resolve()?;

            if entries.contains_key(&spec.name) {
                return Err(ProviderError::InvalidName(format!(
                    "{} (defined twice)",
                    spec.name
                )));
            }
            entries.insert(
                spec.name.clone(),
                ProviderEntry {
                    name: spec.name,
                    template,
                    enabled: spec.enabled,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.entries.get(name)
    }

    /// All providers, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.entries.values()
    }

    /// Enabled providers, sorted by name.
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.entries.values().filter(|e| e.enabled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instantiates the providers for a run over one shared client.
    ///
    /// With an empty `only`, every enabled provider is used. Otherwise the
    /// named providers are used whether enabled or not, and an unknown name
    /// is an error.
    pub fn build_providers<C: AsyncHttpClient>(
        &self,
        client: Arc<C>,
        retry: RetryPolicy,
        only: &[String],
    ) -> Result<Vec<TileProvider<C>>, ProviderError> {
        let selected: Vec<&ProviderEntry> = if only.is_empty() {
            self.enabled().collect()
        } else {
            only.iter()
                .map(|name| {
                    self.get(name)
                        .ok_or_else(|| ProviderError::InvalidName(format!("{} (not configured)", name)))
                })
                .collect::<Result<_, _>>()?
        };

        Ok(selected
            .into_iter()
            .map(|entry| {
                TileProvider::new(&entry.name, entry.template.clone(), Arc::clone(&client))
                    .with_retry(retry)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::provider::http::tests::MockAsyncHttpClient;

    #[test]
    fn test_provider_names() {
        for good in ["osm", "google-satellite", "tianditu_vec", "v1.2"] {
            assert!(validate_provider_name(good).is_ok(), "{}", good);
        }
        for bad in ["", ".", "..", "a/b", "a b", "../etc", "naïve"] {
            assert!(
                matches!(validate_provider_name(bad), Err(ProviderError::InvalidName(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_registry_from_url_and_preset() {
        let registry = ProviderRegistry::new(vec![
            ProviderSpec::url("osm", "https://{s}.tile.example/{z}/{x}/{y}.png")
                .with_subdomains(vec!["a".into(), "b".into()]),
            ProviderSpec::preset("streets", "mapbox-streets").with_credential("mapbox_token", "pk"),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        let streets = registry.get("streets").unwrap();
        assert!(streets
            .template
            .render_url(&TileCoord { zoom: 1, x: 0, y: 1 })
            .ends_with("streets-v11/tiles/1/0/1?access_token=pk"));
    }

    #[test]
    fn test_invalid_template_fails_registry() {
        let result = ProviderRegistry::new(vec![ProviderSpec::url("bad", "https://t/{z}/{x}")]);
        assert!(matches!(result, Err(ProviderError::InvalidTemplate { .. })));
    }

    #[test]
    fn test_unknown_preset_fails_registry() {
        let result = ProviderRegistry::new(vec![ProviderSpec::preset("x", "bing-aerial")]);
        assert!(matches!(result, Err(ProviderError::InvalidTemplate { .. })));
    }

    #[test]
    fn test_duplicate_name_fails_registry() {
        let result = ProviderRegistry::new(vec![
            ProviderSpec::url("osm", "https://a/{z}/{x}/{y}"),
            ProviderSpec::url("osm", "https://b/{z}/{x}/{y}"),
        ]);
        assert!(matches!(result, Err(ProviderError::InvalidName(_))));
    }

    #[test]
    fn test_build_providers_respects_enabled_and_filter() {
        let registry = ProviderRegistry::new(vec![
            ProviderSpec::url("a", "https://a/{z}/{x}/{y}"),
            ProviderSpec::url("b", "https://b/{z}/{x}/{y}").disabled(),
            ProviderSpec::url("c", "https://c/{z}/{x}/{y}"),
        ])
        .unwrap();
        let client = Arc::new(MockAsyncHttpClient::new(Ok(Vec::new())));

        let all = registry
            .build_providers(Arc::clone(&client), RetryPolicy::none(), &[])
            .unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "c"]);

        let only = registry
            .build_providers(Arc::clone(&client), RetryPolicy::none(), &["b".to_string()])
            .unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name(), "b");

        assert!(registry
            .build_providers(client, RetryPolicy::none(), &["zzz".to_string()])
            .is_err());
    }
}
