//! Tile URL templates.
//!
//! A template is a URL with `{placeholder}` markers:
//!
//! - `{z}`, `{x}`, `{y}`: tile coordinates (standard XYZ, y counts north to south)
//! - `{s}`: subdomain, rotated over the configured list by `(x + y) mod len`
//! - `{name}`: any credential configured for the provider, e.g. `{mapbox_token}`
//!
//! Templates are validated once when the provider is configured, so
//! rendering a URL for a tile cannot fail.

use std::collections::BTreeMap;
use std::fmt;

use super::types::ProviderError;
use crate::coord::TileCoord;

#[derive(Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Zoom,
    X,
    Y,
    Subdomain,
    Credential { name: String, value: String },
}

/// A validated tile URL template with its credentials bound.
#[derive(Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Segment>,
    subdomains: Vec<String>,
}

impl UrlTemplate {
    /// Parses and validates a template.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidTemplate`] for unbalanced braces, an
    /// empty or unknown placeholder, `{s}` without subdomains, or a template
    /// missing any of `{z}`, `{x}` or `{y}`.
    pub fn parse(
        template: &str,
        credentials: &BTreeMap<String, String>,
        subdomains: &[String],
    ) -> Result<Self, ProviderError> {
        let invalid = |reason: String| ProviderError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        match c {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(invalid("nested '{'".to_string())),
                            c => name.push(c),
                        }
                    }
                    if !closed {
                        return Err(invalid("unclosed '{'".to_string()));
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }

                    let segment = match name.as_str() {
                        "" => return Err(invalid("empty placeholder '{}'".to_string())),
                        "z" => Segment::Zoom,
                        "x" => Segment::X,
                        "y" => Segment::Y,
                        "s" if subdomains.is_empty() => {
                            return Err(invalid(
                                "'{s}' used but no subdomains are configured".to_string(),
                            ))
                        }
                        "s" => Segment::Subdomain,
                        other => match credentials.get(other) {
                            Some(value) => Segment::Credential {
                                name: other.to_string(),
                                value: value.clone(),
                            },
                            None => {
                                return Err(invalid(format!("unknown placeholder '{{{}}}'", other)))
                            }
                        },
                    };
                    segments.push(segment);
                }
                '}' => return Err(invalid("unmatched '}'".to_string())),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        for (required, label) in [(Segment::Zoom, "{z}"), (Segment::X, "{x}"), (Segment::Y, "{y}")] {
            if !segments.contains(&required) {
                return Err(invalid(format!("missing {}", label)));
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
            subdomains: subdomains.to_vec(),
        })
    }

    /// Substitutes every placeholder for the given tile.
    pub fn render_url(&self, tile: &TileCoord) -> String {
        let mut url = String::with_capacity(self.raw.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Zoom => url.push_str(&tile.zoom.to_string()),
                Segment::X => url.push_str(&tile.x.to_string()),
                Segment::Y => url.push_str(&tile.y.to_string()),
                Segment::Subdomain => url.push_str(self.subdomain_for(tile)),
                Segment::Credential { value, .. } => url.push_str(value),
            }
        }
        url
    }

    /// The template as written, placeholders intact.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Names of the credentials this template uses.
    pub fn credential_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Credential { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    fn subdomain_for(&self, tile: &TileCoord) -> &str {
        let index = (u64::from(tile.x) + u64::from(tile.y)) % self.subdomains.len() as u64;
        &self.subdomains[index as usize]
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// Credentials stay out of debug output and logs.
impl fmt::Debug for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlTemplate")
            .field("template", &self.raw)
            .field("subdomains", &self.subdomains)
            .finish()
    }
}
