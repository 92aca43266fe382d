//! Providers command - list configured providers and built-in presets.

use tilesieve::provider::{ProviderRegistry, PRESETS};

use super::common::GlobalArgs;
use crate::error::CliError;
use crate::runner::load_config;

/// Run the providers command.
///
/// Fails if any configured provider is invalid, so this doubles as a
/// config check before a long fetch.
pub fn run(global: &GlobalArgs) -> Result<(), CliError> {
    let config = load_config(global.config.as_deref())?;
    let registry = ProviderRegistry::new(config.providers.iter().cloned())?;

    println!("Configured providers:");
    if registry.is_empty() {
        println!("  (none - add a [provider.<name>] section to config.ini)");
    }
    for entry in registry.iter() {
        let state = if entry.enabled { "enabled" } else { "disabled" };
        println!("  {:<20} {:<9} {}", entry.name, state, entry.template);
        if !entry.template.subdomains().is_empty() {
            println!("  {:<20} {:<9} subdomains: {}", "", "", entry.template.subdomains().join(","));
        }
    }

    println!();
    println!("Built-in presets (use 'preset = <name>'):");
    for preset in PRESETS {
        println!("  {:<20} {}", preset.name, preset.description);
        if !preset.credentials.is_empty() {
            println!("  {:<20} requires: {}", "", preset.credentials.join(", "));
        }
    }

    Ok(())
}
