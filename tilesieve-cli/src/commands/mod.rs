//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Cache inspection (stats, clean)
//! - [`fetch`] - Select tiles and download them into the cache
//! - [`providers`] - List configured providers and built-in presets
//! - [`select`] - Dry run: count selected tiles per zoom level

pub mod cache;
pub mod common;
pub mod fetch;
pub mod providers;
pub mod select;
