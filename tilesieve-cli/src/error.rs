//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tilesieve::cache::CacheError;
use tilesieve::config::ConfigFileError;
use tilesieve::orchestrator::OrchestratorError;
use tilesieve::provider::ProviderError;

/// Exit code for configuration and fatal errors.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when a run was interrupted (128 + SIGINT).
pub const EXIT_CANCELLED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file or override rejected
    Config(ConfigFileError),
    /// Invalid command-line argument
    Argument(String),
    /// HTTP client or provider setup failed
    Provider(ProviderError),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Fetch run ended early
    Fetch(OrchestratorError),
    /// Cache inspection failed
    Cache(CacheError),
    /// Failed to render JSON output
    Output(serde_json::Error),
    /// Interrupted by the user
    Cancelled,
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Cancelled => EXIT_CANCELLED,
            _ => EXIT_FAILURE,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigFileError::Missing { section, .. }) if section == "region" => {
                eprintln!();
                eprintln!("Set [region] min_lon, min_lat, max_lon and max_lat in config.ini");
                eprintln!("or pass --bbox min_lon,min_lat,max_lon,max_lat");
            }
            CliError::Config(ConfigFileError::Missing { section, .. })
                if section.starts_with("provider") =>
            {
                eprintln!();
                eprintln!("Add a provider section to config.ini, for example:");
                eprintln!("  [provider.google]");
                eprintln!("  preset = google-satellite");
                eprintln!("Run 'tilesieve providers' to list the built-in presets.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Argument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Provider(e) => write!(f, "Provider error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Fetch(e) => write!(f, "Fetch failed: {}", e),
            CliError::Cache(e) => write!(f, "Cache error: {}", e),
            CliError::Output(e) => write!(f, "Failed to write JSON output: {}", e),
            CliError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Provider(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Cache(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<OrchestratorError> for CliError {
    fn from(e: OrchestratorError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
