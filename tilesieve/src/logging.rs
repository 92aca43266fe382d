//! Logging infrastructure for tilesieve.
//!
//! Provides structured logging with file output and console output:
//! - Writes to the configured log file (cleared on each run)
//! - Also prints compact lines to stderr so stdout stays clean for `--json`
//! - Configurable via RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging system.
///
/// Creates the log directory if needed, clears the previous log file,
/// and sets up dual output to both the file and stderr.
///
/// `debug` forces the debug level. Otherwise `RUST_LOG` is honoured and
/// the default is info.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(log_path: &Path, debug: bool) -> Result<LoggingGuard, io::Error> {
    let (log_dir, log_file) = split_log_path(log_path)?;

    fs::create_dir_all(log_dir)?;

    // Clear previous log file by writing empty content
    fs::write(log_path, "")?;

    // Create file appender with non-blocking writer
    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false) // No ANSI colors in file
        .with_target(true);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new(default_level(true));
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(false)))
}

fn split_log_path(log_path: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let file = log_path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path {} has no file name", log_path.display()),
        )
    })?;
    let dir = match log_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    Ok((dir, file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false), "info");
        assert_eq!(default_level(true), "debug");
    }

    #[test]
    fn test_debug_flag_overrides_env() {
        // Holds whether or not RUST_LOG is set in the test environment
        assert_eq!(env_filter(true).to_string(), "debug");
    }

    #[test]
    fn test_split_log_path() {
        let path = PathBuf::from("/var/log/tilesieve/run.log");
        let (dir, file) = split_log_path(&path).unwrap();

        assert_eq!(dir, Path::new("/var/log/tilesieve"));
        assert_eq!(file, "run.log");
    }

    #[test]
    fn test_split_bare_file_name_uses_current_dir() {
        let (dir, file) = split_log_path(Path::new("run.log")).unwrap();

        assert_eq!(dir, Path::new("."));
        assert_eq!(file, "run.log");
    }

    #[test]
    fn test_split_rejects_path_without_file_name() {
        assert!(split_log_path(Path::new("/")).is_err());
    }
}
