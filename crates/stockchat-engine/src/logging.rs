//! File logging setup.
//!
//! The TUI owns the terminal, so diagnostics go to a file through a
//! `tracing-subscriber` fmt layer instead of stdout.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// Parse a log level name (`error`, `warn`, `info`, `debug`, `trace`).
pub fn parse_level(level: &str) -> Result<Level, LogError> {
    level
        .trim()
        .parse()
        .map_err(|_| LogError::InvalidLevel(level.to_string()))
}

/// Install a global subscriber appending to `path`.
pub fn init_file_logging(path: &Path, level: &str) -> Result<(), LogError> {
    let level = parse_level(level)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(LogError::Io)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(LogError::Io)?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init()
        .map_err(LogError::Init)
}

/// Errors that can occur while setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file could not be opened.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown level name.
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber is already installed.
    #[error("Failed to install log subscriber: {0}")]
    Init(#[source] Box<dyn std::error::Error + Send + Sync>),
}
