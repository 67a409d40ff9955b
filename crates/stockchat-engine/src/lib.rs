//! stockchat-engine: Headless engine for the stock data chat client
//!
//! This crate provides the core conversation logic, including:
//! - The append-only conversation store
//! - The single-flight query dispatcher
//! - The HTTP client for the `/api/query` backend
//! - CSV upload to the stock price backend
//! - Configuration and file logging

pub mod client;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod logging;
pub mod upload;

// Re-export commonly used types
pub use client::{HttpQueryClient, QueryClient, QueryError, QueryRequest, QueryResponse};
pub use config::{Config, ConfigError, API_URL_ENV, DEFAULT_API_URL};
pub use conversation::{Conversation, Message};
pub use dispatcher::{DispatchState, Dispatcher, PendingQuery, ERROR_MESSAGE};
pub use logging::{init_file_logging, LogError};
pub use upload::{upload_csv, UploadError, UploadReport, EXPECTED_COLUMNS};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
