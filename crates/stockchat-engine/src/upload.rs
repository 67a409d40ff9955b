//! CSV upload to the stock price backend.
//!
//! The backend accepts a multipart form with a single `file` part on
//! `POST /api/stocks/upload_csv` and rejects files whose header row does not
//! match its table layout. The header is checked locally first so an obviously
//! wrong file never leaves the machine.

use crate::client::backend_error_message;
use std::path::Path;
use tracing::info;
use url::Url;

/// Header row the backend expects, in order.
pub const EXPECTED_COLUMNS: [&str; 8] = [
    "Date",
    "Stock",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Change Pct",
];

/// Outcome of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// HTTP status returned by the backend.
    pub status: u16,
    /// Backend message, e.g. "Successfully uploaded 42 records."
    pub message: String,
}

/// Check that the first line of `contents` is the expected header row.
pub fn validate_header(contents: &str) -> Result<(), UploadError> {
    let header = contents
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches('\u{feff}');

    let found: Vec<String> = header
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect();

    if found.iter().map(String::as_str).eq(EXPECTED_COLUMNS) {
        Ok(())
    } else {
        Err(UploadError::Columns {
            expected: EXPECTED_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            found,
        })
    }
}

/// Upload a CSV file to the given endpoint.
pub async fn upload_csv(endpoint: &Url, path: &Path) -> Result<UploadReport, UploadError> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(UploadError::NotCsv(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await.map_err(UploadError::Io)?;
    validate_header(&String::from_utf8_lossy(&bytes))?;

    let file_name = path
        .file_name()
        .map_or_else(|| "upload.csv".to_string(), |n| n.to_string_lossy().to_string());
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("text/csv")
        .map_err(UploadError::Transport)?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = reqwest::Client::new()
        .post(endpoint.clone())
        .multipart(form)
        .send()
        .await
        .map_err(UploadError::Transport)?;

    let status = response.status();
    let body = response.text().await.map_err(UploadError::Transport)?;

    if !status.is_success() {
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            message: backend_error_message(&body),
        });
    }

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string());

    info!(status = status.as_u16(), %message, "csv uploaded");
    Ok(UploadReport {
        status: status.as_u16(),
        message,
    })
}

/// Errors that can occur while uploading a CSV file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not have a `.csv` extension.
    #[error("File is not a CSV: {0}")]
    NotCsv(String),

    /// The header row does not match the backend's columns.
    #[error("CSV columns do not match expected schema. Expected: {expected:?}, Found: {found:?}")]
    Columns {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Connection or body read failure.
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend refused the upload.
    #[error("Upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}
