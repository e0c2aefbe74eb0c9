//! Client for the forensic analysis backend.
//!
//! The backend exposes its verification-report endpoints under
//! `/mmapi/media/verificationreport/`. Only `getreport` is needed to display
//! a report; `addurl` and `generatereport` submit new images for analysis.

mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Report;

/// Errors that can occur talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode report: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Anything that can produce the authoritative report for a hash.
///
/// `Ok(None)` means the backend has nothing (yet) for this hash.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch_report(&self, hash: &str) -> Result<Option<Report>, ApiError>;
}
