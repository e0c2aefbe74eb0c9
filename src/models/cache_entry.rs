//! Lightweight pointer to a report, kept locally as a fallback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached pointer to a report: which image, where it came from, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub hash: String,
    /// Source URL of the analysed image.
    pub url: String,
    /// Locally stored copy of the image, if the backend kept one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(hash: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            url: url.into(),
            file_url: None,
            date: Some(Utc::now()),
        }
    }

    /// Human-readable date, empty when unknown.
    pub fn date_str(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}
