//! Report resolution: authoritative fetch with cached-pointer fallback.
//!
//! A lookup ends in one of four outcomes:
//! - `Loaded`: the backend returned the report.
//! - `Processing`: the backend has nothing yet, but we know the image from
//!   the cache; a placeholder report is shown with a warning.
//! - `NotFound`: neither the backend nor the cache know the hash.
//! - `Failed`: the fetch errored; the cache is used for a placeholder when
//!   possible.

mod panels;
mod session;

pub use panels::{fix_image_url, AnalysisTab, Fact, HeatMap, Panel, PanelContent};
pub use session::{FetchToken, ReportViewer, ViewerPhase};

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::ReportSource;
use crate::cache::ReportCache;
use crate::models::{CacheEntry, Report, ReportStatus};

pub const MSG_PARTIAL: &str =
    "Report data is not fully available yet, but we found some basic information.";
pub const MSG_NOT_FOUND: &str =
    "Report not found. The report may still be processing or the hash is invalid.";
pub const MSG_FAILED: &str = "Failed to load report.";

/// How a lookup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Loaded,
    Processing,
    NotFound,
    Failed,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Message shown above (or instead of) the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn warning(message: &str) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.to_string(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        }
    }
}

/// Result of resolving a hash, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub hash: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
}

impl ReportView {
    /// Analysis panels in display order. Empty when there is no report.
    pub fn panels(&self, image_origin: Option<&str>) -> Vec<Panel> {
        match self.report {
            Some(ref report) => AnalysisTab::ALL
                .iter()
                .map(|tab| Panel::build(*tab, report, image_origin))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether the backend may still produce more data for this hash.
    pub fn is_settled(&self) -> bool {
        match self.outcome {
            Outcome::Loaded => self.report.as_ref().map_or(true, |r| r.is_complete()),
            _ => false,
        }
    }
}

/// Resolve `hash` against the backend, degrading to the cache.
///
/// On a successful fetch that carries a source URL, a pointer is added to the
/// cache if the hash is not already there.
pub async fn resolve(source: &dyn ReportSource, cache: &ReportCache, hash: &str) -> ReportView {
    let cached = cache.find(hash);
    match cached {
        Some(ref entry) => debug!("Found cached pointer for {}: {}", hash, entry.url),
        None => debug!("No cached pointer for {}, fetching from backend", hash),
    }

    match source.fetch_report(hash).await {
        Ok(Some(report)) => {
            if cached.is_none() {
                if let Some(ref url) = report.source_url {
                    if let Err(e) = cache.record(CacheEntry::new(hash, url.clone())) {
                        warn!("Failed to cache report pointer for {}: {}", hash, e);
                    }
                }
            }
            ReportView {
                hash: hash.to_string(),
                outcome: Outcome::Loaded,
                notice: None,
                report: Some(report),
            }
        }
        Ok(None) => match cached {
            Some(entry) => ReportView {
                hash: hash.to_string(),
                outcome: Outcome::Processing,
                notice: Some(Notice::warning(MSG_PARTIAL)),
                report: Some(Report::placeholder(hash, &entry, ReportStatus::Processing)),
            },
            None => ReportView {
                hash: hash.to_string(),
                outcome: Outcome::NotFound,
                notice: Some(Notice::error(MSG_NOT_FOUND)),
                report: None,
            },
        },
        Err(e) => {
            warn!("Error fetching report {}: {}", hash, e);
            ReportView {
                hash: hash.to_string(),
                outcome: Outcome::Failed,
                notice: Some(Notice::error(MSG_FAILED)),
                report: cached.map(|entry| Report::placeholder(hash, &entry, ReportStatus::Error)),
            }
        }
    }
}
