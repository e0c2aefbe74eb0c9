//! Data models for the forensics viewer.

mod cache_entry;
mod report;

pub use cache_entry::CacheEntry;
pub use report::{
    GhostEntry, GhostReport, HeatMapReport, ManipulatedScoreReport, Report, ReportStatus,
    ThumbnailReport,
};
