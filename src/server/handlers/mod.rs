//! HTTP request handlers for the web server.

mod api;
mod reports;
mod static_files;

// Re-export handlers for use by the router
pub use api::{api_report, health};
pub use reports::{index, list_reports, report_detail};
pub use static_files::serve_css;

use axum::http::StatusCode;

use crate::viewer::{Outcome, ReportView};

/// HTTP status for a resolved view. Views without a report are errors.
fn view_status(view: &ReportView) -> StatusCode {
    match (view.outcome, view.report.is_some()) {
        (_, true) => StatusCode::OK,
        (Outcome::Failed, false) => StatusCode::BAD_GATEWAY,
        (_, false) => StatusCode::NOT_FOUND,
    }
}
