//! Report list and report page handlers.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
};

use super::super::template_structs::{
    ErrorTemplate, ReportDetailTemplate, ReportListTemplate, ReportRow,
};
use super::super::AppState;
use super::view_status;
use crate::viewer::{self, Outcome};

pub async fn index() -> Redirect {
    Redirect::to("/reports")
}

/// Cached report pointers, newest first.
pub async fn list_reports(State(state): State<AppState>) -> impl IntoResponse {
    let reports: Vec<ReportRow> = state
        .cache
        .entries()
        .iter()
        .map(ReportRow::from_entry)
        .collect();

    let template = ReportListTemplate {
        title: "Reports",
        has_reports: !reports.is_empty(),
        reports,
    };
    Html(template.render().unwrap_or_else(|e| e.to_string()))
}

/// Report page: notice, image information and analysis tabs.
pub async fn report_detail(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> impl IntoResponse {
    let view = viewer::resolve(state.source.as_ref(), &state.cache, &hash).await;
    let status = view_status(&view);

    let html = if view.report.is_some() {
        ReportDetailTemplate::from_view("Forensic Report", &view, state.image_origin.as_deref())
            .render()
    } else {
        let title = match view.outcome {
            Outcome::Failed => "Error",
            _ => "Not Found",
        };
        let message = view.notice.as_ref().map(|n| n.message.as_str()).unwrap_or("");
        ErrorTemplate { title, message }.render()
    };

    (status, Html(html.unwrap_or_else(|e| e.to_string())))
}
