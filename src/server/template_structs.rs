//! Askama template structs for the web interface.
//!
//! Each struct corresponds to an HTML template in the templates/ directory.
//! Askama provides compile-time verification that templates are valid.

use askama::Template;

use crate::models::CacheEntry;
use crate::viewer::{Panel, PanelContent, ReportView};

/// Helper struct for rows in the report list.
pub struct ReportRow {
    pub hash: String,
    pub encoded: String,
    pub url: String,
    pub date_str: String,
}

/// Helper struct for a labelled value under a heat map.
pub struct FactRow {
    pub name: &'static str,
    pub value: String,
}

/// Helper struct for one heat map image.
pub struct HeatMapView {
    pub label: String,
    pub image: String,
    pub alt: String,
    pub facts: Vec<FactRow>,
}

/// Helper struct for one analysis tab and its panel.
pub struct PanelView {
    pub key: &'static str,
    pub title: &'static str,
    pub heading: &'static str,
    pub description: &'static str,
    pub checked: bool,
    pub heat_maps: Vec<HeatMapView>,
    pub has_json: bool,
    pub json: String,
    pub unavailable: &'static str,
}

/// Report list page.
#[derive(Template)]
#[template(path = "report_list.html")]
pub struct ReportListTemplate<'a> {
    pub title: &'a str,
    pub reports: Vec<ReportRow>,
    pub has_reports: bool,
}

/// Report detail page.
#[derive(Template)]
#[template(path = "report_detail.html")]
pub struct ReportDetailTemplate<'a> {
    pub title: &'a str,
    pub hash: &'a str,
    pub has_notice: bool,
    pub notice_level: &'static str,
    pub notice_message: String,
    pub source_url: String,
    pub status: String,
    pub display_image: String,
    pub panels: Vec<PanelView>,
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub title: &'a str,
    pub message: &'a str,
}

// Helper implementations for converting data to template structs

impl ReportRow {
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            hash: entry.hash.clone(),
            encoded: urlencoding::encode(&entry.hash).to_string(),
            url: entry.url.clone(),
            date_str: entry.date_str(),
        }
    }
}

impl PanelView {
    pub fn from_panel(panel: Panel, checked: bool) -> Self {
        let tab = panel.tab;
        let (heat_maps, json) = match panel.content {
            PanelContent::HeatMaps(maps) => (
                maps.into_iter()
                    .map(|map| HeatMapView {
                        label: map.label.unwrap_or_default(),
                        image: map.image,
                        alt: map.alt,
                        facts: map
                            .facts
                            .into_iter()
                            .map(|f| FactRow {
                                name: f.name,
                                value: f.value,
                            })
                            .collect(),
                    })
                    .collect(),
                None,
            ),
            PanelContent::Json(json) => (Vec::new(), Some(json)),
            PanelContent::Unavailable => (Vec::new(), None),
        };

        Self {
            key: tab.key(),
            title: tab.title(),
            heading: tab.heading(),
            description: tab.description(),
            checked,
            heat_maps,
            has_json: json.is_some(),
            json: json.unwrap_or_default(),
            unavailable: tab.unavailable_message(),
        }
    }
}

impl<'a> ReportDetailTemplate<'a> {
    /// Build the page for a view that carries a report.
    pub fn from_view(title: &'a str, view: &'a ReportView, image_origin: Option<&str>) -> Self {
        let report = view.report.as_ref();
        let display_image = report
            .and_then(|r| r.display_image.as_deref())
            .map(|url| crate::viewer::fix_image_url(url, image_origin))
            .unwrap_or_default();

        Self {
            title,
            hash: &view.hash,
            has_notice: view.notice.is_some(),
            notice_level: view.notice.as_ref().map(|n| n.level.as_str()).unwrap_or(""),
            notice_message: view
                .notice
                .as_ref()
                .map(|n| n.message.clone())
                .unwrap_or_default(),
            source_url: report
                .and_then(|r| r.source_url.clone())
                .unwrap_or_default(),
            status: report
                .and_then(|r| r.status.as_ref())
                .map(|s| s.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            display_image,
            panels: view
                .panels(image_origin)
                .into_iter()
                .enumerate()
                // First tab is selected
                .map(|(i, panel)| PanelView::from_panel(panel, i == 0))
                .collect(),
        }
    }
}
