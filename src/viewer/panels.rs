//! Declarative analysis panels.
//!
//! Each tab looks only at its own sub-report and yields either content or
//! the "not available" state. Nothing is computed here beyond formatting.

use serde::Serialize;
use url::{Position, Url};

use crate::models::{HeatMapReport, Report};

/// The analysis tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisTab {
    Ela,
    Dq,
    Noise,
    Ghost,
    Blocking,
    MedianNoise,
    Grids,
    GridsInversed,
    ManipulatedScore,
    Metadata,
}

impl AnalysisTab {
    pub const ALL: [AnalysisTab; 10] = [
        Self::Ela,
        Self::Dq,
        Self::Noise,
        Self::Ghost,
        Self::Blocking,
        Self::MedianNoise,
        Self::Grids,
        Self::GridsInversed,
        Self::ManipulatedScore,
        Self::Metadata,
    ];

    /// Stable identifier used for anchors and tab selection.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ela => "ela",
            Self::Dq => "dq",
            Self::Noise => "noise",
            Self::Ghost => "ghost",
            Self::Blocking => "blocking",
            Self::MedianNoise => "median",
            Self::Grids => "grids",
            Self::GridsInversed => "gridsInversed",
            Self::ManipulatedScore => "manipulated",
            Self::Metadata => "metadata",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Ela => "Error Level Analysis",
            Self::Dq => "Double Quantization",
            Self::Noise => "Noise Analysis",
            Self::Ghost => "Ghost Analysis",
            Self::Blocking => "Blocking Artifacts",
            Self::MedianNoise => "Median Noise",
            Self::Grids => "Grids Analysis",
            Self::GridsInversed => "Grids Inversed",
            Self::ManipulatedScore => "Manipulation Score",
            Self::Metadata => "Metadata",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Self::Ela => "Error Level Analysis (ELA)",
            Self::Dq => "Double JPEG Quantization (DQ)",
            Self::Noise => "Noise Analysis",
            Self::Ghost => "Ghost Analysis",
            Self::Blocking => "Blocking Artifacts Analysis",
            Self::MedianNoise => "Median Noise Analysis",
            Self::Grids => "Grids Analysis",
            Self::GridsInversed => "Grids Inversed Analysis",
            Self::ManipulatedScore => "Manipulation Detection Score",
            Self::Metadata => "Image Metadata",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ela => {
                "Resaves the image at a known JPEG quality and maps the difference. \
                 Regions edited after the last save tend to show a different error \
                 level than their surroundings; bright areas deserve a closer look."
            }
            Self::Dq => {
                "Looks for blocks that went through two JPEG compressions with different \
                 quality tables. Spliced or locally edited regions often carry \
                 quantization traces that disagree with the rest of the image."
            }
            Self::Noise => {
                "Maps the local noise residual. Every camera leaves a characteristic \
                 noise pattern, and pasted, cloned or retouched regions usually break it."
            }
            Self::Ghost => {
                "Recompresses the image at a range of qualities. Content that was \
                 previously saved at one of those qualities shows up as a dark \
                 \"ghost\" in the matching difference map."
            }
            Self::Blocking => {
                "Measures the strength of the 8x8 JPEG block artifacts. Content taken \
                 from a differently compressed source stands out with a blocking \
                 pattern of its own."
            }
            Self::MedianNoise => {
                "Filters the image with a median filter and maps the residual. Smoothed, \
                 cloned or synthesized regions show residuals unlike the authentic parts."
            }
            Self::Grids => {
                "Checks the alignment of the JPEG block grid across the image. Pasted \
                 content rarely lines up with the host image's 8x8 grid."
            }
            Self::GridsInversed => {
                "Inverted view of the grid alignment map. Read it together with the \
                 Grids tab; regions that stand out in both are the most suspicious."
            }
            Self::ManipulatedScore => {
                "Output of a learned manipulation detector: an overall score for the \
                 image and a localization map of the regions that drove it."
            }
            Self::Metadata => {
                "Embedded metadata: camera make and model, capture settings, software, \
                 GPS position and timestamps. Inconsistent or stripped metadata can \
                 itself be a sign of editing."
            }
        }
    }

    pub fn unavailable_message(&self) -> &'static str {
        match self {
            Self::Ela => "ELA analysis not available",
            Self::Dq => "DQ analysis not available",
            Self::Noise => "Noise analysis not available",
            Self::Ghost => "Ghost analysis not available",
            Self::Blocking => "Blocking analysis not available",
            Self::MedianNoise => "Median noise analysis not available",
            Self::Grids => "Grids analysis not available",
            Self::GridsInversed => "Grids inversed analysis not available",
            Self::ManipulatedScore => "Manipulation score not available",
            Self::Metadata => "Metadata not available",
        }
    }

    fn alt(&self) -> &'static str {
        match self {
            Self::Ela => "ELA Analysis",
            Self::Dq => "DQ Analysis",
            Self::Noise => "Noise Analysis",
            Self::Ghost => "Ghost Analysis",
            Self::Blocking => "Blocking Analysis",
            Self::MedianNoise => "Median Noise Analysis",
            Self::Grids => "Grids Analysis",
            Self::GridsInversed => "Grids Inversed Analysis",
            Self::ManipulatedScore => "Manipulation Map",
            Self::Metadata => "Metadata",
        }
    }
}

/// A labelled number under a heat map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub name: &'static str,
    pub value: String,
}

impl Fact {
    fn new(name: &'static str, value: Option<f64>) -> Self {
        Self {
            name,
            value: format_value(value),
        }
    }
}

/// One rendered heat map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMap {
    pub label: Option<String>,
    pub image: String,
    pub alt: String,
    pub facts: Vec<Fact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PanelContent {
    HeatMaps(Vec<HeatMap>),
    Json(String),
    Unavailable,
}

/// A tab together with what it shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub tab: AnalysisTab,
    pub content: PanelContent,
}

impl Panel {
    /// Build the panel for `tab` from its own sub-report only.
    pub fn build(tab: AnalysisTab, report: &Report, image_origin: Option<&str>) -> Self {
        let content = match tab {
            AnalysisTab::Ela => heat_map(tab, report.ela_report.as_ref(), image_origin),
            AnalysisTab::Dq => heat_map(tab, report.dq_report.as_ref(), image_origin),
            AnalysisTab::Noise => heat_map(tab, report.dw_noise_report.as_ref(), image_origin),
            AnalysisTab::Blocking => heat_map(tab, report.blocking_report.as_ref(), image_origin),
            AnalysisTab::MedianNoise => {
                heat_map(tab, report.median_noise_report.as_ref(), image_origin)
            }
            AnalysisTab::Grids => heat_map(tab, report.grids_report.as_ref(), image_origin),
            AnalysisTab::GridsInversed => {
                heat_map(tab, report.grids_inversed_report.as_ref(), image_origin)
            }
            AnalysisTab::Ghost => match report.ghost_report {
                Some(ref ghost) if ghost.completed && !ghost.maps.is_empty() => {
                    PanelContent::HeatMaps(
                        ghost
                            .entries()
                            .into_iter()
                            .enumerate()
                            .map(|(i, entry)| HeatMap {
                                label: Some(format!("Ghost Map {}", i + 1)),
                                image: fix_image_url(entry.map, image_origin),
                                alt: format!("{} {}", tab.alt(), i + 1),
                                facts: vec![
                                    Fact::new("Quality", entry.quality),
                                    Fact::new("Difference", entry.difference),
                                    Fact::new("Min Value", entry.min_value),
                                    Fact::new("Max Value", entry.max_value),
                                ],
                            })
                            .collect(),
                    )
                }
                _ => PanelContent::Unavailable,
            },
            AnalysisTab::ManipulatedScore => match report.manipulated_score_report {
                Some(ref score) if score.completed => PanelContent::HeatMaps(vec![HeatMap {
                    label: None,
                    image: fix_image_url(score.map.as_deref().unwrap_or(""), image_origin),
                    alt: tab.alt().to_string(),
                    facts: vec![
                        Fact::new("Score", score.manipulation_score),
                        Fact::new("Min Value", score.min_value),
                        Fact::new("Max Value", score.max_value),
                    ],
                }]),
                _ => PanelContent::Unavailable,
            },
            AnalysisTab::Metadata => match report.metadata_object_report {
                // Placeholders carry `{"completed": false}`; treat that as absent.
                Some(ref meta) if meta.get("completed") != Some(&serde_json::Value::Bool(false)) => {
                    PanelContent::Json(
                        serde_json::to_string_pretty(meta).unwrap_or_else(|_| meta.to_string()),
                    )
                }
                _ => PanelContent::Unavailable,
            },
        };

        Self { tab, content }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.content, PanelContent::Unavailable)
    }
}

fn heat_map(
    tab: AnalysisTab,
    report: Option<&HeatMapReport>,
    image_origin: Option<&str>,
) -> PanelContent {
    match report {
        Some(r) if r.completed => PanelContent::HeatMaps(vec![HeatMap {
            label: None,
            image: fix_image_url(r.map.as_deref().unwrap_or(""), image_origin),
            alt: tab.alt().to_string(),
            facts: vec![
                Fact::new("Min Value", r.min_value),
                Fact::new("Max Value", r.max_value),
            ],
        }]),
        _ => PanelContent::Unavailable,
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "n/a".to_string(),
    }
}

/// Make backend image URLs load through the dev proxy.
///
/// URLs on `origin` (the backend) become origin-relative paths; anything
/// else is returned unchanged.
pub fn fix_image_url(url: &str, origin: Option<&str>) -> String {
    let Some(origin) = origin else {
        return url.to_string();
    };
    match (Url::parse(url), Url::parse(origin)) {
        (Ok(parsed), Ok(backend)) if parsed.origin() == backend.origin() => {
            parsed[Position::BeforePath..].to_string()
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::testing::complete_report;

    fn content(tab: AnalysisTab, report: &Report) -> PanelContent {
        Panel::build(tab, report, None).content
    }

    #[test]
    fn test_completed_heat_map_renders_extrema() {
        let report = complete_report("u");
        match content(AnalysisTab::Ela, &report) {
            PanelContent::HeatMaps(maps) => {
                assert_eq!(maps.len(), 1);
                assert_eq!(maps[0].image, "http://localhost:8080/images/h/ela.png");
                assert_eq!(maps[0].facts[0].value, "0");
                assert_eq!(maps[0].facts[1].value, "31");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_or_absent_is_unavailable() {
        let report = complete_report("u");
        assert_eq!(content(AnalysisTab::Dq, &report), PanelContent::Unavailable);
        assert_eq!(content(AnalysisTab::Noise, &report), PanelContent::Unavailable);
        assert_eq!(
            content(AnalysisTab::ManipulatedScore, &report),
            PanelContent::Unavailable
        );
    }

    #[test]
    fn test_ghost_maps_are_labelled_in_order() {
        let report = complete_report("u");
        match content(AnalysisTab::Ghost, &report) {
            PanelContent::HeatMaps(maps) => {
                assert_eq!(maps.len(), 2);
                assert_eq!(maps[1].label.as_deref(), Some("Ghost Map 2"));
                assert_eq!(maps[1].facts[0].value, "75");
                assert_eq!(maps[1].facts[1].value, "0.25");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_completed_ghost_without_maps_is_unavailable() {
        let mut report = complete_report("u");
        if let Some(ref mut ghost) = report.ghost_report {
            ghost.maps.clear();
        }
        assert_eq!(content(AnalysisTab::Ghost, &report), PanelContent::Unavailable);
    }

    #[test]
    fn test_metadata_pretty_prints() {
        let report = complete_report("u");
        match content(AnalysisTab::Metadata, &report) {
            PanelContent::Json(json) => assert!(json.contains("\"Make\": \"Canon\"")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            content(AnalysisTab::Metadata, &Report::default()),
            PanelContent::Unavailable
        );
    }

    #[test]
    fn test_missing_value_formats_as_na() {
        let report: Report = serde_json::from_value(serde_json::json!({
            "gridsReport": {"completed": true, "map": "g.png"}
        }))
        .unwrap();
        match content(AnalysisTab::Grids, &report) {
            PanelContent::HeatMaps(maps) => assert_eq!(maps[0].facts[0].value, "n/a"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fix_image_url() {
        let origin = Some("http://localhost:8080");
        assert_eq!(
            fix_image_url("http://localhost:8080/images/h/ela.png", origin),
            "/images/h/ela.png"
        );
        assert_eq!(
            fix_image_url("http://localhost:8080/images/a.png?v=2", origin),
            "/images/a.png?v=2"
        );
        assert_eq!(
            fix_image_url("http://cdn.example/x.png", origin),
            "http://cdn.example/x.png"
        );
        assert_eq!(fix_image_url("/images/x.png", origin), "/images/x.png");
        assert_eq!(fix_image_url("", origin), "");
        assert_eq!(
            fix_image_url("http://localhost:8080/images/x.png", None),
            "http://localhost:8080/images/x.png"
        );
    }

    #[test]
    fn test_tab_keys_are_unique() {
        let mut keys: Vec<_> = AnalysisTab::ALL.iter().map(|t| t.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), AnalysisTab::ALL.len());
    }
}
