//! Forensic report models as returned by the analysis backend.
//!
//! The backend's JSON is loosely typed: every sub-report may be missing, and
//! the extrema fields on heat-map reports use inconsistent casing
//! (`minvalue`/`maxValue` on ELA and DQ, `minValue`/`maxvalue` on the noise
//! reports). All casings are accepted on input; output always uses
//! `minValue`/`maxValue`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::CacheEntry;

/// Processing state reported for an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportStatus {
    /// Report exists but the analyses have not finished.
    Processing,
    /// The report could not be fetched.
    Error,
    /// Any other status string the backend produces (e.g. "Done").
    Other(String),
}

impl ReportStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Processing => "Processing",
            Self::Error => "Error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ReportStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Processing" => Self::Processing,
            "Error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl From<ReportStatus> for String {
    fn from(status: ReportStatus) -> Self {
        match status {
            ReportStatus::Processing => "Processing".to_string(),
            ReportStatus::Error => "Error".to_string(),
            ReportStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single heat-map analysis (ELA, DQ, noise, blocking, grids, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatMapReport {
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(
        default,
        rename = "minValue",
        alias = "minvalue",
        alias = "min_value",
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_value: Option<f64>,
    #[serde(
        default,
        rename = "maxValue",
        alias = "maxvalue",
        alias = "max_value",
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_value: Option<f64>,
}

impl HeatMapReport {
    /// A sub-report that has not been computed.
    pub fn incomplete() -> Self {
        Self::default()
    }
}

/// Output of the learned manipulation detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManipulatedScoreReport {
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub manipulation_score: Option<f64>,
    #[serde(
        default,
        alias = "minvalue",
        alias = "min_value",
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_value: Option<f64>,
    #[serde(
        default,
        alias = "maxvalue",
        alias = "max_value",
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_value: Option<f64>,
}

/// JPEG ghost analysis: one map per recompression quality.
///
/// The sequences are parallel; index `i` of each belongs to `maps[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostReport {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub maps: Vec<String>,
    #[serde(default, deserialize_with = "lenient::numbers")]
    pub qualities: Vec<f64>,
    #[serde(default, deserialize_with = "lenient::numbers")]
    pub differences: Vec<f64>,
    #[serde(default, alias = "minvalues", deserialize_with = "lenient::numbers")]
    pub min_values: Vec<f64>,
    #[serde(default, alias = "maxvalues", deserialize_with = "lenient::numbers")]
    pub max_values: Vec<f64>,
}

/// One ghost map with the values that belong to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostEntry<'a> {
    pub map: &'a str,
    pub quality: Option<f64>,
    pub difference: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl GhostReport {
    /// Zip the parallel sequences, tolerating short ones.
    pub fn entries(&self) -> Vec<GhostEntry<'_>> {
        self.maps
            .iter()
            .enumerate()
            .map(|(i, map)| GhostEntry {
                map,
                quality: self.qualities.get(i).copied(),
                difference: self.differences.get(i).copied(),
                min_value: self.min_values.get(i).copied(),
                max_value: self.max_values.get(i).copied(),
            })
            .collect()
    }
}

/// Numeric fields the backend sometimes fills with text such as `"NaN"`.
///
/// Numbers and numeric strings (including `NaN` and `Infinity`) are kept.
/// Anything else decodes as absent, or as `NaN` inside a sequence so the
/// parallel ghost sequences stay aligned. A bad value never fails the
/// whole report.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(to_f64(&Value::deserialize(deserializer)?))
    }

    pub fn numbers<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .iter()
                .map(|v| to_f64(v).unwrap_or(f64::NAN))
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// Embedded thumbnails extracted from the image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailReport {
    #[serde(default)]
    pub number_of_thumbnails: u32,
    #[serde(default)]
    pub thumbnail_list: Vec<String>,
}

/// Forensic analysis results for one image, addressed by its hash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        rename = "sourceURL",
        alias = "sourceUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ela_report: Option<HeatMapReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq_report: Option<HeatMapReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dw_noise_report: Option<HeatMapReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ghost_report: Option<GhostReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_report: Option<HeatMapReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_noise_report: Option<HeatMapReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grids_report: Option<HeatMapReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grids_inversed_report: Option<HeatMapReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manipulated_score_report: Option<ManipulatedScoreReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_string_report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_object_report: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_report: Option<ThumbnailReport>,
}

impl Report {
    /// Build a partial report from a cached pointer.
    ///
    /// Every analysis sub-report is present but marked incomplete so each
    /// panel renders its "not available" state.
    pub fn placeholder(hash: &str, entry: &CacheEntry, status: ReportStatus) -> Self {
        Self {
            id: Some(hash.to_string()),
            source_url: Some(entry.url.clone()),
            display_image: Some(entry.file_url.clone().unwrap_or_else(|| entry.url.clone())),
            status: Some(status),
            ela_report: Some(HeatMapReport::incomplete()),
            dq_report: Some(HeatMapReport::incomplete()),
            dw_noise_report: Some(HeatMapReport::incomplete()),
            ghost_report: Some(GhostReport::default()),
            blocking_report: Some(HeatMapReport::incomplete()),
            median_noise_report: Some(HeatMapReport::incomplete()),
            grids_report: Some(HeatMapReport::incomplete()),
            grids_inversed_report: Some(HeatMapReport::incomplete()),
            manipulated_score_report: Some(ManipulatedScoreReport::default()),
            metadata_string_report: Some(r#"{"completed":false}"#.to_string()),
            metadata_object_report: Some(serde_json::json!({ "completed": false })),
            thumbnail_report: Some(ThumbnailReport::default()),
        }
    }

    /// Whether every analysis that is present has finished.
    pub fn is_complete(&self) -> bool {
        let heat_maps = [
            &self.ela_report,
            &self.dq_report,
            &self.dw_noise_report,
            &self.blocking_report,
            &self.median_noise_report,
            &self.grids_report,
            &self.grids_inversed_report,
        ];
        heat_maps
            .iter()
            .all(|r| r.as_ref().map_or(true, |r| r.completed))
            && self.ghost_report.as_ref().map_or(true, |g| g.completed)
            && self
                .manipulated_score_report
                .as_ref()
                .map_or(true, |m| m.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_casings_normalize() {
        let json = r#"{
            "sourceURL": "http://x/img.jpg",
            "status": "Done",
            "elaReport": {"completed": true, "map": "http://x/ela.png", "minvalue": 1.5, "maxValue": 42},
            "dwNoiseReport": {"completed": true, "map": "http://x/n.png", "minValue": 0.25, "maxvalue": 9}
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();

        let ela = report.ela_report.as_ref().unwrap();
        assert_eq!(ela.min_value, Some(1.5));
        assert_eq!(ela.max_value, Some(42.0));

        let noise = report.dw_noise_report.as_ref().unwrap();
        assert_eq!(noise.min_value, Some(0.25));
        assert_eq!(noise.max_value, Some(9.0));

        assert_eq!(report.status, Some(ReportStatus::Other("Done".to_string())));
        assert_eq!(report.source_url.as_deref(), Some("http://x/img.jpg"));
    }

    #[test]
    fn test_non_numeric_extrema_keep_the_report() {
        let json = r#"{
            "status": "Done",
            "elaReport": {"completed": true, "map": "http://x/ela.png", "minvalue": 0, "maxValue": 12},
            "dwNoiseReport": {"completed": true, "map": "http://x/n.png", "minValue": "NaN", "maxvalue": "7.5"},
            "medianNoiseReport": {"completed": true, "minValue": {"oops": 1}, "maxValue": null},
            "manipulatedScoreReport": {"completed": true, "manipulationScore": "unknown", "minValue": "0.1"}
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();

        let ela = report.ela_report.as_ref().unwrap();
        assert_eq!(ela.map.as_deref(), Some("http://x/ela.png"));
        assert_eq!(ela.max_value, Some(12.0));

        let noise = report.dw_noise_report.as_ref().unwrap();
        assert!(noise.min_value.unwrap().is_nan());
        assert_eq!(noise.max_value, Some(7.5));

        let median = report.median_noise_report.as_ref().unwrap();
        assert_eq!(median.min_value, None);
        assert_eq!(median.max_value, None);

        let score = report.manipulated_score_report.as_ref().unwrap();
        assert!(score.completed);
        assert_eq!(score.manipulation_score, None);
        assert_eq!(score.min_value, Some(0.1));
    }

    #[test]
    fn test_non_numeric_ghost_values_stay_aligned() {
        let json = r#"{
            "completed": true,
            "maps": ["a.png", "b.png"],
            "qualities": ["NaN", 80],
            "differences": "none",
            "minValues": [true, 0.5]
        }"#;
        let ghost: GhostReport = serde_json::from_str(json).unwrap();
        let entries = ghost.entries();

        assert!(entries[0].quality.unwrap().is_nan());
        assert_eq!(entries[1].quality, Some(80.0));
        assert_eq!(entries[1].difference, None);
        assert!(entries[0].min_value.unwrap().is_nan());
        assert_eq!(entries[1].min_value, Some(0.5));
    }

    #[test]
    fn test_serializes_single_casing() {
        let report = HeatMapReport {
            completed: true,
            map: Some("m.png".to_string()),
            min_value: Some(0.0),
            max_value: Some(3.0),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["minValue"], 0.0);
        assert_eq!(value["maxValue"], 3.0);
        assert!(value.get("minvalue").is_none());
        assert!(value.get("maxvalue").is_none());
    }

    #[test]
    fn test_unknown_fields_and_missing_subreports() {
        let report: Report =
            serde_json::from_str(r#"{"id": "h", "somethingNew": [1, 2]}"#).unwrap();
        assert_eq!(report.id.as_deref(), Some("h"));
        assert!(report.ela_report.is_none());
        assert!(report.ghost_report.is_none());
        assert!(report.is_complete());
    }

    #[test]
    fn test_ghost_entries_tolerate_short_sequences() {
        let ghost = GhostReport {
            completed: true,
            maps: vec!["a.png".into(), "b.png".into()],
            qualities: vec![70.0, 80.0],
            differences: vec![0.1],
            min_values: vec![],
            max_values: vec![1.0, 2.0],
        };
        let entries = ghost.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].map, "b.png");
        assert_eq!(entries[1].quality, Some(80.0));
        assert_eq!(entries[1].difference, None);
        assert_eq!(entries[0].min_value, None);
        assert_eq!(entries[1].max_value, Some(2.0));
    }

    #[test]
    fn test_placeholder_marks_everything_incomplete() {
        let entry = CacheEntry::new("abc123", "http://x/img.jpg");
        let report = Report::placeholder("abc123", &entry, ReportStatus::Processing);

        assert_eq!(report.id.as_deref(), Some("abc123"));
        assert_eq!(report.display_image.as_deref(), Some("http://x/img.jpg"));
        assert_eq!(report.status, Some(ReportStatus::Processing));
        assert!(!report.is_complete());

        let value = serde_json::to_value(&report).unwrap();
        for (key, sub) in value.as_object().unwrap() {
            if key.ends_with("Report") && sub.is_object() && key != "metadataObjectReport" {
                if key == "thumbnailReport" {
                    assert_eq!(sub["numberOfThumbnails"], 0);
                } else {
                    assert_eq!(sub["completed"], false, "{} should be incomplete", key);
                }
            }
        }
        assert_eq!(value["metadataObjectReport"]["completed"], false);
        assert_eq!(value["metadataStringReport"], r#"{"completed":false}"#);
    }

    #[test]
    fn test_placeholder_prefers_file_url() {
        let mut entry = CacheEntry::new("h", "http://x/img.jpg");
        entry.file_url = Some("/images/h/img.jpg".to_string());
        let report = Report::placeholder("h", &entry, ReportStatus::Error);
        assert_eq!(report.display_image.as_deref(), Some("/images/h/img.jpg"));
        assert_eq!(report.source_url.as_deref(), Some("http://x/img.jpg"));
    }
}
