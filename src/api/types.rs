//! Wire types for the detection service API.
//!
//! These mirror the `data` payloads of each endpoint. History detections are
//! kept as raw JSON values here; the history aggregator normalizes them so a
//! single malformed record does not reject the whole page.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Language label assigned by the detection service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub enum Language {
    English,
    Hindi,
    Hinglish,
    Unknown,
}

impl Language {
    /// Parse a server label. Anything unrecognized becomes [`Language::Unknown`].
    pub fn parse(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Self::Unknown)
    }

    /// Strict, case-insensitive parse of one of the four labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "english" => Some(Self::English),
            "hindi" => Some(Self::Hindi),
            "hinglish" => Some(Self::Hinglish),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Hinglish => "Hinglish",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<String> for Language {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Per-language percentages used for the comparative bars.
///
/// Each value is in `[0, 100]`; the three need not sum to 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakdown {
    pub hindi_percentage: f64,
    pub english_percentage: f64,
    pub hinglish_percentage: f64,
}

/// `data` of `POST /api/detect-language/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detected_language: Language,
    pub confidence: f64,
    #[serde(default)]
    pub hindi_score: f64,
    #[serde(default)]
    pub english_score: f64,
    #[serde(default)]
    pub hinglish_score: f64,
    #[serde(default)]
    pub breakdown: Breakdown,
}

/// Request body of `POST /api/detect-language/`.
#[derive(Debug, Serialize)]
pub struct DetectRequest<'a> {
    pub text: &'a str,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Page metadata returned alongside a history page.
///
/// Build through [`Pagination::new`] so that `total_pages`, `has_previous`
/// and `has_next` always agree with the page and count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total_count: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_previous: bool,
    #[serde(default)]
    pub has_next: bool,
}

impl Pagination {
    pub fn new(current_page: u32, per_page: u32, total_count: u64) -> Self {
        let current_page = current_page.max(1);
        let per_page = per_page.max(1);
        let total_pages = u32::try_from(total_count.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX);

        Self {
            current_page,
            per_page,
            total_count,
            total_pages,
            has_previous: current_page > 1,
            has_next: current_page < total_pages,
        }
    }

    /// Recompute the derived fields from page, size and count.
    pub fn normalized(self) -> Self {
        Self::new(self.current_page, self.per_page, self.total_count)
    }
}

/// `data` of `GET /api/detection-history/`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPayload {
    #[serde(default)]
    pub detections: Vec<serde_json::Value>,
    pub pagination: Pagination,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// One entry of `language_distribution`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageCount {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// One labelled confidence range and its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfidenceBucket {
    pub label: String,
    pub count: u64,
}

/// Confidence histogram in wire order (highest range first on the server).
///
/// Order is significant: the success rate sums a prefix of the buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfidenceDistribution {
    buckets: Vec<ConfidenceBucket>,
}

impl ConfidenceDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bucket, or add to it if the label is already present.
    pub fn push(&mut self, label: impl Into<String>, count: u64) {
        let label = label.into();
        match self.buckets.iter_mut().find(|b| b.label == label) {
            Some(bucket) => bucket.count += count,
            None => self.buckets.push(ConfidenceBucket { label, count }),
        }
    }

    pub fn buckets(&self) -> &[ConfidenceBucket] {
        &self.buckets
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

impl<L: Into<String>> FromIterator<(L, u64)> for ConfidenceDistribution {
    fn from_iter<I: IntoIterator<Item = (L, u64)>>(iter: I) -> Self {
        let mut dist = Self::new();
        for (label, count) in iter {
            dist.push(label, count);
        }
        dist
    }
}

impl Serialize for ConfidenceDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for bucket in &self.buckets {
            map.serialize_entry(&bucket.label, &bucket.count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConfidenceDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DistributionVisitor;

        impl<'de> Visitor<'de> for DistributionVisitor {
            type Value = ConfidenceDistribution;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of confidence bucket label to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut dist = ConfidenceDistribution::new();
                while let Some((label, count)) = map.next_entry::<String, u64>()? {
                    dist.push(label, count);
                }
                Ok(dist)
            }
        }

        deserializer.deserialize_map(DistributionVisitor)
    }
}

/// One `(date, language, count)` row of `recent_activity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(alias = "created_at__date")]
    pub date: String,
    pub detected_language: String,
    pub count: u64,
}

/// `data` of `GET /api/statistics/`. Always replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatisticsSnapshot {
    pub total_detections: u64,
    #[serde(default)]
    pub avg_confidence: Option<f64>,
    #[serde(default)]
    pub language_distribution: BTreeMap<String, LanguageCount>,
    #[serde(default)]
    pub confidence_distribution: ConfidenceDistribution,
    #[serde(default, deserialize_with = "lenient_activity")]
    pub recent_activity: Vec<ActivityEntry>,
}

/// Keep well-formed activity rows, dropping the rest with a warning.
fn lenient_activity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ActivityEntry>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(index, error = %e, "dropping malformed activity entry");
                None
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Self-test
// ---------------------------------------------------------------------------

/// One predefined case run by `POST /api/test-detection/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfTestCase {
    pub input: String,
    pub expected: Language,
    pub detected: Language,
    pub confidence: f64,
    pub correct: bool,
}

/// `data` of `POST /api/test-detection/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfTestReport {
    pub test_results: Vec<SelfTestCase>,
    pub accuracy: f64,
    pub total_tests: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parse_falls_back_to_unknown() {
        assert_eq!(Language::parse("Hinglish"), Language::Hinglish);
        assert_eq!(Language::parse(" english "), Language::English);
        assert_eq!(Language::parse("French"), Language::Unknown);
        assert_eq!(Language::parse(""), Language::Unknown);
        assert_eq!(Language::from_label("UNKNOWN"), Some(Language::Unknown));
        assert_eq!(Language::from_label("hindu"), None);
    }

    #[test]
    fn language_roundtrips_as_plain_string() {
        let lang: Language = serde_json::from_str("\"Hindi\"").unwrap();
        assert_eq!(lang, Language::Hindi);
        assert_eq!(serde_json::to_string(&lang).unwrap(), "\"Hindi\"");
    }

    #[test]
    fn pagination_derives_flags() {
        let p = Pagination::new(1, 20, 45);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_previous);
        assert!(p.has_next);

        let last = Pagination::new(3, 20, 45);
        assert!(last.has_previous);
        assert!(!last.has_next);
    }

    #[test]
    fn pagination_empty_result_has_no_pages() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_previous);
    }

    #[test]
    fn pagination_normalizes_inconsistent_server_flags() {
        let wire: Pagination = serde_json::from_str(
            r#"{"current_page": 2, "per_page": 10, "total_count": 15, "has_next": true}"#,
        )
        .unwrap();
        let p = wire.normalized();
        assert_eq!(p.total_pages, 2);
        assert!(!p.has_next);
        assert!(p.has_previous);
    }

    #[test]
    fn confidence_distribution_keeps_wire_order() {
        let json = r#"{"90-100%": 10, "80-89%": 5, "70-79%": 3, "60-69%": 2, "Below 60%": 1}"#;
        let dist: ConfidenceDistribution = serde_json::from_str(json).unwrap();
        let labels: Vec<&str> = dist.buckets().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["90-100%", "80-89%", "70-79%", "60-69%", "Below 60%"]);
        assert_eq!(dist.total(), 21);
    }

    #[test]
    fn statistics_snapshot_accepts_server_shape() {
        let json = r#"{
            "total_detections": 3,
            "language_distribution": {"English": {"count": 2, "percentage": 66.67}, "Hindi": {"count": 1, "percentage": 33.33}},
            "recent_activity": [
                {"detected_language": "English", "created_at__date": "2026-10-18", "count": 2},
                {"detected_language": "Hindi"}
            ],
            "confidence_distribution": {"90-100%": 3},
            "avg_confidence": null
        }"#;
        let snapshot: StatisticsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.total_detections, 3);
        assert_eq!(snapshot.avg_confidence, None);
        assert_eq!(snapshot.recent_activity.len(), 1);
        assert_eq!(snapshot.recent_activity[0].date, "2026-10-18");
    }

    #[test]
    fn detection_result_tolerates_missing_scores() {
        let json = r#"{"detected_language": "Hinglish", "confidence": 81.5,
            "breakdown": {"hindi_percentage": 20.0, "english_percentage": 30.0, "hinglish_percentage": 50.0}}"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.detected_language, Language::Hinglish);
        assert_eq!(result.hindi_score, 0.0);
        assert_eq!(result.breakdown.hinglish_percentage, 50.0);
    }
}
