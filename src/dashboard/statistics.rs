//! Statistics aggregator: summary figures and chart series from a
//! statistics snapshot.
//!
//! Each snapshot is aggregated on its own; nothing is carried over from a
//! previous one.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::api::types::{
    ActivityEntry, ConfidenceBucket, ConfidenceDistribution, Language, LanguageCount, StatisticsSnapshot,
};

use super::history::{DetectionRecord, badge_style_for};

/// Shown when there is no most-frequent language.
pub const NO_LANGUAGE: &str = "-";

/// Leading confidence buckets counted as a success (90-100 down to 60-69).
pub const DEFAULT_HIGH_BUCKETS: usize = 4;

/// Confidence ranges used by the server, highest first.
///
/// Each entry is `(label, inclusive lower bound)`.
pub const CONFIDENCE_BANDS: [(&str, f64); 5] = [
    ("90-100%", 90.0),
    ("80-89%", 80.0),
    ("70-79%", 70.0),
    ("60-69%", 60.0),
    ("Below 60%", f64::NEG_INFINITY),
];

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

/// The language with the strictly highest count, or `"-"` when empty.
///
/// The distribution iterates in lexical key order, so a tie goes to the
/// lexically first language.
pub fn most_frequent_language(distribution: &BTreeMap<String, LanguageCount>) -> &str {
    let mut best: Option<(&str, u64)> = None;
    for (language, entry) in distribution {
        match best {
            Some((_, count)) if entry.count <= count => {}
            _ => best = Some((language.as_str(), entry.count)),
        }
    }
    best.map_or(NO_LANGUAGE, |(language, _)| language)
}

/// A language's share of all detections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub language: String,
    pub badge: &'static str,
    pub count: u64,
    pub percentage: f64,
}

/// Per-language counts, largest first (ties in lexical order).
pub fn language_shares(distribution: &BTreeMap<String, LanguageCount>, total: u64) -> Vec<LanguageShare> {
    let mut shares: Vec<LanguageShare> = distribution
        .iter()
        .map(|(language, entry)| LanguageShare {
            language: language.clone(),
            badge: badge_style_for(Some(language.as_str())),
            count: entry.count,
            percentage: percentage(entry.count, total),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// Share of detections in the first `high_buckets` buckets, as a rounded
/// percentage.
///
/// Buckets are taken in the distribution's own order. `total == 0` yields 0.
pub fn success_rate(distribution: &ConfidenceDistribution, high_buckets: usize, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let high: u64 = distribution
        .buckets()
        .iter()
        .take(high_buckets)
        .map(|b| b.count)
        .sum();
    let rate = (high as f64 / total as f64 * 100.0).round();
    rate.clamp(0.0, 100.0) as u32
}

/// Label of the server confidence range containing `confidence`.
pub fn confidence_band(confidence: f64) -> &'static str {
    CONFIDENCE_BANDS
        .iter()
        .find(|(_, lower)| confidence >= *lower)
        .map_or(CONFIDENCE_BANDS[CONFIDENCE_BANDS.len() - 1].0, |(label, _)| *label)
}

/// Histogram of `records` over all five ranges, in server order.
pub fn confidence_histogram(records: &[DetectionRecord]) -> ConfidenceDistribution {
    let mut dist: ConfidenceDistribution = CONFIDENCE_BANDS.iter().map(|(label, _)| (*label, 0)).collect();
    for record in records {
        dist.push(confidence_band(record.confidence), 1);
    }
    dist
}

// ---------------------------------------------------------------------------
// Daily series
// ---------------------------------------------------------------------------

/// Detections per charted language on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyLanguageRow {
    pub date: String,
    #[serde(rename = "English")]
    pub english: u64,
    #[serde(rename = "Hindi")]
    pub hindi: u64,
    #[serde(rename = "Hinglish")]
    pub hinglish: u64,
}

impl DailyLanguageRow {
    pub fn count(&self, language: Language) -> u64 {
        match language {
            Language::English => self.english,
            Language::Hindi => self.hindi,
            Language::Hinglish => self.hinglish,
            Language::Unknown => 0,
        }
    }

    fn add(&mut self, language: Language, count: u64) {
        match language {
            Language::English => self.english += count,
            Language::Hindi => self.hindi += count,
            Language::Hinglish => self.hinglish += count,
            Language::Unknown => {}
        }
    }
}

/// Group flat `(date, language, count)` rows into one row per date.
///
/// Dates keep the order they first appear in. Languages outside the charted
/// three are ignored.
pub fn daily_language_series(activity: &[ActivityEntry]) -> Vec<DailyLanguageRow> {
    let mut rows: Vec<DailyLanguageRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in activity {
        let slot = *index.entry(entry.date.as_str()).or_insert_with(|| {
            rows.push(DailyLanguageRow {
                date: entry.date.clone(),
                ..DailyLanguageRow::default()
            });
            rows.len() - 1
        });
        rows[slot].add(Language::parse(&entry.detected_language), entry.count);
    }

    rows
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Everything a renderer needs to draw the statistics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    pub total_detections: u64,
    pub avg_confidence: f64,
    pub avg_confidence_text: String,
    pub most_detected: String,
    pub success_rate: u32,
    pub languages: Vec<LanguageShare>,
    pub confidence_buckets: Vec<ConfidenceBucket>,
    pub daily_series: Vec<DailyLanguageRow>,
}

/// Derive the statistics view from one snapshot.
pub fn build_statistics_view(snapshot: &StatisticsSnapshot, high_buckets: usize) -> StatisticsView {
    let total = snapshot.total_detections;
    let avg_confidence = snapshot
        .avg_confidence
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    StatisticsView {
        total_detections: total,
        avg_confidence,
        avg_confidence_text: format!("{avg_confidence:.1}%"),
        most_detected: most_frequent_language(&snapshot.language_distribution).to_string(),
        success_rate: success_rate(&snapshot.confidence_distribution, high_buckets, total),
        languages: language_shares(&snapshot.language_distribution, total),
        confidence_buckets: snapshot.confidence_distribution.buckets().to_vec(),
        daily_series: daily_language_series(&snapshot.recent_activity),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
