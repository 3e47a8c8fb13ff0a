//! History aggregator: normalization and derived data for one history page.
//!
//! Everything here is a pure function of its inputs. The caller supplies
//! "today" so daily buckets are reproducible in tests.

use std::fmt;

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::types::{Breakdown, ConfidenceDistribution, Language, Pagination};
use crate::config::HistoryConfig;
use crate::config::schema::MAX_WINDOW_DAYS;

use super::state::FilterState;
use super::statistics::confidence_histogram;

/// Default preview length in characters.
pub const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Default number of days in the activity chart.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Appended to a preview when the text was cut.
pub const ELLIPSIS: &str = "...";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A validated detection record from one history page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub id: Option<u64>,
    pub input_text: String,
    pub detected_language: Language,
    /// Clamped to `[0, 100]`.
    pub confidence: f64,
    pub hindi_score: f64,
    pub english_score: f64,
    pub hinglish_score: f64,
    pub breakdown: Breakdown,
    pub created_at: Option<DateTime<Local>>,
}

impl DetectionRecord {
    /// Client-local calendar date of `created_at`.
    pub fn local_date(&self) -> Option<NaiveDate> {
        self.created_at.map(|ts| ts.date_naive())
    }
}

/// Wire shape of a history record; everything optional so validation can
/// report exactly what is missing.
#[derive(Debug, Deserialize)]
struct RawDetection {
    id: Option<u64>,
    input_text: Option<String>,
    detected_language: Option<String>,
    confidence: Option<f64>,
    hindi_score: Option<f64>,
    english_score: Option<f64>,
    hinglish_score: Option<f64>,
    breakdown: Option<Breakdown>,
    hindi_percentage: Option<f64>,
    english_percentage: Option<f64>,
    hinglish_percentage: Option<f64>,
    created_at: Option<String>,
}

/// Why a raw record was left out of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    Malformed(String),
    MissingLanguage,
    MissingConfidence,
    InvalidConfidence,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(detail) => write!(f, "malformed record: {detail}"),
            Self::MissingLanguage => f.write_str("missing detected_language"),
            Self::MissingConfidence => f.write_str("missing confidence"),
            Self::InvalidConfidence => f.write_str("confidence is not a finite number"),
        }
    }
}

/// A record dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscardedRecord {
    /// Position in the raw list.
    pub index: usize,
    pub id: Option<u64>,
    pub reason: DiscardReason,
}

/// Result of [`normalize_records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedPage {
    pub records: Vec<DetectionRecord>,
    pub discarded: Vec<DiscardedRecord>,
}

/// Validate raw history records.
///
/// Records without `detected_language` or `confidence` are dropped and
/// reported; the rest of the page is kept.
pub fn normalize_records(raw: &[serde_json::Value]) -> NormalizedPage {
    let mut page = NormalizedPage::default();

    for (index, value) in raw.iter().enumerate() {
        match normalize_one(value) {
            Ok(record) => page.records.push(record),
            Err((id, reason)) => {
                warn!(index, id = ?id, %reason, "discarding history record");
                page.discarded.push(DiscardedRecord { index, id, reason });
            }
        }
    }

    page
}

fn normalize_one(value: &serde_json::Value) -> Result<DetectionRecord, (Option<u64>, DiscardReason)> {
    let raw = RawDetection::deserialize(value).map_err(|e| {
        let id = value.get("id").and_then(serde_json::Value::as_u64);
        (id, DiscardReason::Malformed(e.to_string()))
    })?;

    let language = raw
        .detected_language
        .as_deref()
        .ok_or((raw.id, DiscardReason::MissingLanguage))?;
    let confidence = raw.confidence.ok_or((raw.id, DiscardReason::MissingConfidence))?;
    if !confidence.is_finite() {
        return Err((raw.id, DiscardReason::InvalidConfidence));
    }

    let breakdown = raw.breakdown.unwrap_or(Breakdown {
        hindi_percentage: raw.hindi_percentage.unwrap_or(0.0),
        english_percentage: raw.english_percentage.unwrap_or(0.0),
        hinglish_percentage: raw.hinglish_percentage.unwrap_or(0.0),
    });

    Ok(DetectionRecord {
        id: raw.id,
        input_text: raw.input_text.unwrap_or_default(),
        detected_language: Language::parse(language),
        confidence: confidence.clamp(0.0, 100.0),
        hindi_score: raw.hindi_score.unwrap_or(0.0),
        english_score: raw.english_score.unwrap_or(0.0),
        hinglish_score: raw.hinglish_score.unwrap_or(0.0),
        breakdown,
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
    })
}

/// Parse a server timestamp into client-local time.
///
/// RFC 3339 first; a naive timestamp is read as local time.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Local>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local.from_local_datetime(&naive).earliest()
}

// ---------------------------------------------------------------------------
// Text previews
// ---------------------------------------------------------------------------

/// A possibly truncated input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPreview {
    /// At most `limit` characters, without the ellipsis.
    pub preview: String,
    pub truncated: bool,
}

impl TextPreview {
    /// Display form, HTML-escaped for a browser renderer.
    pub fn escaped(&self) -> String {
        escape_html(&self.to_string())
    }
}

impl fmt::Display for TextPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.preview)?;
        if self.truncated {
            f.write_str(ELLIPSIS)?;
        }
        Ok(())
    }
}

/// Cut `text` to its first `limit` characters.
///
/// Text of exactly `limit` characters is not truncated.
pub fn preview_text(text: &str, limit: usize) -> TextPreview {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => TextPreview {
            preview: text[..cut].to_string(),
            truncated: true,
        },
        None => TextPreview {
            preview: text.to_string(),
            truncated: false,
        },
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Daily activity
// ---------------------------------------------------------------------------

/// Detections on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyActivityBucket {
    pub date: NaiveDate,
    pub count: usize,
}

/// Count records per day over the `window` days ending at `today`.
///
/// Returns exactly `window` buckets (at most [`MAX_WINDOW_DAYS`]), oldest
/// first. Records outside the window or without a timestamp are ignored.
/// Days before the earliest representable date are left out.
pub fn bucket_by_day(records: &[DetectionRecord], window: u32, today: NaiveDate) -> Vec<DailyActivityBucket> {
    let window = window.min(MAX_WINDOW_DAYS);
    let mut buckets: Vec<DailyActivityBucket> = (0..u64::from(window))
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| DailyActivityBucket { date, count: 0 })
        .collect();

    let Some(start) = buckets.first().map(|b| b.date) else {
        return buckets;
    };

    for date in records.iter().filter_map(DetectionRecord::local_date) {
        let offset = (date - start).num_days();
        if let Ok(slot) = usize::try_from(offset)
            && let Some(bucket) = buckets.get_mut(slot)
        {
            bucket.count += 1;
        }
    }

    buckets
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// Style key of a language badge. Never fails: anything unrecognized or
/// absent maps to `"unknown"`.
pub fn badge_style_for(language: Option<&str>) -> &'static str {
    match language.map(Language::parse) {
        Some(Language::English) => "english",
        Some(Language::Hindi) => "hindi",
        Some(Language::Hinglish) => "hinglish",
        _ => "unknown",
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// One table row of the history view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub id: Option<u64>,
    pub preview: String,
    pub preview_html: String,
    pub truncated: bool,
    pub language: Language,
    pub badge: &'static str,
    pub confidence: f64,
    pub hindi_score: f64,
    pub english_score: f64,
    pub hinglish_score: f64,
    pub breakdown: Breakdown,
    pub created_at: Option<DateTime<Local>>,
}

/// Everything a renderer needs to draw one history page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub rows: Vec<HistoryRow>,
    pub pagination: Pagination,
    pub filters: FilterState,
    pub daily_activity: Vec<DailyActivityBucket>,
    pub confidence_bands: ConfidenceDistribution,
    /// Records dropped by normalization.
    pub discarded: usize,
}

/// Derive the full history view for one page.
pub fn build_history_view(
    page: &NormalizedPage,
    pagination: Pagination,
    filters: &FilterState,
    options: &HistoryConfig,
    today: NaiveDate,
) -> HistoryView {
    let rows = page
        .records
        .iter()
        .map(|record| {
            let preview = preview_text(&record.input_text, options.preview_chars);
            HistoryRow {
                id: record.id,
                preview: preview.to_string(),
                preview_html: preview.escaped(),
                truncated: preview.truncated,
                language: record.detected_language,
                badge: badge_style_for(Some(record.detected_language.as_str())),
                confidence: record.confidence,
                hindi_score: record.hindi_score,
                english_score: record.english_score,
                hinglish_score: record.hinglish_score,
                breakdown: record.breakdown,
                created_at: record.created_at,
            }
        })
        .collect();

    HistoryView {
        rows,
        pagination,
        filters: filters.clone(),
        daily_activity: bucket_by_day(&page.records, options.effective_window_days(), today),
        confidence_bands: confidence_histogram(&page.records),
        discarded: page.discarded.len(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
