/// Aggregator tests.
///
/// Scenario checks for the history and statistics aggregators plus
/// property tests over previews, day buckets and success rates.
use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};
use langsense::api::types::{
    ActivityEntry, Breakdown, ConfidenceDistribution, Language, LanguageCount, StatisticsSnapshot,
};
use langsense::dashboard::history::{self, DetectionRecord, preview_text};
use langsense::dashboard::statistics::{self, most_frequent_language, success_rate};
use proptest::prelude::*;
use serde_json::json;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record_on(date: NaiveDate, confidence: f64) -> DetectionRecord {
    let noon = date.and_hms_opt(12, 0, 0).unwrap();
    DetectionRecord {
        id: None,
        input_text: "sample".to_string(),
        detected_language: Language::English,
        confidence,
        hindi_score: 0.0,
        english_score: 1.0,
        hinglish_score: 0.0,
        breakdown: Breakdown::default(),
        created_at: Local.from_local_datetime(&noon).earliest(),
    }
}

fn distribution(pairs: &[(&str, u64)]) -> BTreeMap<String, LanguageCount> {
    pairs
        .iter()
        .map(|(language, count)| {
            (
                language.to_string(),
                LanguageCount {
                    count: *count,
                    percentage: None,
                },
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Statistics scenarios
// ---------------------------------------------------------------------------

#[test]
fn ninety_five_percent_success() {
    let dist: ConfidenceDistribution = [
        ("90-100%", 40),
        ("80-89%", 30),
        ("70-79%", 15),
        ("60-69%", 10),
        ("Below 60%", 5),
    ]
    .into_iter()
    .collect();
    assert_eq!(success_rate(&dist, 4, 100), 95);
    assert_eq!(success_rate(&dist, 1, 100), 40);
    assert_eq!(success_rate(&dist, 4, 0), 0);
}

#[test]
fn high_confidence_lands_in_top_band() {
    assert_eq!(statistics::confidence_band(92.0), "90-100%");
    assert_eq!(statistics::confidence_band(59.99), "Below 60%");

    let dist: ConfidenceDistribution = [("90-100%", 10), ("80-89%", 5), ("70-79%", 3), ("60-69%", 2), ("Below 60%", 1)]
        .into_iter()
        .collect();
    assert_eq!(success_rate(&dist, 4, 21), 95);
}

#[test]
fn tied_languages_resolve_lexically() {
    let dist = distribution(&[("Hinglish", 12), ("English", 12), ("Hindi", 3)]);
    assert_eq!(most_frequent_language(&dist), "English");
    assert_eq!(most_frequent_language(&BTreeMap::new()), "-");
}

#[test]
fn snapshot_wire_order_is_kept() {
    let snapshot: StatisticsSnapshot = serde_json::from_value(json!({
        "total_detections": 10,
        "avg_confidence": 70.0,
        "language_distribution": { "Hindi": { "count": 10, "percentage": 100.0 } },
        "confidence_distribution": { "Below 60%": 2, "90-100%": 8 },
        "recent_activity": []
    }))
    .unwrap();

    let labels: Vec<&str> = snapshot
        .confidence_distribution
        .buckets()
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(labels, ["Below 60%", "90-100%"]);
    // The first bucket in wire order counts, whatever its label.
    assert_eq!(success_rate(&snapshot.confidence_distribution, 1, 10), 20);
}

#[test]
fn daily_series_sums_repeats_and_skips_unknown() {
    let activity = vec![
        ActivityEntry {
            date: "2026-10-16".to_string(),
            detected_language: "Hindi".to_string(),
            count: 2,
        },
        ActivityEntry {
            date: "2026-10-15".to_string(),
            detected_language: "English".to_string(),
            count: 1,
        },
        ActivityEntry {
            date: "2026-10-16".to_string(),
            detected_language: "Hindi".to_string(),
            count: 3,
        },
        ActivityEntry {
            date: "2026-10-16".to_string(),
            detected_language: "Klingon".to_string(),
            count: 9,
        },
    ];
    let series = statistics::daily_language_series(&activity);
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].date, "2026-10-16");
    assert_eq!(series[0].count(Language::Hindi), 5);
    assert_eq!(series[0].count(Language::English), 0);
    assert_eq!(series[1].count(Language::English), 1);
}

// ---------------------------------------------------------------------------
// History scenarios
// ---------------------------------------------------------------------------

#[test]
fn malformed_records_are_dropped_not_fatal() {
    let raw = vec![
        json!({ "id": 1, "input_text": "hello", "detected_language": "English", "confidence": 99.0 }),
        json!({ "id": 2, "input_text": "no language", "confidence": 50.0 }),
        json!({ "id": 3, "input_text": "bad", "detected_language": "Hindi", "confidence": "high" }),
        json!("not an object"),
        json!({ "id": 5, "input_text": "flat", "detected_language": "hinglish", "confidence": 140.0,
                "hinglish_percentage": 70.0 }),
    ];
    let page = history::normalize_records(&raw);
    let kept: Vec<Option<u64>> = page.records.iter().map(|r| r.id).collect();
    assert_eq!(kept, [Some(1), Some(5)]);
    assert_eq!(page.discarded.len(), 3);

    let flat = &page.records[1];
    assert_eq!(flat.detected_language, Language::Hinglish);
    assert_eq!(flat.confidence, 100.0);
    assert_eq!(flat.breakdown.hinglish_percentage, 70.0);
}

#[test]
fn histogram_covers_all_bands() {
    let today = day(2026, 10, 19);
    let records = vec![record_on(today, 95.0), record_on(today, 90.0), record_on(today, 12.0)];
    let hist = statistics::confidence_histogram(&records);
    let counts: Vec<(&str, u64)> = hist.buckets().iter().map(|b| (b.label.as_str(), b.count)).collect();
    assert_eq!(
        counts,
        [
            ("90-100%", 2),
            ("80-89%", 0),
            ("70-79%", 0),
            ("60-69%", 0),
            ("Below 60%", 1)
        ]
    );
}

#[test]
fn week_of_activity_ends_today() {
    let today = day(2026, 10, 19);
    let records = vec![
        record_on(today, 80.0),
        record_on(today, 80.0),
        record_on(day(2026, 10, 13), 80.0),
        record_on(day(2026, 10, 12), 80.0),
    ];
    let buckets = history::bucket_by_day(&records, 7, today);
    assert_eq!(buckets.len(), 7);
    assert_eq!(buckets[0].date, day(2026, 10, 13));
    assert_eq!(buckets[0].count, 1);
    assert_eq!(buckets[6].date, today);
    assert_eq!(buckets[6].count, 2);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn preview_never_exceeds_limit(text in "\\PC{0,200}", limit in 0usize..150) {
        let preview = preview_text(&text, limit);
        let chars = text.chars().count();
        prop_assert!(preview.preview.chars().count() <= limit);
        prop_assert_eq!(preview.truncated, chars > limit);
        prop_assert!(text.starts_with(&preview.preview));
        if !preview.truncated {
            prop_assert_eq!(preview.to_string(), text);
        }
    }

    #[test]
    fn day_buckets_always_fill_window(
        offsets in prop::collection::vec(0i64..30, 0..40),
        window in 0u32..21,
    ) {
        let today = day(2026, 10, 19);
        let records: Vec<DetectionRecord> = offsets
            .iter()
            .map(|o| record_on(today - chrono::Duration::days(*o), 75.0))
            .collect();
        let buckets = history::bucket_by_day(&records, window, today);

        prop_assert_eq!(buckets.len(), window as usize);
        for pair in buckets.windows(2) {
            prop_assert_eq!(pair[1].date - pair[0].date, chrono::Duration::days(1));
        }
        if let Some(last) = buckets.last() {
            prop_assert_eq!(last.date, today);
        }
        let in_window = offsets.iter().filter(|o| **o < i64::from(window)).count();
        prop_assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), in_window);
    }

    #[test]
    fn success_rate_grows_with_high_buckets(counts in prop::collection::vec(0u64..500, 1..6)) {
        let dist: ConfidenceDistribution = counts
            .iter()
            .enumerate()
            .map(|(i, c)| (format!("band {i}"), *c))
            .collect();
        let total = dist.total();

        let mut previous = 0;
        for high in 0..=counts.len() {
            let rate = success_rate(&dist, high, total);
            prop_assert!(rate <= 100);
            prop_assert!(rate >= previous);
            previous = rate;
        }
        if total > 0 {
            prop_assert_eq!(success_rate(&dist, counts.len(), total), 100);
        }
    }

    #[test]
    fn most_frequent_has_maximal_count(counts in prop::collection::vec(0u64..20, 1..4)) {
        let names = ["English", "Hindi", "Hinglish", "Unknown"];
        let dist = distribution(
            &names.iter().zip(&counts).map(|(n, c)| (*n, *c)).collect::<Vec<_>>(),
        );
        let winner = most_frequent_language(&dist);
        let max = counts.iter().max().copied().unwrap_or(0);
        prop_assert_eq!(dist[winner].count, max);
    }
}
