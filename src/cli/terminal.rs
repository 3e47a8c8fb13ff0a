//! Terminal renderer. Draws dashboard views as colored tables, text bars,
//! JSON or CSV on stdout.

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::api::types::{Breakdown, DetectionResult, SelfTestReport};
use crate::dashboard::Renderer;
use crate::dashboard::history::{HistoryView, badge_style_for};
use crate::dashboard::statistics::StatisticsView;
use crate::error::DashboardError;

use super::OutputFormat;

/// Width of a full bar in characters.
const BAR_WIDTH: usize = 30;

/// Renderer for the `langsense` binary.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    format: OutputFormat,
}

impl TerminalRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Renderer for TerminalRenderer {
    fn render_history(&mut self, view: &HistoryView) {
        match self.format {
            OutputFormat::Json => print_json(view),
            OutputFormat::Csv => print_history_csv(view),
            OutputFormat::Table => print_history_table(view),
        }
    }

    fn render_statistics(&mut self, view: &StatisticsView) {
        match self.format {
            OutputFormat::Json => print_json(view),
            OutputFormat::Csv => print_statistics_csv(view),
            OutputFormat::Table => print_statistics_table(view),
        }
    }

    fn render_detection(&mut self, result: &DetectionResult) {
        match self.format {
            OutputFormat::Json => print_json(result),
            OutputFormat::Csv => {
                println!("language,confidence,hindi_pct,english_pct,hinglish_pct");
                println!(
                    "{},{:.2},{:.2},{:.2},{:.2}",
                    result.detected_language,
                    result.confidence,
                    result.breakdown.hindi_percentage,
                    result.breakdown.english_percentage,
                    result.breakdown.hinglish_percentage,
                );
            }
            OutputFormat::Table => print_detection_table(result),
        }
    }

    fn render_self_test(&mut self, report: &SelfTestReport) {
        match self.format {
            OutputFormat::Json => print_json(report),
            OutputFormat::Csv => {
                println!("input,expected,detected,confidence,correct");
                for case in &report.test_results {
                    println!(
                        "{},{},{},{:.2},{}",
                        csv_field(&case.input),
                        case.expected,
                        case.detected,
                        case.confidence,
                        case.correct,
                    );
                }
            }
            OutputFormat::Table => print_self_test_table(report),
        }
    }

    fn render_error(&mut self, error: &DashboardError) {
        eprintln!("{} {}", "error:".red().bold(), error.user_message());
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

fn print_history_table(view: &HistoryView) {
    let p = &view.pagination;
    println!("{}", "Detection History".bold().cyan());
    println!("{}", "=".repeat(72));
    println!(
        "  Page {} of {}  ({} detections, {} per page)",
        p.current_page,
        p.total_pages.max(1),
        p.total_count,
        p.per_page
    );
    println!("  {} {}", "Filters:".bold(), describe_filters(view));
    println!();

    if view.rows.is_empty() {
        println!("  {}", "No detections match these filters.".yellow());
    } else {
        println!(
            "  {:<7} {:<10} {:>7}  {:<16} Text",
            "ID", "Language", "Conf.", "Created"
        );
        println!("  {}", "-".repeat(70));
        for row in &view.rows {
            let id = row.id.map_or_else(|| "-".to_string(), |id| id.to_string());
            let created = row
                .created_at
                .map_or_else(|| "-".to_string(), |ts| ts.format("%Y-%m-%d %H:%M").to_string());
            println!(
                "  {:<7} {} {:>6.1}%  {:<16} {}",
                id,
                badge(row.badge, &format!("{:<10}", row.language.as_str())),
                row.confidence,
                created,
                single_line(&row.preview),
            );
        }
    }
    println!();

    println!("{}", "Activity".bold().cyan());
    let busiest = view.daily_activity.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in &view.daily_activity {
        println!(
            "  {}  {} {}",
            bucket.date.format("%a %m-%d"),
            bar(share(bucket.count as f64, busiest as f64), BAR_WIDTH).green(),
            bucket.count
        );
    }
    println!();

    println!("{}", "Confidence (this page)".bold().cyan());
    let tallest = view
        .confidence_bands
        .buckets()
        .iter()
        .map(|b| b.count)
        .max()
        .unwrap_or(0);
    for bucket in view.confidence_bands.buckets() {
        println!(
            "  {:<10} {} {}",
            bucket.label,
            bar(share(bucket.count as f64, tallest as f64), BAR_WIDTH).blue(),
            bucket.count
        );
    }

    if view.discarded > 0 {
        println!();
        println!(
            "  {}",
            format!("{} malformed record(s) were skipped.", view.discarded).yellow()
        );
    }
}

fn print_history_csv(view: &HistoryView) {
    println!("id,language,confidence,hindi_pct,english_pct,hinglish_pct,created_at,text");
    for row in &view.rows {
        println!(
            "{},{},{:.2},{:.2},{:.2},{:.2},{},{}",
            row.id.map(|id| id.to_string()).unwrap_or_default(),
            row.language,
            row.confidence,
            row.breakdown.hindi_percentage,
            row.breakdown.english_percentage,
            row.breakdown.hinglish_percentage,
            row.created_at.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
            csv_field(&row.preview),
        );
    }
}

fn describe_filters(view: &HistoryView) -> String {
    if view.filters.is_empty() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    if let Some(language) = view.filters.language {
        parts.push(format!("language={language}"));
    }
    if let Some(search) = &view.filters.search {
        parts.push(format!("search=\"{search}\""));
    }
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

fn print_statistics_table(view: &StatisticsView) {
    println!("{}", "Detection Statistics".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Total detections:".bold(), view.total_detections);
    println!("  {} {}", "Avg confidence:  ".bold(), view.avg_confidence_text);
    println!(
        "  {} {}",
        "Most detected:   ".bold(),
        badge(badge_style_for(Some(view.most_detected.as_str())), &view.most_detected)
    );
    println!(
        "  {} {:>3}% {}",
        "Success rate:    ".bold(),
        view.success_rate,
        bar(f64::from(view.success_rate), 20).green()
    );
    println!();

    if !view.languages.is_empty() {
        println!("{}", "Languages".bold().cyan());
        for share in &view.languages {
            println!(
                "  {} {} {} ({:.1}%)",
                badge(share.badge, &format!("{:<10}", share.language)),
                bar(share.percentage, BAR_WIDTH),
                share.count,
                share.percentage
            );
        }
        println!();
    }

    if !view.confidence_buckets.is_empty() {
        println!("{}", "Confidence Distribution".bold().cyan());
        let tallest = view.confidence_buckets.iter().map(|b| b.count).max().unwrap_or(0);
        for bucket in &view.confidence_buckets {
            println!(
                "  {:<10} {} {}",
                bucket.label,
                bar(share(bucket.count as f64, tallest as f64), BAR_WIDTH).blue(),
                bucket.count
            );
        }
        println!();
    }

    if !view.daily_series.is_empty() {
        println!("{}", "Recent Activity".bold().cyan());
        println!("  {:<12} {:>8} {:>8} {:>9}", "Date", "English", "Hindi", "Hinglish");
        println!("  {}", "-".repeat(40));
        for row in &view.daily_series {
            println!(
                "  {:<12} {:>8} {:>8} {:>9}",
                row.date, row.english, row.hindi, row.hinglish
            );
        }
    }
}

fn print_statistics_csv(view: &StatisticsView) {
    println!("language,count,percentage");
    for share in &view.languages {
        println!("{},{},{:.2}", share.language, share.count, share.percentage);
    }
}

// ---------------------------------------------------------------------------
// Detection / self-test
// ---------------------------------------------------------------------------

fn print_detection_table(result: &DetectionResult) {
    let language = result.detected_language.as_str();
    println!(
        "{} {}  {:.1}% confidence",
        "Detected:".bold(),
        badge(badge_style_for(Some(language)), language),
        result.confidence
    );
    println!("  {}", bar(result.confidence, BAR_WIDTH).green());
    println!();
    print_breakdown(&result.breakdown);
}

fn print_breakdown(breakdown: &Breakdown) {
    println!("{}", "Breakdown".bold().cyan());
    for (label, pct) in [
        ("Hindi", breakdown.hindi_percentage),
        ("English", breakdown.english_percentage),
        ("Hinglish", breakdown.hinglish_percentage),
    ] {
        println!(
            "  {} {} {:>5.1}%",
            badge(badge_style_for(Some(label)), &format!("{label:<10}")),
            bar(pct, BAR_WIDTH),
            pct
        );
    }
}

fn print_self_test_table(report: &SelfTestReport) {
    println!("{}", "Detection Self-Test".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "  {:<3} {:<30} {:<10} {:<10} {:>6}",
        "", "Input", "Expected", "Detected", "Conf."
    );
    println!("  {}", "-".repeat(58));
    for case in &report.test_results {
        let mark = if case.correct { "ok".green() } else { "FAIL".red() };
        println!(
            "  {:<3} {:<30} {:<10} {:<10} {:>5.1}%",
            mark,
            truncate(&case.input, 30),
            case.expected.as_str(),
            case.detected.as_str(),
            case.confidence
        );
    }
    println!();
    println!(
        "  {} {:.2}% of {} cases",
        "Accuracy:".bold(),
        report.accuracy,
        report.total_tests
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize view"),
    }
}

/// Color `text` by badge style key.
fn badge(style: &str, text: &str) -> ColoredString {
    match style {
        "english" => text.blue(),
        "hindi" => text.yellow(),
        "hinglish" => text.green(),
        _ => text.dimmed(),
    }
}

/// `value` as a percentage of `max`, 0 when `max` is 0.
fn share(value: f64, max: f64) -> f64 {
    if max <= 0.0 { 0.0 } else { value / max * 100.0 }
}

/// A fixed-width text progress bar for a percentage.
pub(crate) fn bar(pct: f64, width: usize) -> String {
    let pct = if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((pct / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = single_line(text);
    if text.chars().count() <= max_chars {
        text
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
pub(crate) fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
