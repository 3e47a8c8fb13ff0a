/// Configuration schema and defaults for the langsense dashboard client.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[history]`, `[statistics]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

use crate::dashboard::history::{DEFAULT_PREVIEW_CHARS, DEFAULT_WINDOW_DAYS};
use crate::dashboard::statistics::DEFAULT_HIGH_BUCKETS;

/// Server-side cap on `per_page` for the history endpoint.
pub const MAX_PER_PAGE: u32 = 100;

/// Longest activity chart, in days.
pub const MAX_WINDOW_DAYS: u32 = 366;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level langsense configuration.
///
/// Maps directly to `~/.langsense/config.toml` and `.langsense.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LangsenseConfig {
    pub api: ApiConfig,
    pub history: HistoryConfig,
    pub statistics: StatisticsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Where the detection service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Service origin; the fixed `/api` base path is appended per request.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [history]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Records per page, clamped to `1..=100`.
    pub per_page: u32,
    /// Characters of input text shown before the ellipsis.
    pub preview_chars: usize,
    /// Number of trailing days in the activity chart.
    pub activity_window_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            per_page: 20,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            activity_window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl HistoryConfig {
    /// `per_page` clamped to what the server accepts.
    pub fn effective_per_page(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// `activity_window_days` capped at [`MAX_WINDOW_DAYS`].
    pub fn effective_window_days(&self) -> u32 {
        self.activity_window_days.min(MAX_WINDOW_DAYS)
    }
}

// ---------------------------------------------------------------------------
// [statistics]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// How many leading confidence buckets count as a success.
    pub high_buckets: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            high_buckets: DEFAULT_HIGH_BUCKETS,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl LangsenseConfig {
    /// The commented TOML written by `langsense config init`.
    pub fn default_toml() -> &'static str {
        r#"# langsense configuration
#
# Precedence: built-in defaults < ~/.langsense/config.toml < .langsense.toml
# < LANGSENSE_* environment variables.

[api]
# Origin of the detection service. Requests go to <base_url>/api/...
base_url = "http://127.0.0.1:8000"
# Request timeout in milliseconds (0 = no timeout).
timeout_ms = 10000

[history]
# Records per page (1-100).
per_page = 20
# Characters of input text shown in the history table.
preview_chars = 100
# Days covered by the activity chart.
activity_window_days = 7

[statistics]
# Leading confidence buckets counted towards the success rate
# (4 = everything at or above 60%).
high_buckets = 4

[logging]
# tracing filter, e.g. "warn", "info", "langsense=debug". RUST_LOG wins.
level = "warn"
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
