//! The dashboard data pipeline.
//!
//! user action → [`state`] transition → [`ApiClient`] fetch → normalize →
//! [`history`] / [`statistics`] aggregation → [`Renderer`].
//!
//! Every reload replaces the previous render. Responses are matched to the
//! latest issued request by sequence number; anything older is discarded.
pub mod history;
pub mod render;
pub mod state;
pub mod statistics;

use chrono::Local;
use tracing::{debug, info};

use crate::api::types::{DetectionResult, HistoryPayload, SelfTestReport};
use crate::api::{ApiClient, Transport};
use crate::config::{HistoryConfig, LangsenseConfig};
use crate::error::{DashboardError, Result};

pub use render::Renderer;
pub use state::{FilterState, HistoryState, Phase, ReloadTicket};

/// Longest input the detection endpoint accepts, in characters.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// What happened to a history action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The response was rendered.
    Applied,
    /// A newer request was issued meanwhile; the response was dropped.
    Stale,
    /// The action is not valid in the current state; nothing was sent.
    Ignored,
}

/// Check detection input before any request is made. Returns the trimmed text.
pub fn validate_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DashboardError::Validation(
            "Please enter some text to analyze.".to_string(),
        ));
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(DashboardError::Validation(format!(
            "Text is too long ({chars} characters, maximum {MAX_TEXT_CHARS})."
        )));
    }
    Ok(text)
}

/// Owns the history state and wires client, aggregators and renderer.
pub struct Dashboard<T, R> {
    client: ApiClient<T>,
    renderer: R,
    state: HistoryState,
    history: HistoryConfig,
    high_buckets: usize,
}

impl<T: Transport, R: Renderer> Dashboard<T, R> {
    pub fn new(client: ApiClient<T>, renderer: R, config: &LangsenseConfig) -> Self {
        Self {
            client,
            renderer,
            state: HistoryState::new(config.history.effective_per_page()),
            history: config.history.clone(),
            high_buckets: config.statistics.high_buckets,
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn state(&self) -> &HistoryState {
        &self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Reload the current page with the current filters.
    pub fn reload(&mut self) -> Result<ReloadOutcome> {
        let ticket = self.begin_reload();
        self.run(Some(ticket))
    }

    pub fn apply_filters(&mut self, filters: FilterState) -> Result<ReloadOutcome> {
        let ticket = self.begin_apply_filters(filters);
        self.run(ticket)
    }

    /// Apply `filters` and load `page` with a single request.
    pub fn apply_filters_at(&mut self, filters: FilterState, page: u32) -> Result<ReloadOutcome> {
        let ticket = self.state.apply_filters_at(filters, page);
        self.run(ticket)
    }

    pub fn next_page(&mut self) -> Result<ReloadOutcome> {
        let ticket = self.begin_next_page();
        self.run(ticket)
    }

    pub fn prev_page(&mut self) -> Result<ReloadOutcome> {
        let ticket = self.begin_prev_page();
        self.run(ticket)
    }

    // The begin_* calls only move the state to `Loading` and hand out a
    // ticket. Pair each with `fetch_page` and `finish_reload`.

    /// Always issues a ticket; any request in flight becomes stale.
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.state.reload()
    }

    pub fn begin_apply_filters(&mut self, filters: FilterState) -> Option<ReloadTicket> {
        self.state.apply_filters(filters)
    }

    pub fn begin_next_page(&mut self) -> Option<ReloadTicket> {
        self.state.next_page()
    }

    pub fn begin_prev_page(&mut self) -> Option<ReloadTicket> {
        self.state.prev_page()
    }

    /// Fetch the page a ticket asks for, without touching state.
    pub fn fetch_page(&self, ticket: &ReloadTicket) -> Result<HistoryPayload> {
        self.client.detection_history(&ticket.query())
    }

    /// Apply the result of a ticketed request.
    ///
    /// Stale results are dropped without rendering. A failure is rendered,
    /// leaves the state `Idle`, and is returned.
    pub fn finish_reload(
        &mut self,
        ticket: &ReloadTicket,
        result: Result<HistoryPayload>,
    ) -> Result<ReloadOutcome> {
        if !self.state.is_current(ticket) {
            debug!(seq = ticket.seq, "dropping superseded history response");
            return Ok(ReloadOutcome::Stale);
        }

        match result {
            Err(e) => {
                self.state.settle(ticket, None);
                self.renderer.render_error(&e);
                Err(e)
            }
            Ok(payload) => {
                let pagination = payload.pagination.normalized();
                let page = history::normalize_records(&payload.detections);
                self.state.settle(ticket, Some(pagination));

                let view = history::build_history_view(
                    &page,
                    pagination,
                    &ticket.filters,
                    &self.history,
                    Local::now().date_naive(),
                );
                info!(
                    page = pagination.current_page,
                    rows = view.rows.len(),
                    discarded = view.discarded,
                    "history page loaded"
                );
                self.renderer.render_history(&view);
                Ok(ReloadOutcome::Applied)
            }
        }
    }

    fn run(&mut self, ticket: Option<ReloadTicket>) -> Result<ReloadOutcome> {
        let Some(ticket) = ticket else {
            return Ok(ReloadOutcome::Ignored);
        };
        let result = self.fetch_page(&ticket);
        self.finish_reload(&ticket, result)
    }

    // -----------------------------------------------------------------------
    // Statistics, detection, self-test
    // -----------------------------------------------------------------------

    /// Fetch a fresh statistics snapshot and render it.
    pub fn load_statistics(&mut self) -> Result<()> {
        let snapshot = self.client.statistics().inspect_err(|e| self.renderer.render_error(e))?;
        let view = statistics::build_statistics_view(&snapshot, self.high_buckets);
        self.renderer.render_statistics(&view);
        Ok(())
    }

    /// Validate and submit text for detection.
    pub fn detect(&mut self, text: &str) -> Result<DetectionResult> {
        let result = validate_text(text).and_then(|text| self.client.detect_language(text));
        match result {
            Ok(detection) => {
                self.renderer.render_detection(&detection);
                Ok(detection)
            }
            Err(e) => {
                self.renderer.render_error(&e);
                Err(e)
            }
        }
    }

    /// Run the server's predefined detection cases.
    pub fn self_test(&mut self) -> Result<SelfTestReport> {
        let report = self.client.self_test().inspect_err(|e| self.renderer.render_error(e))?;
        self.renderer.render_self_test(&report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_text_trims_and_rejects_blank() {
        assert_eq!(validate_text("  namaste  ").unwrap(), "namaste");
        assert!(matches!(validate_text(" \n\t "), Err(DashboardError::Validation(_))));
    }

    #[test]
    fn validate_text_enforces_length() {
        let max = "a".repeat(MAX_TEXT_CHARS);
        assert!(validate_text(&max).is_ok());
        let over = "a".repeat(MAX_TEXT_CHARS + 1);
        assert!(matches!(validate_text(&over), Err(DashboardError::Validation(_))));
    }
}
