//! Pagination/filter state for the history view.
//!
//! A small state machine (`Idle` / `Loading`) mutated only by explicit user
//! actions. Every reload hands out a [`ReloadTicket`] with a fresh sequence
//! number; only the response for the latest ticket may settle the state.

use serde::Serialize;
use tracing::debug;

use crate::api::HistoryQuery;
use crate::api::types::{Language, Pagination};
use crate::error::{DashboardError, Result};

/// Whether a history request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Active history filters. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub language: Option<Language>,
    pub search: Option<String>,
}

impl FilterState {
    /// Build filters from raw form inputs.
    ///
    /// Blank inputs clear the corresponding filter; `all` clears the
    /// language filter. An unrecognized language label is a
    /// [`DashboardError::Validation`].
    pub fn from_inputs(language: &str, search: &str) -> Result<Self> {
        let language = language.trim();
        let search = search.trim();

        let language = if language.is_empty() || language.eq_ignore_ascii_case("all") {
            None
        } else {
            let parsed = Language::from_label(language).ok_or_else(|| {
                DashboardError::Validation(format!(
                    "Unknown language '{language}'. Use English, Hindi, Hinglish, Unknown or all."
                ))
            })?;
            Some(parsed)
        };

        Ok(Self {
            language,
            search: (!search.is_empty()).then(|| search.to_string()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.language.is_none() && self.search.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Identity of one issued history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadTicket {
    pub seq: u64,
    pub page: u32,
    pub per_page: u32,
    pub filters: FilterState,
}

impl ReloadTicket {
    pub fn query(&self) -> HistoryQuery {
        HistoryQuery {
            page: self.page,
            per_page: self.per_page,
            language: self.filters.language,
            search: self.filters.search.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Pagination and filter state of the history view.
///
/// `page` and `filters` describe the latest request; `pagination` is the
/// metadata of the last page that was actually applied.
#[derive(Debug, Clone)]
pub struct HistoryState {
    page: u32,
    per_page: u32,
    filters: FilterState,
    pagination: Option<Pagination>,
    phase: Phase,
    latest_seq: u64,
}

impl HistoryState {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            filters: FilterState::default(),
            pagination: None,
            phase: Phase::Idle,
            latest_seq: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    /// Page of the latest request (may differ from the applied pagination
    /// after a failure).
    pub fn requested_page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Sequence number of the latest issued request (0 before the first).
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    /// Issue a reload of the current page and filters.
    ///
    /// Allowed in any phase; a reload while `Loading` supersedes the request
    /// in flight.
    pub fn reload(&mut self) -> ReloadTicket {
        self.latest_seq += 1;
        self.phase = Phase::Loading;
        debug!(seq = self.latest_seq, page = self.page, "history reload issued");
        ReloadTicket {
            seq: self.latest_seq,
            page: self.page,
            per_page: self.per_page,
            filters: self.filters.clone(),
        }
    }

    /// Replace the filters and go back to page 1. Ignored while loading.
    pub fn apply_filters(&mut self, filters: FilterState) -> Option<ReloadTicket> {
        self.apply_filters_at(filters, 1)
    }

    /// Replace the filters and request `page` directly (at least 1).
    /// Ignored while loading.
    pub fn apply_filters_at(&mut self, filters: FilterState, page: u32) -> Option<ReloadTicket> {
        if self.is_loading() {
            return None;
        }
        self.filters = filters;
        self.page = page.max(1);
        Some(self.reload())
    }

    /// Move one page forward. Ignored while loading or on the last page.
    pub fn next_page(&mut self) -> Option<ReloadTicket> {
        if self.is_loading() {
            return None;
        }
        let pagination = self.pagination.filter(|p| p.has_next)?;
        self.page = pagination.current_page + 1;
        Some(self.reload())
    }

    /// Move one page back. Ignored while loading or on the first page.
    pub fn prev_page(&mut self) -> Option<ReloadTicket> {
        if self.is_loading() {
            return None;
        }
        let pagination = self.pagination.filter(|p| p.has_previous)?;
        self.page = pagination.current_page - 1;
        Some(self.reload())
    }

    /// Whether `ticket` belongs to the latest issued request.
    pub fn is_current(&self, ticket: &ReloadTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    /// Settle the request behind `ticket`.
    ///
    /// Returns `false` (and changes nothing) when the ticket is stale. On a
    /// failure (`None`) the previous pagination is kept and the requested
    /// page stays as is, so [`reload`](Self::reload) retries it.
    pub fn settle(&mut self, ticket: &ReloadTicket, pagination: Option<Pagination>) -> bool {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.latest_seq, "ignoring stale history response");
            return false;
        }
        self.phase = Phase::Idle;
        if let Some(pagination) = pagination {
            let pagination = pagination.normalized();
            self.page = pagination.current_page;
            self.pagination = Some(pagination);
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(page: u32, total: u64) -> HistoryState {
        let mut state = HistoryState::new(20);
        let ticket = state.reload();
        assert!(state.settle(&ticket, Some(Pagination::new(page, 20, total))));
        state
    }

    #[test]
    fn filters_from_blank_inputs_are_empty() {
        assert!(FilterState::from_inputs("", "   ").unwrap().is_empty());
        assert!(FilterState::from_inputs("ALL", "").unwrap().is_empty());

        let filters = FilterState::from_inputs("hindi", " namaste ").unwrap();
        assert_eq!(filters.language, Some(Language::Hindi));
        assert_eq!(filters.search.as_deref(), Some("namaste"));

        let unknown = FilterState::from_inputs("unknown", "").unwrap();
        assert_eq!(unknown.language, Some(Language::Unknown));
    }

    #[test]
    fn mistyped_language_filter_is_rejected() {
        let err = FilterState::from_inputs("hindu", "chai").unwrap_err();
        assert!(matches!(err, DashboardError::Validation(ref msg) if msg.contains("hindu")));
    }

    #[test]
    fn apply_filters_at_requests_the_given_page() {
        let mut state = HistoryState::new(20);
        let ticket = state.apply_filters_at(FilterState::default(), 3).unwrap();
        assert_eq!(ticket.page, 3);
        assert_eq!(state.requested_page(), 3);
        assert!(state.is_loading());
        assert!(state.apply_filters_at(FilterState::default(), 2).is_none());

        state.settle(&ticket, Some(Pagination::new(3, 20, 45)));
        let ticket = state.apply_filters_at(FilterState::default(), 0).unwrap();
        assert_eq!(ticket.page, 1);
    }

    #[test]
    fn reload_moves_to_loading_and_back() {
        let mut state = HistoryState::new(20);
        assert_eq!(state.phase(), Phase::Idle);
        let ticket = state.reload();
        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.settle(&ticket, None));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn apply_filters_resets_to_first_page() {
        let mut state = loaded(3, 100);
        let ticket = state
            .apply_filters(FilterState::from_inputs("English", "").unwrap())
            .unwrap();
        assert_eq!(ticket.page, 1);
        assert_eq!(ticket.filters.language, Some(Language::English));
        assert_eq!(ticket.query().language, Some(Language::English));
    }

    #[test]
    fn transitions_ignored_while_loading() {
        let mut state = loaded(1, 100);
        let _in_flight = state.reload();
        assert!(state.apply_filters(FilterState::default()).is_none());
        assert!(state.next_page().is_none());
        assert!(state.prev_page().is_none());
    }

    #[test]
    fn navigation_respects_bounds() {
        let mut state = loaded(1, 45);
        assert!(state.prev_page().is_none());

        let ticket = state.next_page().unwrap();
        assert_eq!(ticket.page, 2);
        state.settle(&ticket, Some(Pagination::new(2, 20, 45)));

        let ticket = state.next_page().unwrap();
        assert_eq!(ticket.page, 3);
        state.settle(&ticket, Some(Pagination::new(3, 20, 45)));

        assert!(state.next_page().is_none());
        assert_eq!(state.pagination().unwrap().current_page, 3);
    }

    #[test]
    fn navigation_needs_a_loaded_page() {
        let mut state = HistoryState::new(20);
        assert!(state.next_page().is_none());
        assert!(state.prev_page().is_none());
    }

    #[test]
    fn stale_ticket_does_not_settle() {
        let mut state = loaded(1, 45);
        let first = state.reload();
        let second = state.reload();

        assert!(!state.settle(&first, Some(Pagination::new(9, 20, 999))));
        assert!(state.is_loading());
        assert_eq!(state.pagination().unwrap().total_count, 45);

        assert!(state.settle(&second, Some(Pagination::new(1, 20, 50))));
        assert!(!state.is_loading());
        assert_eq!(state.pagination().unwrap().total_count, 50);
    }

    #[test]
    fn failure_keeps_requested_page_for_retry() {
        let mut state = loaded(1, 45);
        let ticket = state.next_page().unwrap();
        state.settle(&ticket, None);

        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.requested_page(), 2);
        assert_eq!(state.pagination().unwrap().current_page, 1);
        assert_eq!(state.reload().page, 2);
    }
}
