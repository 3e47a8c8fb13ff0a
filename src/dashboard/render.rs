//! The seam between the pipeline and whatever draws the dashboard.
//!
//! Renderers receive plain derived data. Each call replaces what was drawn
//! before for that view.

use crate::api::types::{DetectionResult, SelfTestReport};
use crate::error::DashboardError;

use super::history::HistoryView;
use super::statistics::StatisticsView;

pub trait Renderer {
    fn render_history(&mut self, view: &HistoryView);

    fn render_statistics(&mut self, view: &StatisticsView);

    fn render_detection(&mut self, result: &DetectionResult);

    fn render_self_test(&mut self, report: &SelfTestReport);

    /// Show a failure. The pipeline is already back in a retryable state.
    fn render_error(&mut self, error: &DashboardError);
}
