//! langsense: terminal dashboard for a text language-detection service.
//!
//! Detections are classified as English, Hindi or Hinglish by a remote
//! service; this crate fetches results, normalizes them and renders
//! history pages and statistics.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
