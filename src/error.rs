//! Error taxonomy for the dashboard pipeline.
//!
//! Every variant is recoverable: the pipeline renders the error, returns to
//! `Idle`, and the same action can be retried.

use thiserror::Error;

/// Errors surfaced by the API client and the dashboard pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    /// Input rejected locally before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// Transport failure, non-2xx status, or a body that is not JSON.
    #[error("network error: {0}")]
    Network(String),

    /// `success: false` envelope; the server message is kept verbatim.
    #[error("{0}")]
    Application(String),

    /// A successful envelope whose payload does not have the expected shape.
    #[error("unexpected response from server: {0}")]
    DataShape(String),
}

impl DashboardError {
    /// Short message suitable for a status line or toast.
    ///
    /// Network failures collapse to a fixed text; the detail is only logged.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "network error".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the error was raised before a request left the client.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, DashboardError>;
