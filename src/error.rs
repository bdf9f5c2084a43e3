//! Error types for the dashboard
//!
//! Every fallible operation in the crate returns [`DashboardError`]. The poll
//! orchestrator converts these into per-panel display messages, so nothing
//! here is ever fatal to the refresh loop.
//! Uses `thiserror` for ergonomic error definitions.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Network-level failure (connection refused, reset, DNS, TLS)
    #[error("{path} -> {message}")]
    Transport {
        /// Backend path that was requested
        path: String,
        /// Underlying transport error text
        message: String,
    },

    /// Backend answered with a non-2xx status
    #[error("{path} -> {status}")]
    HttpStatus {
        /// Backend path that was requested
        path: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body was not valid JSON
    #[error("{path} -> invalid JSON: {message}")]
    Decode {
        /// Backend path that was requested
        path: String,
        /// Decoder error text
        message: String,
    },

    /// Request did not complete within the configured timeout
    #[error("{path} -> timed out after {}ms", .after.as_millis())]
    Timeout {
        /// Backend path that was requested
        path: String,
        /// Elapsed budget
        after: Duration,
    },

    /// Configuration parsing or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal setup or drawing error
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    /// Returns true if the error came from talking to the backend
    /// (as opposed to local configuration or terminal problems).
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            DashboardError::Transport { .. }
                | DashboardError::HttpStatus { .. }
                | DashboardError::Decode { .. }
                | DashboardError::Timeout { .. }
        )
    }
}
