//! Metrics error types.

use thiserror::Error;

/// Result type for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors from reading metrics.
///
/// Delta and Aggregator never originate errors of their own; they
/// surface whatever their upstream produced, unchanged.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A remote metrics read failed.
    #[error("metrics read from {addr} failed: {message}")]
    Network {
        /// The address that failed.
        addr: String,
        /// Error message.
        message: String,
    },

    /// A metrics source failed for a reason of its own.
    #[error("metrics source failed: {message}")]
    Source {
        /// Error message.
        message: String,
    },
}

impl MetricsError {
    /// Creates a network error.
    pub fn network(addr: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Network {
            addr: addr.into(),
            message: err.to_string(),
        }
    }

    /// Creates a source error.
    pub fn source(err: impl std::fmt::Display) -> Self {
        Self::Source {
            message: err.to_string(),
        }
    }
}
