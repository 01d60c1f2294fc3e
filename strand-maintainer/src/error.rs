//! Maintainer error types.

use thiserror::Error;

/// Result type for maintainer construction.
pub type MaintainerResult<T> = Result<T, MaintainerError>;

/// Errors from the control loops.
///
/// Only construction can fail; a running loop logs and retries instead
/// of propagating.
#[derive(Debug, Error)]
pub enum MaintainerError {
    /// The loop configuration is unusable.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}
