//! Error types for range-name handling.

use thiserror::Error;

/// Result type for range-name operations.
pub type RangeResult<T> = Result<T, RangeError>;

/// Errors from range-name handling.
///
/// A parse failure is never fatal to a consumer: every component that
/// scans a store listing skips files that do not decode and keeps going.
#[derive(Debug, Error)]
pub enum RangeError {
    /// The file name does not decode as a range name.
    #[error("not a range name {name:?}: {reason}")]
    Parse {
        /// The offending file name.
        name: String,
        /// Why the decode failed.
        reason: String,
    },
}
