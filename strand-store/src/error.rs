//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against the store collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named shard file does not exist.
    #[error("shard file {name:?} not found")]
    NotFound {
        /// The file name that was requested.
        name: String,
    },

    /// The reader reached the end of the available records.
    ///
    /// Depending on the store's mode this is the live tail (more records
    /// may appear later) or the end of a sealed file; the replay reader
    /// tolerates either.
    #[error("end of stream")]
    EndOfStream,

    /// An I/O error from the underlying store.
    #[error("I/O error: {operation}: {message}")]
    Io {
        /// What operation was being performed.
        operation: &'static str,
        /// Error message.
        message: String,
    },

    /// The payload hasher failed.
    #[error("hash failed: {message}")]
    HashFailed {
        /// Why hashing failed.
        message: String,
    },
}

impl StoreError {
    /// Creates an I/O error.
    pub fn io(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Io {
            operation,
            message: err.to_string(),
        }
    }

    /// Returns true if this is the end-of-stream signal.
    #[must_use]
    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
