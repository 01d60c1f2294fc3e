//! Routing error types.

use thiserror::Error;

use strand_store::StoreError;

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors from routing and replay.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No range in the current map covers the hash.
    ///
    /// The router treats this like a write failure: the in-memory map is
    /// dropped so the next write rediscovers the store (the Filler may
    /// have closed the gap by then).
    #[error("hash {hash} does not have a home")]
    NoHome {
        /// The hash that could not be routed.
        hash: u64,
    },

    /// The replay reader has delivered everything currently readable.
    ///
    /// Not fatal: reading again re-lists the store and tails the newest
    /// covering shard.
    #[error("end of stream")]
    EndOfStream,

    /// A store collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RouteError {
    /// Returns true if this is the replay reader's terminal signal.
    #[must_use]
    pub const fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
