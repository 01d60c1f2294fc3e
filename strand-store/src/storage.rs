//! Store collaborator contracts.
//!
//! File names are serialised range names (see `strand_core::RangeName`);
//! the store itself treats them as opaque strings. All traits are
//! object-safe so engine components can hold `Arc<dyn FileSystem>` and
//! boxed writers/readers.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreResult;

/// A single record delivered by a shard reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    /// The record payload.
    pub payload: Bytes,
    /// Name of the shard file the record was read from.
    pub file: String,
    /// Monotonic per-file record index, starting at 0.
    pub index: u64,
}

/// The file-backed log store the shard manager drives.
///
/// `create` is idempotent by name. `list` returns all shard files in no
/// particular order. `reader` must start delivering at the given record
/// index.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Creates a shard file. Re-creating an existing name is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the creation.
    async fn create(&self, name: &str) -> StoreResult<()>;

    /// Lists all shard file names.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    async fn list(&self) -> StoreResult<Vec<String>>;

    /// Opens an append writer for the named shard file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or the open fails.
    async fn writer(&self, name: &str) -> StoreResult<Box<dyn ShardWriter>>;

    /// Opens a reader positioned at `start_index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or the open fails.
    async fn reader(&self, name: &str, start_index: u64)
        -> StoreResult<Box<dyn ShardReader>>;
}

/// Appends records to one shard file.
#[async_trait]
pub trait ShardWriter: Send {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the append fails; the record is then not
    /// guaranteed to be durable.
    async fn write(&mut self, payload: Bytes) -> StoreResult<()>;

    /// Releases the writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to release cleanly.
    async fn close(&mut self) -> StoreResult<()>;
}

/// Reads records from one shard file in index order.
#[async_trait]
pub trait ShardReader: Send {
    /// Reads the next record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EndOfStream`](crate::StoreError::EndOfStream)
    /// at the live tail or after the last record; any other error is a
    /// transient store failure.
    async fn read(&mut self) -> StoreResult<DataPacket>;

    /// Releases the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to release cleanly.
    async fn close(&mut self) -> StoreResult<()>;
}
