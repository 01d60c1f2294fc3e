//! Strand Store - external collaborator contracts and the in-memory store.
//!
//! The shard manager does not persist anything itself; it drives a
//! file-backed log store through the [`FileSystem`] trait (one append
//! writer and one indexed reader per shard file) and hashes payloads
//! through the [`Hasher`] trait. This crate defines those seams and
//! ships two batteries-included implementations:
//!
//! - [`MemoryFileSystem`]: a shared-state in-memory store with one-shot
//!   fault injection, used as the test double everywhere and usable as
//!   an embedded store
//! - [`Xxh3Hasher`]: the default payload hasher

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod hash;
mod memory;
mod storage;

pub use error::{StoreError, StoreResult};
pub use hash::{Hasher, Xxh3Hasher};
pub use memory::{FaultConfig, MemoryFileSystem};
pub use storage::{DataPacket, FileSystem, ShardReader, ShardWriter};
