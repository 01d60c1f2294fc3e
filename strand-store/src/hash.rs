//! Payload hashing.

use xxhash_rust::xxh3::xxh3_64;

use crate::error::StoreResult;

/// Hashes payloads into the 64-bit routing space.
///
/// Implementations must be deterministic: the same payload always maps
/// to the same hash, or routing and replay disagree about ownership.
pub trait Hasher: Send + Sync {
    /// Hashes a payload to its routing hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the hasher cannot process the payload (e.g. a
    /// remote hashing service is unreachable). Pure hashers never fail.
    fn hash(&self, payload: &[u8]) -> StoreResult<u64>;
}

/// The default hasher: xxh3, fast and well distributed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Hasher;

impl Hasher for Xxh3Hasher {
    fn hash(&self, payload: &[u8]) -> StoreResult<u64> {
        Ok(xxh3_64(payload))
    }
}
