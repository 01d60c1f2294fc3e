//! Hash-to-writer routing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use strand_core::{Metric, RangeName};
use strand_metrics::{Counter, MetricsResult, MetricsSource};
use strand_store::{FileSystem, Hasher, ShardWriter};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{RouteError, RouteResult};
use crate::listing::{parse_listing, supersession_order, ParsedRange};

/// Routes payload writes to the shard file owning their hash.
///
/// The in-memory range list is built lazily from a store listing and the
/// router keeps one open writer per hash value it has routed. Both are
/// covered by a single lock, and the write itself happens inside the
/// critical section, so no write interleaves with an invalidation.
///
/// On any write failure (including a hash with no covering range) the
/// router drops everything: every cached writer is closed, the range
/// list is forgotten, and the next write re-lists the store. Coarse but
/// correct, and it is how the router picks up map changes made by the
/// control loops.
pub struct Router {
    fs: Arc<dyn FileSystem>,
    hasher: Arc<dyn Hasher>,
    counter: Counter,
    state: Mutex<RouterState>,
}

#[derive(Default)]
struct RouterState {
    /// `None` means the map must be rediscovered on the next write.
    ranges: Option<Vec<ParsedRange>>,
    writers: HashMap<u64, CachedWriter>,
}

struct CachedWriter {
    writer: Box<dyn ShardWriter>,
    range: RangeName,
}

impl Router {
    /// Creates a router over the given store and hasher.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, hasher: Arc<dyn Hasher>) -> Self {
        Self {
            fs,
            hasher,
            counter: Counter::new(),
            state: Mutex::new(RouterState::default()),
        }
    }

    /// Routes one payload to its owning shard and appends it.
    ///
    /// # Errors
    ///
    /// - [`RouteError::NoHome`] if no range covers the payload's hash
    ///   (the map is dropped so the next write rediscovers).
    /// - [`RouteError::Store`] for hasher, listing, writer-open, or
    ///   append failures. Append failures also drop the map.
    pub async fn write(&self, payload: Bytes) -> RouteResult<()> {
        let hash = self.hasher.hash(&payload)?;

        let mut state = self.state.lock().await;

        if !state.writers.contains_key(&hash) {
            let target = self.resolve(&mut state, hash).await?;
            let writer = self.fs.writer(&target.file).await?;
            debug!(hash, file = %target.file, "opened shard writer");
            state.writers.insert(
                hash,
                CachedWriter {
                    writer,
                    range: target.range,
                },
            );
        }

        let cached = state
            .writers
            .get_mut(&hash)
            .expect("writer cached for hash");
        let range = cached.range;

        match cached.writer.write(payload).await {
            Ok(()) => {
                self.counter.inc_success(&range);
                Ok(())
            }
            Err(e) => {
                self.counter.inc_failure(&range);
                invalidate(&mut state).await;
                Err(e.into())
            }
        }
    }

    /// Closes every cached writer and forgets the range map.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        invalidate(&mut state).await;
    }

    /// Returns the counter the router reports write outcomes to.
    #[must_use]
    pub const fn counter(&self) -> &Counter {
        &self.counter
    }

    /// Finds the owning range for `hash`: the highest term among the
    /// ranges covering it. No stale removal happens here; preferring the
    /// newest term gives the same answer for covered hashes.
    async fn resolve(
        &self,
        state: &mut RouterState,
        hash: u64,
    ) -> RouteResult<ParsedRange> {
        if state.ranges.is_none() {
            let listing = self.fs.list().await?;
            state.ranges = Some(parse_listing(listing));
        }

        let ranges = state.ranges.as_deref().expect("ranges populated above");
        let target = ranges
            .iter()
            .filter(|p| p.range.covers(hash))
            .max_by(|a, b| supersession_order(a, b))
            .cloned();

        match target {
            Some(target) => Ok(target),
            None => {
                // Treated like a write failure: drop the map so the next
                // write sees any ranges the Filler has created since.
                invalidate(state).await;
                Err(RouteError::NoHome { hash })
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").finish_non_exhaustive()
    }
}

async fn invalidate(state: &mut RouterState) {
    for (_, mut cached) in state.writers.drain() {
        if let Err(e) = cached.writer.close().await {
            warn!(error = %e, "closing writer during invalidation failed");
        }
    }
    state.ranges = None;
}

#[async_trait]
impl MetricsSource for Router {
    /// Reports the cumulative counts for a shard file by decoding its
    /// name. Foreign names and never-written ranges read as zero.
    async fn metrics(&self, file: &str) -> MetricsResult<Metric> {
        Ok(match RangeName::parse(file) {
            Ok(range) => self.counter.metrics(&range),
            Err(_) => Metric::default(),
        })
    }
}
