//! The balancer loop: split hot ranges, merge cold ones, seed an empty
//! map.

use std::sync::Arc;
use std::time::Duration;

use strand_core::RangeName;
use strand_metrics::MetricsSource;
use strand_store::FileSystem;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{MaintainerError, MaintainerResult};
use crate::scan::{create_range, fresh_rand, scan_ranges, RangeInfo};

/// Configuration for the [`Balancer`].
#[derive(Debug, Clone)]
pub struct BalancerConfig {
    /// How often the loop wakes up.
    pub interval: Duration,
    /// A range writing less than this per interval is a merge candidate.
    pub min_per_interval: u64,
    /// A range writing more than this per interval is a split candidate.
    pub max_per_interval: u64,
    /// Never merge below this many valid ranges; seeding creates this
    /// many.
    pub min: u64,
    /// Never split above this many valid ranges.
    pub max: u64,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            min_per_interval: 20,
            max_per_interval: 2500,
            min: 3,
            max: 100,
        }
    }
}

impl BalancerConfig {
    /// Sets the tick interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the merge threshold (writes per interval).
    #[must_use]
    pub const fn with_min_per_interval(mut self, writes: u64) -> Self {
        self.min_per_interval = writes;
        self
    }

    /// Sets the split threshold (writes per interval).
    #[must_use]
    pub const fn with_max_per_interval(mut self, writes: u64) -> Self {
        self.max_per_interval = writes;
        self
    }

    /// Sets the minimum valid-range count.
    #[must_use]
    pub const fn with_min(mut self, count: u64) -> Self {
        self.min = count;
        self
    }

    /// Sets the maximum valid-range count.
    #[must_use]
    pub const fn with_max(mut self, count: u64) -> Self {
        self.max = count;
        self
    }
}

/// Reshapes the range map from observed write rates.
///
/// On each tick the balancer takes the valid range set and performs at
/// most one structural action: seed an empty map, split the hottest
/// range, or merge the two coldest. Superseded ranges are never
/// deleted; higher terms shadow them at every consumer.
pub struct Balancer {
    metrics: Arc<dyn MetricsSource>,
    fs: Arc<dyn FileSystem>,
    config: BalancerConfig,
}

impl Balancer {
    /// Creates a balancer.
    ///
    /// # Errors
    ///
    /// Returns [`MaintainerError::InvalidConfig`] unless
    /// `0 < min <= max`. There is no sane recovery from a malformed map
    /// size, so this must be caught at startup.
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        fs: Arc<dyn FileSystem>,
        config: BalancerConfig,
    ) -> MaintainerResult<Self> {
        if config.min == 0 || config.min > config.max {
            return Err(MaintainerError::InvalidConfig {
                reason: format!(
                    "0 < min <= max required, got min={} max={}",
                    config.min, config.max
                ),
            });
        }

        Ok(Self {
            metrics,
            fs,
            config,
        })
    }

    /// Runs the loop until the shutdown channel fires or closes.
    pub fn spawn(self, mut shutdown_rx: mpsc::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            // The first interval tick completes immediately; swallow it
            // so the first pass happens one full period after start.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("balancer loop shutting down");
                        return;
                    }
                    _ = ticker.tick() => self.tick().await,
                }
            }
        })
    }

    /// Performs one balancing pass.
    pub async fn tick(&self) {
        let scan = match scan_ranges(self.fs.as_ref(), self.metrics.as_ref()).await {
            Ok(scan) => scan,
            Err(e) => {
                warn!(error = %e, "listing failed, skipping balance tick");
                return;
            }
        };

        if scan.valid.is_empty() {
            self.seed().await;
            return;
        }

        let mut ranges = scan.valid;
        ranges.sort_by(|a, b| {
            a.write_count
                .cmp(&b.write_count)
                .then_with(|| a.file.cmp(&b.file))
        });

        // Safety: range counts are bounded far below u64::MAX.
        #[allow(clippy::cast_possible_truncation)]
        let count = ranges.len() as u64;

        let hot = &ranges[ranges.len() - 1];
        if hot.write_count > self.config.max_per_interval && count < self.config.max {
            self.split(hot, scan.last_term).await;
            return;
        }

        let cold = &ranges[0];
        if cold.write_count < self.config.min_per_interval && count > self.config.min {
            self.merge(cold, &ranges[1], scan.last_term).await;
        }
    }

    /// Creates `min` equally-sized ranges partitioning the hash space,
    /// terms 0..min-1.
    async fn seed(&self) {
        let min = self.config.min;
        let width = u64::MAX / min;

        info!(count = min, "seeding empty range map");
        for i in 0..min {
            let low = if i == 0 { 0 } else { i * width + 1 };
            let high = if i == min - 1 { u64::MAX } else { (i + 1) * width };
            create_range(self.fs.as_ref(), RangeName::new(low, high, i, fresh_rand()))
                .await;
        }
    }

    /// Splits `hot` at its midpoint into two fresh ranges, terms
    /// `last_term + 1` and `last_term + 2`.
    async fn split(&self, hot: &RangeInfo, last_term: u64) {
        let middle = hot.range.low + (hot.range.high - hot.range.low) / 2;
        if middle == hot.range.high {
            // One-wide range; nothing to split.
            warn!(file = %hot.file, "hot range too narrow to split");
            return;
        }

        info!(file = %hot.file, writes = hot.write_count, "splitting hot range");
        create_range(
            self.fs.as_ref(),
            RangeName::new(hot.range.low, middle, last_term + 1, fresh_rand()),
        )
        .await;
        create_range(
            self.fs.as_ref(),
            RangeName::new(middle + 1, hot.range.high, last_term + 2, fresh_rand()),
        )
        .await;
    }

    /// Merges the two coldest ranges into one covering their union,
    /// term `last_term + 1`. The old ranges are left to be shadowed.
    async fn merge(&self, cold: &RangeInfo, next: &RangeInfo, last_term: u64) {
        info!(
            first = %cold.file,
            second = %next.file,
            "merging cold ranges"
        );
        create_range(
            self.fs.as_ref(),
            RangeName::new(
                cold.range.low.min(next.range.low),
                cold.range.high.max(next.range.high),
                last_term + 1,
                fresh_rand(),
            ),
        )
        .await;
    }
}

impl std::fmt::Debug for Balancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Balancer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
