//! The filler loop: detect and close coverage gaps.

use std::sync::Arc;
use std::time::Duration;

use strand_core::RangeName;
use strand_metrics::MetricsSource;
use strand_store::FileSystem;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::scan::{create_range, fresh_rand, scan_ranges, RangeInfo};

/// Configuration for the [`Filler`].
#[derive(Debug, Clone)]
pub struct FillerConfig {
    /// How often the loop wakes up.
    pub interval: Duration,
    /// Do nothing while fewer valid ranges than this exist; the
    /// balancer owns seeding.
    pub min: u64,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            min: 3,
        }
    }
}

impl FillerConfig {
    /// Sets the tick interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the minimum valid-range count before gaps are filled.
    #[must_use]
    pub const fn with_min(mut self, count: u64) -> Self {
        self.min = count;
        self
    }
}

/// Closes holes in the range map's coverage of the hash space.
///
/// Gaps appear transiently while controllers race or after partial
/// failures. One gap is filled per tick; repeated ticks converge on
/// full coverage.
pub struct Filler {
    metrics: Arc<dyn MetricsSource>,
    fs: Arc<dyn FileSystem>,
    config: FillerConfig,
}

impl Filler {
    /// Creates a filler.
    #[must_use]
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        fs: Arc<dyn FileSystem>,
        config: FillerConfig,
    ) -> Self {
        Self {
            metrics,
            fs,
            config,
        }
    }

    /// Runs the loop until the shutdown channel fires or closes.
    pub fn spawn(self, mut shutdown_rx: mpsc::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            // Swallow the immediate first tick; see Balancer::spawn.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("filler loop shutting down");
                        return;
                    }
                    _ = ticker.tick() => self.tick().await,
                }
            }
        })
    }

    /// Performs one gap-filling pass.
    pub async fn tick(&self) {
        let scan = match scan_ranges(self.fs.as_ref(), self.metrics.as_ref()).await {
            Ok(scan) => scan,
            Err(e) => {
                warn!(error = %e, "listing failed, skipping fill tick");
                return;
            }
        };

        // Safety: range counts are bounded far below u64::MAX.
        #[allow(clippy::cast_possible_truncation)]
        let count = scan.valid.len() as u64;
        if count < self.config.min {
            return;
        }

        if let Some((low, high)) = find_gap(&scan.valid) {
            info!(low, high, "filling coverage gap");
            create_range(
                self.fs.as_ref(),
                RangeName::new(low, high, scan.last_term + 1, fresh_rand()),
            )
            .await;
        }
    }
}

impl std::fmt::Debug for Filler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Finds the first uncovered sub-interval of the hash space, scanning
/// from 0. Takes the valid (non-overlapping) set.
fn find_gap(ranges: &[RangeInfo]) -> Option<(u64, u64)> {
    let mut start: u64 = 0;
    loop {
        match ranges.iter().find(|info| info.range.low == start) {
            Some(covering) => {
                if covering.range.high == u64::MAX {
                    return None;
                }
                start = covering.range.high + 1;
            }
            None => {
                let gap_end = ranges
                    .iter()
                    .map(|info| info.range.low)
                    .filter(|low| *low > start)
                    .min()
                    .map_or(u64::MAX, |low| low - 1);
                return Some((start, gap_end));
            }
        }
    }
}
