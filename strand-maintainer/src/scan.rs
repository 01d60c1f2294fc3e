//! Shared range-map scan for the control loops.

use rand::Rng;
use strand_core::{remove_stale, RangeName};
use strand_metrics::MetricsSource;
use strand_store::{FileSystem, StoreResult};
use tracing::warn;

/// Ranges with at least this many errors in the last interval are
/// excluded from the valid set (still readable during replay).
pub(crate) const ERR_COUNT_EXCLUDE: u64 = 5;

/// One valid range with its observed per-interval write rate.
#[derive(Debug, Clone)]
pub(crate) struct RangeInfo {
    pub(crate) file: String,
    pub(crate) range: RangeName,
    pub(crate) write_count: u64,
}

/// Result of one scan of the store.
#[derive(Debug)]
pub(crate) struct RangeScan {
    /// Non-overlapping, low-error ranges the loops may act on.
    pub(crate) valid: Vec<RangeInfo>,
    /// Highest term across ALL parsed files, valid or not. New ranges
    /// must be minted strictly above this.
    pub(crate) last_term: u64,
}

/// Lists the store and resolves the listing into the valid range set.
///
/// Unparseable names are skipped. A file whose metrics cannot be
/// fetched, or whose error count crosses the exclusion threshold, is
/// dropped from the valid set for this tick but still counts toward
/// `last_term`. A listing failure is returned to the caller, which
/// skips the tick: acting on an empty view would look like a cold
/// start.
pub(crate) async fn scan_ranges(
    fs: &dyn FileSystem,
    metrics: &dyn MetricsSource,
) -> StoreResult<RangeScan> {
    let listing = fs.list().await?;

    let mut last_term = 0;
    let mut infos = Vec::with_capacity(listing.len());
    for file in listing {
        let Ok(range) = RangeName::parse(&file) else {
            warn!(file = %file, "ignoring non-range file");
            continue;
        };
        last_term = last_term.max(range.term);

        let metric = match metrics.metrics(&file).await {
            Ok(m) => m,
            Err(e) => {
                warn!(file = %file, error = %e, "metrics fetch failed, excluding range this tick");
                continue;
            }
        };
        if metric.err_count >= ERR_COUNT_EXCLUDE {
            continue;
        }

        infos.push(RangeInfo {
            file,
            range,
            write_count: metric.write_count,
        });
    }

    Ok(RangeScan {
        valid: remove_stale(infos, |info| info.range),
        last_term,
    })
}

/// Issues one create against the store, logging instead of failing.
pub(crate) async fn create_range(fs: &dyn FileSystem, range: RangeName) {
    let name = range.file_name();
    if let Err(e) = fs.create(&name).await {
        warn!(file = %name, error = %e, "creating range file failed");
    }
}

/// Samples a fresh, non-zero randomness component for a new range name.
pub(crate) fn fresh_rand() -> i64 {
    let mut rng = rand::thread_rng();
    loop {
        let r: i64 = rng.gen();
        if r != 0 {
            return r;
        }
    }
}
