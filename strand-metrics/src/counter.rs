//! Per-range write/error counters.

use std::collections::HashMap;
use std::sync::Mutex;

use strand_core::{Metric, RangeName};

/// Thread-safe per-range success/error counter.
///
/// Entries are created on first increment. Counts only ever go up for
/// the lifetime of the owning process; reads return by value so callers
/// cannot mutate the stored counts.
#[derive(Debug, Default)]
pub struct Counter {
    metrics: Mutex<HashMap<RangeName, Metric>>,
}

impl Counter {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successful write to `range`.
    ///
    /// # Panics
    ///
    /// Panics if the counter mutex is poisoned.
    pub fn inc_success(&self, range: &RangeName) {
        let mut metrics = self.metrics.lock().expect("counter lock poisoned");
        let m = metrics.entry(*range).or_default();
        m.write_count += 1;
    }

    /// Records one failed write to `range`.
    ///
    /// # Panics
    ///
    /// Panics if the counter mutex is poisoned.
    pub fn inc_failure(&self, range: &RangeName) {
        let mut metrics = self.metrics.lock().expect("counter lock poisoned");
        let m = metrics.entry(*range).or_default();
        m.err_count += 1;
    }

    /// Returns the current counts for `range`, zero if never incremented.
    ///
    /// # Panics
    ///
    /// Panics if the counter mutex is poisoned.
    #[must_use]
    pub fn metrics(&self, range: &RangeName) -> Metric {
        let metrics = self.metrics.lock().expect("counter lock poisoned");
        metrics.get(range).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(term: u64) -> RangeName {
        RangeName::new(0, 100, term, 0)
    }

    #[test]
    fn test_unknown_range_reads_zero() {
        let counter = Counter::new();
        assert_eq!(counter.metrics(&range(0)), Metric::default());
    }

    #[test]
    fn test_increments_accumulate_per_range() {
        let counter = Counter::new();

        counter.inc_success(&range(0));
        counter.inc_success(&range(0));
        counter.inc_failure(&range(0));
        counter.inc_success(&range(1));

        assert_eq!(counter.metrics(&range(0)), Metric::new(2, 1));
        assert_eq!(counter.metrics(&range(1)), Metric::new(1, 0));
    }

    #[test]
    fn test_reads_are_by_value() {
        let counter = Counter::new();
        counter.inc_success(&range(0));

        let mut snapshot = counter.metrics(&range(0));
        snapshot.write_count = 999;

        assert_eq!(counter.metrics(&range(0)), Metric::new(1, 0));
    }

    #[test]
    fn test_concurrent_increments() {
        use std::sync::Arc;

        let counter = Arc::new(Counter::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    counter.inc_success(&range(0));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.metrics(&range(0)).write_count, 8000);
    }
}
