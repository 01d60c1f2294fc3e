//! Cumulative-to-delta conversion.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use strand_core::Metric;

use crate::error::MetricsResult;
use crate::source::MetricsSource;

/// Converts an upstream's cumulative metrics into per-interval deltas.
///
/// The first observation of a file stores the cumulative value and
/// reports zero (a new file has no delta yet); later observations report
/// the unsigned difference against the stored baseline. When the cache
/// outgrows `cache_max` the whole mapping is dropped at the start of the
/// next call, so every known file re-baselines and reports zero once
/// more. Coarse, and intended: the consumers sample, they do not
/// account.
#[derive(Debug)]
pub struct Delta<M> {
    upstream: M,
    cache_max: usize,
    cache: Mutex<HashMap<String, Metric>>,
}

impl<M> Delta<M> {
    /// Wraps `upstream`, bounding the baseline cache at `cache_max`
    /// entries.
    pub fn new(cache_max: usize, upstream: M) -> Self {
        Self {
            upstream,
            cache_max,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<M: MetricsSource> MetricsSource for Delta<M> {
    async fn metrics(&self, file: &str) -> MetricsResult<Metric> {
        {
            let mut cache = self.cache.lock().expect("delta lock poisoned");
            if cache.len() > self.cache_max {
                cache.clear();
            }
        }

        let current = self.upstream.metrics(file).await?;

        let mut cache = self.cache.lock().expect("delta lock poisoned");
        match cache.get(file) {
            None => {
                cache.insert(file.to_string(), current);
                Ok(Metric::default())
            }
            Some(baseline) => Ok(current.delta_since(*baseline)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;

    struct Scripted {
        responses: Mutex<Vec<MetricsResult<Metric>>>,
    }

    impl Scripted {
        fn new(responses: Vec<MetricsResult<Metric>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl MetricsSource for Scripted {
        async fn metrics(&self, _file: &str) -> MetricsResult<Metric> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    #[tokio::test]
    async fn test_first_observation_is_zero_and_stored() {
        let delta = Delta::new(
            100,
            Scripted::new(vec![Ok(Metric::new(50, 3)), Ok(Metric::new(80, 4))]),
        );

        assert_eq!(delta.metrics("f").await.unwrap(), Metric::default());
        assert_eq!(delta.metrics("f").await.unwrap(), Metric::new(30, 1));
    }

    #[tokio::test]
    async fn test_baseline_is_the_first_observation() {
        // The baseline is not advanced by later reads: the difference is
        // always taken against the first stored cumulative.
        let delta = Delta::new(
            100,
            Scripted::new(vec![
                Ok(Metric::new(10, 0)),
                Ok(Metric::new(30, 0)),
                Ok(Metric::new(45, 0)),
            ]),
        );

        assert_eq!(delta.metrics("f").await.unwrap(), Metric::default());
        assert_eq!(delta.metrics("f").await.unwrap().write_count, 20);
        assert_eq!(delta.metrics("f").await.unwrap().write_count, 35);
    }

    #[tokio::test]
    async fn test_files_are_tracked_independently() {
        let delta = Delta::new(
            100,
            Scripted::new(vec![
                Ok(Metric::new(10, 0)),
                Ok(Metric::new(100, 0)),
                Ok(Metric::new(15, 0)),
            ]),
        );

        assert_eq!(delta.metrics("a").await.unwrap(), Metric::default());
        assert_eq!(delta.metrics("b").await.unwrap(), Metric::default());
        assert_eq!(delta.metrics("a").await.unwrap().write_count, 5);
    }

    #[tokio::test]
    async fn test_cache_overflow_drops_everything() {
        // cache_max of 1: after two files are stored, the next call finds
        // len > max and wipes, so a known file re-baselines to zero.
        let delta = Delta::new(
            1,
            Scripted::new(vec![
                Ok(Metric::new(10, 0)),
                Ok(Metric::new(20, 0)),
                Ok(Metric::new(70, 0)),
            ]),
        );

        assert_eq!(delta.metrics("a").await.unwrap(), Metric::default());
        assert_eq!(delta.metrics("b").await.unwrap(), Metric::default());
        assert_eq!(delta.metrics("a").await.unwrap(), Metric::default());
    }

    #[tokio::test]
    async fn test_upstream_error_is_surfaced_and_nothing_stored() {
        let delta = Delta::new(
            100,
            Scripted::new(vec![
                Err(MetricsError::source("flaky")),
                Ok(Metric::new(10, 0)),
            ]),
        );

        assert!(delta.metrics("f").await.is_err());
        // The failed call stored nothing: the next one is a first
        // observation.
        assert_eq!(delta.metrics("f").await.unwrap(), Metric::default());
    }
}
