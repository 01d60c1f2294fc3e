//! Cross-node metric summation.

use std::sync::Arc;

use async_trait::async_trait;
use strand_core::Metric;

use crate::error::MetricsResult;
use crate::source::MetricsSource;

/// Sums metrics for a file element-wise across several sources.
///
/// A failure from any source fails the whole call: a sum over part of
/// the fleet would mislead the control loops into seeing a cold range.
pub struct Aggregator {
    sources: Vec<Arc<dyn MetricsSource>>,
}

impl Aggregator {
    /// Creates an aggregator over the given sources.
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn MetricsSource>>) -> Self {
        Self { sources }
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.sources.len())
            .finish()
    }
}

#[async_trait]
impl MetricsSource for Aggregator {
    async fn metrics(&self, file: &str) -> MetricsResult<Metric> {
        let mut total = Metric::default();
        for source in &self.sources {
            total = total + source.metrics(file).await?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;

    struct Fixed(Metric);

    #[async_trait]
    impl MetricsSource for Fixed {
        async fn metrics(&self, _file: &str) -> MetricsResult<Metric> {
            Ok(self.0)
        }
    }

    struct Failing;

    #[async_trait]
    impl MetricsSource for Failing {
        async fn metrics(&self, _file: &str) -> MetricsResult<Metric> {
            Err(MetricsError::source("down"))
        }
    }

    #[tokio::test]
    async fn test_sums_element_wise() {
        let agg = Aggregator::new(vec![
            Arc::new(Fixed(Metric::new(1, 2))),
            Arc::new(Fixed(Metric::new(10, 20))),
            Arc::new(Fixed(Metric::new(100, 200))),
        ]);

        assert_eq!(agg.metrics("f").await.unwrap(), Metric::new(111, 222));
    }

    #[tokio::test]
    async fn test_empty_aggregator_sums_to_zero() {
        let agg = Aggregator::new(Vec::new());
        assert_eq!(agg.metrics("f").await.unwrap(), Metric::default());
    }

    #[tokio::test]
    async fn test_any_source_failure_fails_the_call() {
        let agg = Aggregator::new(vec![
            Arc::new(Fixed(Metric::new(1, 0))),
            Arc::new(Failing),
        ]);

        assert!(agg.metrics("f").await.is_err());
    }
}
