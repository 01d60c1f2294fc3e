//! The metrics source seam.

use std::sync::Arc;

use async_trait::async_trait;
use strand_core::Metric;

use crate::error::MetricsResult;

/// Anything that can report cumulative metrics for a shard file.
///
/// Implementors include the local Router (consulting its counter), the
/// remote reader (summing a fleet over the network), and the Delta and
/// Aggregator adapters that wrap other sources.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Returns the metrics observed for `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot produce a trustworthy
    /// value; adapters surface upstream errors unchanged.
    async fn metrics(&self, file: &str) -> MetricsResult<Metric>;
}

#[async_trait]
impl<T: MetricsSource + ?Sized> MetricsSource for Arc<T> {
    async fn metrics(&self, file: &str) -> MetricsResult<Metric> {
        (**self).metrics(file).await
    }
}
