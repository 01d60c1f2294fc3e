//! Remote metric reads across a producer fleet.

use async_trait::async_trait;
use strand_core::Metric;

use crate::error::MetricsResult;
use crate::source::MetricsSource;

/// Transport for reading one node's metrics for one file.
///
/// The transport itself (HTTP, gRPC, whatever the deployment uses) is
/// outside this system; implementors adapt it to this seam.
#[async_trait]
pub trait NetworkReader: Send + Sync {
    /// Reads the metrics `addr` reports for `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unreachable or replies garbage.
    async fn read_metrics(&self, addr: &str, file: &str) -> MetricsResult<Metric>;
}

/// Sums one file's metrics over a fixed list of node addresses.
///
/// Any address failing fails the whole read; the control loops must
/// never act on a partial-fleet sum.
#[derive(Debug)]
pub struct RemoteReader<N> {
    addrs: Vec<String>,
    network: N,
}

impl<N> RemoteReader<N> {
    /// Creates a reader over the given addresses.
    pub fn new(addrs: Vec<String>, network: N) -> Self {
        Self { addrs, network }
    }
}

#[async_trait]
impl<N: NetworkReader> MetricsSource for RemoteReader<N> {
    async fn metrics(&self, file: &str) -> MetricsResult<Metric> {
        let mut total = Metric::default();
        for addr in &self.addrs {
            total = total + self.network.read_metrics(addr, file).await?;
        }
        Ok(total)
    }
}
