//! Strand Metrics - the counter/delta/aggregation fabric.
//!
//! Producers count write successes and failures per range ([`Counter`]);
//! the control loops want per-interval rates summed across the producer
//! fleet. The pieces compose as a chain of [`MetricsSource`]s:
//!
//! ```text
//! Counter (cumulative, per node)
//!    └─ Router::metrics / RemoteReader (per file, per node or fleet)
//!          └─ Aggregator (element-wise sum across nodes)
//!                └─ Delta (cumulative → per-interval)
//!                      └─ Balancer / Filler
//! ```
//!
//! Deltas are best-effort sampling, not accounting: the delta cache is
//! dropped wholesale when it outgrows its bound, and every source
//! tolerates that by re-observing from zero.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod aggregator;
mod counter;
mod delta;
mod error;
mod reader;
mod source;

pub use aggregator::Aggregator;
pub use counter::Counter;
pub use delta::Delta;
pub use error::{MetricsError, MetricsResult};
pub use reader::{NetworkReader, RemoteReader};
pub use source::MetricsSource;
