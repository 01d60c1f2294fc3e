//! Strand Core - range naming and range-set algebra.
//!
//! A *range* owns an inclusive interval of the 64-bit hash space and is
//! backed by exactly one shard file. The serialised range name IS the
//! file name in the store; everything else in the system (routing,
//! replay, rebalancing) is built on parsing those names back and
//! resolving overlaps by epoch (*term*).
//!
//! This crate has no I/O. It provides:
//!
//! - [`RangeName`]: the naming scheme, parse/format, interval tests
//! - [`remove_stale`]: overlap resolution into a valid, non-overlapping set
//! - [`Metric`]: the (write, error) count pair the control loops consume

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod metric;
mod range;
mod set;

pub use error::{RangeError, RangeResult};
pub use metric::Metric;
pub use range::RangeName;
pub use set::remove_stale;
