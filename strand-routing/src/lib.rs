//! Strand Routing - write routing and cross-term replay.
//!
//! The [`Router`] resolves a payload's hash to the owning shard file
//! (highest term among the ranges covering the hash), keeps a cache of
//! open writers keyed by hash, and invalidates wholesale on any write
//! failure so the next write rediscovers the map. Every outcome is
//! reported to an internal counter, which the router exposes as a
//! [`MetricsSource`](strand_metrics::MetricsSource) for the control
//! loops.
//!
//! The [`RouteReader`] replays everything ever written for one hash:
//! the chain of shard files covering it, in term order, each file read
//! in record-index order, tailing the newest file once history is
//! drained.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod listing;
mod route_reader;
mod router;

pub use error::{RouteError, RouteResult};
pub use route_reader::{HashReader, RouteReader};
pub use router::Router;
