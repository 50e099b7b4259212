//! Cluster metrics aggregator.
//!
//! Queries a netdata parent for per-host chart samples, reduces them
//! into one dashboard snapshot, and caches the result to bound upstream
//! load. Embed [`aggregator::Aggregator`] directly or run the bundled
//! binary.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod errors;
pub mod netdata;
pub mod snapshot;
