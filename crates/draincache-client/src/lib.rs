//! Consumer side of the binding cache.
//!
//! Downstream syslog-forwarder agents use [`CacheClient`] to pull the merged
//! snapshot over the cache's mTLS HTTP API, and [`BindingFetcher`] /
//! [`AggregateDrainFetcher`] to turn it into egress-ready
//! [`draincache_types::SyslogBinding`] records.

mod aggregate;
mod blacklist;
mod client;
mod error;
mod fetcher;

pub use aggregate::{AggregateDrainFetcher, AggregateGetter};
pub use blacklist::Blacklist;
pub use client::CacheClient;
pub use error::ClientError;
pub use fetcher::{BindingFetcher, BindingSource, CacheGetter};
