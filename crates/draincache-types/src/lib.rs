//! Shared data model for the draincache binding cache.
//!
//! These types travel three boundaries: the control-plane provider responses,
//! the cache's own HTTP API, and the egress-facing records handed to syslog
//! forwarders. Everything here is plain data with serde derives; behavior
//! lives in the `draincache-core` and `draincache-client` crates.

mod binding;
mod syslog;

pub use binding::{Binding, BindingsMap, Drain, TlsCredential};
pub use syslog::{DrainType, SyslogBinding};
