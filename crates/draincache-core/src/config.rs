//! Cache process configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poller::PollerIntervals;

/// Everything the cache process needs to poll the provider and serve the
/// snapshot. The server binary populates this from its CLI; intervals are
/// plain seconds so the struct stays trivially serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Base address of the binding provider, e.g. `https://provider:9024`.
    pub provider_addr: String,
    /// `batch_size` query argument for the paginated URL listing.
    pub batch_size: usize,
    /// Period of the URL poll loop, in seconds.
    pub polling_interval_secs: u64,
    /// Period of the mTLS poll loop, in seconds.
    pub mtls_polling_interval_secs: u64,
    /// Period of the merge loop, in seconds.
    pub process_interval_secs: u64,
    /// Per-request timeout against the provider, in seconds.
    pub request_timeout_secs: u64,
    /// Port the cache HTTP API listens on.
    pub cache_port: u16,
    /// Statically configured platform-wide drains served on `/aggregate`.
    pub aggregate_drain_urls: Vec<String>,

    /// CA bundle the provider's server certificate must chain to.
    pub provider_ca_path: PathBuf,
    /// Client certificate presented to the provider.
    pub provider_cert_path: PathBuf,
    /// Private key for `provider_cert_path`.
    pub provider_key_path: PathBuf,
    /// Common name required of the provider's server certificate. Empty
    /// disables the check; the CA chain is always enforced.
    pub provider_expected_cn: String,

    /// CA bundle cache clients must chain to.
    pub listener_ca_path: PathBuf,
    /// Server certificate of the cache listener.
    pub listener_cert_path: PathBuf,
    /// Private key for `listener_cert_path`.
    pub listener_key_path: PathBuf,
    /// Common name required of connecting cache clients.
    pub expected_peer_cn: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider_addr: String::new(),
            batch_size: 1000,
            polling_interval_secs: 15,
            mtls_polling_interval_secs: 15,
            process_interval_secs: 15,
            request_timeout_secs: 10,
            cache_port: 9095,
            aggregate_drain_urls: Vec::new(),
            provider_ca_path: PathBuf::new(),
            provider_cert_path: PathBuf::new(),
            provider_key_path: PathBuf::new(),
            provider_expected_cn: String::new(),
            listener_ca_path: PathBuf::new(),
            listener_cert_path: PathBuf::new(),
            listener_key_path: PathBuf::new(),
            expected_peer_cn: String::new(),
        }
    }
}

impl CacheConfig {
    pub fn poller_intervals(&self) -> PollerIntervals {
        PollerIntervals {
            polling: Duration::from_secs(self.polling_interval_secs),
            mtls_polling: Duration::from_secs(self.mtls_polling_interval_secs),
            process: Duration::from_secs(self.process_interval_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
