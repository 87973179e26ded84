use std::path::PathBuf;

use clap::Parser;
use draincache_core::CacheConfig;

#[derive(Parser)]
#[command(
    name = "draincache",
    about = "Syslog binding cache - polls the binding provider and serves drain bindings to forwarder agents",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    /// Base address of the binding provider, e.g. https://provider:9024
    #[arg(long, env = "DRAINCACHE_PROVIDER_ADDR")]
    pub provider_addr: String,

    /// batch_size query argument for the paginated drain listing
    #[arg(long, env = "DRAINCACHE_BATCH_SIZE", default_value_t = 1000)]
    pub batch_size: usize,

    /// Period of the drain URL poll loop, in seconds
    #[arg(long, env = "DRAINCACHE_POLLING_INTERVAL_SECS", default_value_t = 15)]
    pub polling_interval_secs: u64,

    /// Period of the mTLS credential poll loop, in seconds
    #[arg(long, env = "DRAINCACHE_MTLS_POLLING_INTERVAL_SECS", default_value_t = 15)]
    pub mtls_polling_interval_secs: u64,

    /// Period of the merge loop, in seconds
    #[arg(long, env = "DRAINCACHE_PROCESS_INTERVAL_SECS", default_value_t = 15)]
    pub process_interval_secs: u64,

    /// Per-request timeout against the provider, in seconds
    #[arg(long, env = "DRAINCACHE_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Port the cache HTTP API listens on
    #[arg(long, env = "DRAINCACHE_PORT", default_value_t = 9095)]
    pub cache_port: u16,

    /// Platform-wide aggregate drain URLs, comma separated
    #[arg(long, env = "DRAINCACHE_AGGREGATE_DRAIN_URLS", value_delimiter = ',')]
    pub aggregate_drain_urls: Vec<String>,

    /// CA bundle the provider's server certificate must chain to
    #[arg(long, env = "DRAINCACHE_PROVIDER_CA")]
    pub provider_ca: PathBuf,

    /// Client certificate presented to the provider
    #[arg(long, env = "DRAINCACHE_PROVIDER_CERT")]
    pub provider_cert: PathBuf,

    /// Private key for the provider client certificate
    #[arg(long, env = "DRAINCACHE_PROVIDER_KEY")]
    pub provider_key: PathBuf,

    /// Common name required of the provider's server certificate
    #[arg(long, env = "DRAINCACHE_PROVIDER_PEER_CN")]
    pub provider_peer_cn: Option<String>,

    /// CA bundle connecting cache clients must chain to
    #[arg(long, env = "DRAINCACHE_CA")]
    pub ca: PathBuf,

    /// Server certificate of the cache listener
    #[arg(long, env = "DRAINCACHE_CERT")]
    pub cert: PathBuf,

    /// Private key for the cache listener certificate
    #[arg(long, env = "DRAINCACHE_KEY")]
    pub key: PathBuf,

    /// Common name required of connecting cache clients
    #[arg(long, env = "DRAINCACHE_PEER_CN")]
    pub peer_cn: Option<String>,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn into_config(self) -> CacheConfig {
        CacheConfig {
            provider_addr: self.provider_addr,
            batch_size: self.batch_size,
            polling_interval_secs: self.polling_interval_secs,
            mtls_polling_interval_secs: self.mtls_polling_interval_secs,
            process_interval_secs: self.process_interval_secs,
            request_timeout_secs: self.request_timeout_secs,
            cache_port: self.cache_port,
            aggregate_drain_urls: self.aggregate_drain_urls,
            provider_ca_path: self.provider_ca,
            provider_cert_path: self.provider_cert,
            provider_key_path: self.provider_key,
            provider_expected_cn: self.provider_peer_cn.unwrap_or_default(),
            listener_ca_path: self.ca,
            listener_cert_path: self.cert,
            listener_key_path: self.key,
            expected_peer_cn: self.peer_cn.unwrap_or_default(),
        }
    }
}
