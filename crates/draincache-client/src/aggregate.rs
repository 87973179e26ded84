//! Platform-wide aggregate drains.

use async_trait::async_trait;
use draincache_types::{Drain, DrainType, SyslogBinding};
use url::Url;

use crate::client::CacheClient;
use crate::error::ClientError;
use crate::fetcher::BindingSource;

/// Seam over the cache's aggregate endpoint.
#[async_trait]
pub trait AggregateGetter: Send + Sync {
    async fn get_aggregate(&self) -> Result<Vec<String>, ClientError>;
}

#[async_trait]
impl AggregateGetter for CacheClient {
    async fn get_aggregate(&self) -> Result<Vec<String>, ClientError> {
        CacheClient::get_aggregate(self).await
    }
}

/// Emits one binding per platform-wide drain. Statically configured URLs
/// take precedence over the cache; with neither the fetcher is empty.
pub struct AggregateDrainFetcher<G = CacheClient> {
    static_urls: Vec<String>,
    cache: Option<G>,
}

impl<G: AggregateGetter> AggregateDrainFetcher<G> {
    pub fn new(static_urls: Vec<String>, cache: Option<G>) -> Self {
        Self { static_urls, cache }
    }

    pub async fn fetch_bindings(&self) -> Result<Vec<SyslogBinding>, ClientError> {
        if !self.static_urls.is_empty() {
            return Ok(parse_aggregate_urls(&self.static_urls));
        }
        if let Some(cache) = &self.cache {
            let urls = cache.get_aggregate().await?;
            return Ok(parse_aggregate_urls(&urls));
        }
        Ok(Vec::new())
    }

    /// Aggregate drains receive everything; there is no cap.
    pub fn drain_limit(&self) -> i64 {
        -1
    }
}

#[async_trait]
impl<G: AggregateGetter> BindingSource for AggregateDrainFetcher<G> {
    async fn fetch_bindings(&self) -> Result<Vec<SyslogBinding>, ClientError> {
        AggregateDrainFetcher::fetch_bindings(self).await
    }

    fn drain_limit(&self) -> i64 {
        AggregateDrainFetcher::drain_limit(self)
    }
}

/// Empty and unparseable URLs are skipped. Aggregate classification only
/// honors `include-metrics-deprecated`; `drain-type` has no meaning here.
fn parse_aggregate_urls(urls: &[String]) -> Vec<SyslogBinding> {
    urls.iter()
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| {
            let parsed = Url::parse(raw).ok()?;
            let deprecated_metrics = parsed
                .query_pairs()
                .any(|(name, value)| name == "include-metrics-deprecated" && !value.is_empty());
            Some(SyslogBinding {
                app_id: String::new(),
                hostname: String::new(),
                drain: Drain::plain(raw.clone()),
                drain_type: if deprecated_metrics { DrainType::Aggregate } else { DrainType::Log },
            })
        })
        .collect()
}
