//! Turning the cached snapshot into egress-ready records.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use draincache_types::{Binding, Drain, DrainType, SyslogBinding};
use metrics::{counter, gauge};
use url::Url;

use crate::blacklist::Blacklist;
use crate::client::CacheClient;
use crate::error::ClientError;

/// Seam over the snapshot source so tests can substitute canned responses.
#[async_trait]
pub trait CacheGetter: Send + Sync {
    async fn get(&self) -> Result<Vec<Binding>, ClientError>;
}

#[async_trait]
impl CacheGetter for CacheClient {
    async fn get(&self) -> Result<Vec<Binding>, ClientError> {
        CacheClient::get(self).await
    }
}

/// What the egress subsystem consumes: a source of syslog bindings plus its
/// per-application drain cap (negative means unlimited).
#[async_trait]
pub trait BindingSource: Send + Sync {
    async fn fetch_bindings(&self) -> Result<Vec<SyslogBinding>, ClientError>;
    fn drain_limit(&self) -> i64;
}

// Maximum observed over the process lifetime; the gauge is monotonic.
static MAX_REFRESH_LATENCY_MS: AtomicU64 = AtomicU64::new(0);

fn record_refresh(latency_ms: u64) {
    counter!("binding_refresh_count").increment(1);
    let prev = MAX_REFRESH_LATENCY_MS.fetch_max(latency_ms, Ordering::Relaxed);
    gauge!("latency_for_last_binding_refresh", "unit" => "ms").set(prev.max(latency_ms) as f64);
}

/// Pulls the snapshot, drops blacklisted and unparseable drains, caps the
/// drains per application deterministically, classifies each drain, and
/// explodes bindings into one record per (app, drain) pair.
pub struct BindingFetcher<G> {
    max_drains_per_app: usize,
    getter: G,
    blacklist: Blacklist,
}

impl<G: CacheGetter> BindingFetcher<G> {
    pub fn new(max_drains_per_app: usize, getter: G) -> Self {
        Self::with_blacklist(max_drains_per_app, getter, Blacklist::default())
    }

    pub fn with_blacklist(max_drains_per_app: usize, getter: G, blacklist: Blacklist) -> Self {
        Self { max_drains_per_app, getter, blacklist }
    }

    pub async fn fetch_bindings(&self) -> Result<Vec<SyslogBinding>, ClientError> {
        let started = Instant::now();
        let bindings = self.getter.get().await?;
        record_refresh(started.elapsed().as_millis() as u64);

        let mut out = Vec::new();
        for (app_id, binding) in remodel(bindings) {
            let mut kept: Vec<(Url, Drain)> = binding
                .drains
                .into_iter()
                .filter_map(|drain| Url::parse(&drain.url).ok().map(|parsed| (parsed, drain)))
                .filter(|(parsed, _)| !self.blacklist.excludes(parsed))
                .collect();

            // Lexicographic order on the URL makes the cap reproducible
            // across refreshes.
            kept.sort_by(|a, b| a.1.url.cmp(&b.1.url));
            kept.truncate(self.max_drains_per_app);

            for (parsed, drain) in kept {
                out.push(SyslogBinding {
                    app_id: app_id.clone(),
                    hostname: binding.hostname.clone(),
                    drain_type: DrainType::for_url(&parsed),
                    drain,
                });
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl<G: CacheGetter> BindingSource for BindingFetcher<G> {
    async fn fetch_bindings(&self) -> Result<Vec<SyslogBinding>, ClientError> {
        BindingFetcher::fetch_bindings(self).await
    }

    fn drain_limit(&self) -> i64 {
        self.max_drains_per_app as i64
    }
}

/// Re-key the snapshot by app id. Duplicate app ids merge their drains; the
/// ordered map keeps the output deterministic for identical input.
fn remodel(bindings: Vec<Binding>) -> BTreeMap<String, Binding> {
    let mut map: BTreeMap<String, Binding> = BTreeMap::new();
    for binding in bindings {
        if let Some(existing) = map.get_mut(&binding.app_id) {
            existing.drains.extend(binding.drains);
        } else {
            map.insert(binding.app_id.clone(), binding);
        }
    }
    map
}
