//! Periodic refresh of bindings from the control-plane provider.
//!
//! Three independent loops run for the process lifetime: the URL loop
//! paginates the plain drain listing, the certs loop fetches the
//! mTLS-credentialed listing, and the process loop folds the two into the
//! published snapshot. A failed cycle increments the error counter and is
//! abandoned; the previously published snapshot stays intact and the next
//! tick is the implicit retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use draincache_types::{Binding, BindingsMap, Drain};
use serde::Deserialize;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::merge::merge_bindings;
use crate::metrics::{
    record_refresh_error, update_last_binding_count, update_last_mtls_binding_count,
};
use crate::provider::{ProviderClient, ProviderError};
use crate::store::Store;

/// Ticker periods for the three poll loops.
#[derive(Debug, Clone, Copy)]
pub struct PollerIntervals {
    pub polling: Duration,
    pub mtls_polling: Duration,
    pub process: Duration,
}

#[derive(Debug, Deserialize)]
struct UrlsResponse {
    #[serde(default)]
    results: HashMap<String, UrlsResult>,
    #[serde(default)]
    next_id: u64,
}

#[derive(Debug, Deserialize)]
struct UrlsResult {
    #[serde(default)]
    drains: Vec<String>,
    #[serde(default)]
    hostname: String,
}

#[derive(Debug, Deserialize)]
struct CertsResponse {
    #[serde(default)]
    bindings: BindingsMap,
}

pub struct Poller<C> {
    client: Arc<C>,
    store: Arc<Store>,
    intervals: PollerIntervals,
    shutdown: CancellationToken,
}

impl<C: ProviderClient> Poller<C> {
    pub fn new(
        client: Arc<C>,
        store: Arc<Store>,
        intervals: PollerIntervals,
        shutdown: CancellationToken,
    ) -> Self {
        Self { client, store, intervals, shutdown }
    }

    /// Run one refresh pass up front so `Store::get` serves a populated
    /// snapshot shortly after startup, then spawn the three loops.
    pub async fn start(self) {
        let _ = self.refresh_urls().await;
        let _ = self.refresh_certs().await;
        self.store.merge(merge_bindings);

        tracing::info!(
            "[BindingPoller] started (polling={:?}, mtls_polling={:?}, process={:?})",
            self.intervals.polling,
            self.intervals.mtls_polling,
            self.intervals.process,
        );

        let poller = Arc::new(self);

        let url_poller = Arc::clone(&poller);
        tokio::spawn(async move {
            let mut ticker = interval(url_poller.intervals.polling);
            ticker.tick().await; // the first tick completes immediately
            loop {
                tokio::select! {
                    _ = url_poller.shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = url_poller.refresh_urls().await;
                    },
                }
            }
            tracing::info!("[BindingPoller] url loop stopped");
        });

        let cert_poller = Arc::clone(&poller);
        tokio::spawn(async move {
            let mut ticker = interval(cert_poller.intervals.mtls_polling);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cert_poller.shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = cert_poller.refresh_certs().await;
                    },
                }
            }
            tracing::info!("[BindingPoller] certs loop stopped");
        });

        tokio::spawn(async move {
            let mut ticker = interval(poller.intervals.process);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = poller.shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        poller.store.merge(merge_bindings);
                    },
                }
            }
            tracing::info!("[BindingPoller] process loop stopped");
        });
    }

    /// One URL refresh cycle: follow the pagination cursor until the
    /// provider returns `next_id == 0`, then replace the non-mTLS input map
    /// wholesale. Any failure abandons the cycle without touching the store.
    pub(crate) async fn refresh_urls(&self) -> Result<(), ProviderError> {
        let mut next_id: u64 = 0;
        let mut pages: u32 = 0;
        let mut bindings = BindingsMap::new();

        loop {
            let resp = match self.client.get_urls(next_id).await {
                Ok(resp) => resp,
                Err(e) => {
                    record_refresh_error();
                    tracing::warn!(
                        "[BindingPoller] failed to fetch cursor {next_id} from binding provider: {e}"
                    );
                    return Err(e);
                },
            };

            let page: UrlsResponse = match resp.json().await {
                Ok(page) => page,
                Err(e) => {
                    record_refresh_error();
                    tracing::warn!(
                        "[BindingPoller] failed to decode provider response at cursor {next_id}: {e}"
                    );
                    return Err(e.into());
                },
            };
            pages += 1;

            for (app_id, result) in page.results {
                let drains = result.drains.into_iter().map(Drain::plain).collect();
                bindings.insert(
                    app_id.clone(),
                    Binding { app_id, hostname: result.hostname, drains },
                );
            }

            next_id = page.next_id;
            if next_id == 0 {
                break;
            }
        }

        tracing::debug!("[BindingPoller] refreshed {} apps across {} pages", bindings.len(), pages);
        update_last_binding_count(bindings.len());
        self.store.set_non_mtls(Some(bindings));

        Ok(())
    }

    /// One mTLS refresh cycle; single request, no pagination.
    pub(crate) async fn refresh_certs(&self) -> Result<(), ProviderError> {
        let resp = match self.client.get_certs().await {
            Ok(resp) => resp,
            Err(e) => {
                record_refresh_error();
                tracing::warn!(
                    "[BindingPoller] failed to fetch mtls bindings from binding provider: {e}"
                );
                return Err(e);
            },
        };

        let decoded: CertsResponse = match resp.json().await {
            Ok(decoded) => decoded,
            Err(e) => {
                record_refresh_error();
                tracing::warn!("[BindingPoller] failed to decode mtls provider response: {e}");
                return Err(e.into());
            },
        };

        update_last_mtls_binding_count(decoded.bindings.len());
        self.store.set_mtls(Some(decoded.bindings));

        Ok(())
    }
}
