//! Prometheus metrics for the binding cache.
//!
//! Exposed metrics:
//! - `binding_refresh_error` - Counter of failed requests to the binding provider
//! - `last_binding_refresh_count` - Gauge of apps in the last successful URL refresh
//! - `last_mtls_binding_refresh_count` - Gauge of apps in the last successful mTLS refresh
//! - `cached_bindings` - Gauge of bindings in the currently published snapshot

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
/// Must be called once at startup before any metrics are recorded.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PROMETHEUS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus metrics recorder");

        describe_counter!(
            "binding_refresh_error",
            "Total number of failed requests to the binding provider."
        );
        describe_gauge!(
            "last_binding_refresh_count",
            "Current number of bindings received from binding provider during last refresh."
        );
        describe_gauge!(
            "last_mtls_binding_refresh_count",
            "Current number of mtls bindings received from binding provider during last refresh."
        );
        describe_gauge!(
            "cached_bindings",
            "Current number of bindings stored in the binding cache."
        );

        handle
    });

    handle.clone()
}

/// Render all metrics in Prometheus text format.
pub fn render_metrics() -> String {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => handle.render(),
        None => String::from("# Metrics not initialized\n"),
    }
}

/// Record a failed provider fetch (either poll loop).
pub fn record_refresh_error() {
    counter!("binding_refresh_error").increment(1);
}

/// Update the app count of the most recent successful URL refresh.
pub fn update_last_binding_count(count: usize) {
    gauge!("last_binding_refresh_count").set(count as f64);
}

/// Update the app count of the most recent successful mTLS refresh.
pub fn update_last_mtls_binding_count(count: usize) {
    gauge!("last_mtls_binding_refresh_count").set(count as f64);
}

/// Update the size of the currently published snapshot.
pub fn update_cached_bindings(count: usize) {
    gauge!("cached_bindings").set(count as f64);
}
