//! Binding cache daemon.
//!
//! Polls the control-plane binding provider over mTLS, merges the plain and
//! mTLS drain streams into one snapshot per application, and serves the
//! snapshot to forwarder agents over an mTLS HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use draincache_core::{metrics, tls, AggregateStore, HttpProviderClient, Poller, Store};
use draincache_server::cli::Cli;
use draincache_server::state::AppState;
use draincache_server::{api, listener};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.log_level);
    metrics::init_metrics();

    let config = cli.into_config();
    info!("🚀 binding cache starting on port {}...", config.cache_port);

    let provider_expected_cn =
        (!config.provider_expected_cn.is_empty()).then_some(config.provider_expected_cn.as_str());
    let http = tls::build_mtls_http_client(
        &config.provider_ca_path,
        &config.provider_cert_path,
        &config.provider_key_path,
        provider_expected_cn,
        config.request_timeout(),
    )
    .context("failed to build provider mTLS client")?;
    let provider =
        Arc::new(HttpProviderClient::new(http, config.provider_addr.clone(), config.batch_size));

    let tls_config = tls::load_server_config(
        &config.listener_cert_path,
        &config.listener_key_path,
        &config.listener_ca_path,
    )
    .context("failed to load listener TLS material")?;

    let store = Arc::new(Store::new());
    let aggregate = Arc::new(AggregateStore::new(config.aggregate_drain_urls.clone()));
    let shutdown = CancellationToken::new();

    Poller::new(provider, Arc::clone(&store), config.poller_intervals(), shutdown.clone())
        .start()
        .await;
    info!("✅ initial snapshot published ({} bindings)", store.get().len());

    let state = AppState::new(store, aggregate);
    let app = api::router().with_state(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.cache_port));
    let tcp = TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
    info!("🌐 cache listening on https://{addr}");

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("shutdown signal received, stopping poll loops and listener");
            shutdown.cancel();
        });
    }

    let expected_peer_cn =
        (!config.expected_peer_cn.is_empty()).then(|| config.expected_peer_cn.clone());
    listener::serve(tcp, tls_config, expected_peer_cn, app, shutdown)
        .await
        .context("cache listener failed")?;

    Ok(())
}

fn init_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => tracing::error!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
