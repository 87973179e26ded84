//! mTLS listener driving the axum router.
//!
//! `axum::serve` only speaks plain TCP, so the accept loop is explicit:
//! handshake with tokio-rustls, gate on the peer certificate's common name,
//! then hand the stream to hyper one connection per task.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt as _;

use draincache_core::tls::peer_common_name;

/// How long an in-flight exchange may finish after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Accept loop. Runs until `shutdown` is cancelled; the bound listener keeps
/// serving the last published snapshot up to that point.
pub async fn serve(
    listener: TcpListener,
    tls_config: rustls::ServerConfig,
    expected_peer_cn: Option<String>,
    app: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let acceptor = TlsAcceptor::from(Arc::new(tls_config));

    loop {
        let (stream, peer_addr) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted?,
        };

        let acceptor = acceptor.clone();
        let app = app.clone();
        let expected_peer_cn = expected_peer_cn.clone();
        let shutdown = shutdown.clone();

        tokio::spawn(async move {
            let tls_stream = match acceptor.accept(stream).await {
                Ok(tls_stream) => tls_stream,
                Err(e) => {
                    tracing::warn!("[CacheListener] TLS handshake with {peer_addr} failed: {e}");
                    return;
                },
            };

            if let Some(expected) = expected_peer_cn.as_deref() {
                let presented = tls_stream
                    .get_ref()
                    .1
                    .peer_certificates()
                    .and_then(|certs| certs.first())
                    .and_then(peer_common_name);
                if presented.as_deref() != Some(expected) {
                    tracing::warn!(
                        "[CacheListener] rejected {peer_addr}: peer CN {presented:?}, expected {expected:?}"
                    );
                    return;
                }
            }

            let service = hyper::service::service_fn(move |request: Request<Incoming>| {
                app.clone().oneshot(request)
            });
            let builder = ConnectionBuilder::new(TokioExecutor::new());
            let conn = builder.serve_connection(TokioIo::new(tls_stream), service);
            tokio::pin!(conn);

            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(e) = result {
                        tracing::debug!("[CacheListener] connection from {peer_addr} ended: {e}");
                    }
                },
                _ = shutdown.cancelled() => {
                    let _ = tokio::time::timeout(SHUTDOWN_GRACE, conn.as_mut()).await;
                },
            }
        });
    }

    Ok(())
}
