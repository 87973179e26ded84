#![allow(clippy::unwrap_used, reason = "test assertions")]

use std::sync::Arc;
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::merge::merge_bindings;
use crate::poller::{Poller, PollerIntervals};
use crate::provider::HttpProviderClient;
use crate::store::Store;

fn test_intervals() -> PollerIntervals {
    // Long enough that no loop ticks during a test; the initial pass and
    // direct cycle calls drive everything.
    PollerIntervals {
        polling: Duration::from_secs(3600),
        mtls_polling: Duration::from_secs(3600),
        process: Duration::from_secs(3600),
    }
}

fn poller_for(server: &MockServer, store: &Arc<Store>) -> Poller<HttpProviderClient> {
    let client = HttpProviderClient::new(Client::new(), server.uri(), 1000);
    Poller::new(Arc::new(client), Arc::clone(store), test_intervals(), CancellationToken::new())
}

async fn mount_empty_certs(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/internal/v4/mtls_syslog_drain_urls"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"bindings": {}})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_initial_pass_paginates_until_cursor_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal/v4/syslog_drain_urls"))
        .and(query_param("next_id", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {
                "app1": {"drains": ["syslog://d1", "syslog://d2"], "hostname": "host-1"}
            },
            "next_id": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/internal/v4/syslog_drain_urls"))
        .and(query_param("next_id", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {
                "app2": {"drains": ["syslog://d3", "syslog://d4"], "hostname": "host-2"}
            },
            "next_id": 0
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_certs(&server).await;

    let store = Arc::new(Store::new());
    poller_for(&server, &store).start().await;

    let snapshot = store.get();
    assert_eq!(snapshot.len(), 2);

    let app1 = snapshot.iter().find(|b| b.app_id == "app1").unwrap();
    assert_eq!(app1.hostname, "host-1");
    let urls: Vec<&str> = app1.drains.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec!["syslog://d1", "syslog://d2"]);
    assert!(app1.drains.iter().all(|d| d.tls_credential.is_empty()));
}

#[tokio::test]
async fn test_pagination_stops_after_one_request_when_first_cursor_is_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal/v4/syslog_drain_urls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {"app1": {"drains": ["syslog://d1"], "hostname": "h"}},
            "next_id": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(Store::new());
    poller_for(&server, &store).refresh_urls().await.unwrap();
    store.merge(merge_bindings);
    assert_eq!(store.get().len(), 1);
}

#[tokio::test]
async fn test_empty_upstream_response_produces_empty_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal/v4/syslog_drain_urls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {},
            "next_id": 0
        })))
        .mount(&server)
        .await;
    mount_empty_certs(&server).await;

    let store = Arc::new(Store::new());
    poller_for(&server, &store).start().await;

    assert!(store.get().is_empty());
}

#[tokio::test]
async fn test_mtls_credentials_survive_the_merge_and_sort_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal/v4/syslog_drain_urls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {"app1": {"drains": ["syslog://plain"], "hostname": "plain-host"}},
            "next_id": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/internal/v4/mtls_syslog_drain_urls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "bindings": {
                "app1": {
                    "app_id": "app1",
                    "hostname": "mtls-host",
                    "drains": [
                        {"url": "syslog-tls://secure", "tls_credential": {"cert": "c", "key": "k"}}
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let store = Arc::new(Store::new());
    poller_for(&server, &store).start().await;

    let snapshot = store.get();
    assert_eq!(snapshot.len(), 1);
    let binding = &snapshot[0];
    assert_eq!(binding.hostname, "mtls-host");
    assert_eq!(binding.drains.len(), 2);
    assert_eq!(binding.drains[0].url, "syslog-tls://secure");
    assert_eq!(binding.drains[0].tls_credential.cert, "c");
    assert_eq!(binding.drains[0].tls_credential.key, "k");
    assert_eq!(binding.drains[1].url, "syslog://plain");
}

#[tokio::test]
async fn test_decode_error_abandons_cycle_without_touching_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/internal/v4/syslog_drain_urls"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let store = Arc::new(Store::new());
    store.set_non_mtls(Some(draincache_types::BindingsMap::from([(
        "app1".to_string(),
        draincache_types::Binding {
            app_id: "app1".to_string(),
            hostname: "h".to_string(),
            drains: vec![draincache_types::Drain::plain("syslog://keep")],
        },
    )])));
    store.merge(merge_bindings);
    let before = store.get();

    let poller = poller_for(&server, &store);
    assert!(poller.refresh_urls().await.is_err());

    store.merge(merge_bindings);
    assert_eq!(store.get(), before);
}

#[test]
fn test_provider_error_counts_one_refresh_error_and_keeps_snapshot() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let store = Arc::new(Store::new());
            store.set_non_mtls(Some(draincache_types::BindingsMap::from([(
                "app1".to_string(),
                draincache_types::Binding {
                    app_id: "app1".to_string(),
                    hostname: "h".to_string(),
                    drains: vec![draincache_types::Drain::plain("syslog://keep")],
                },
            )])));
            store.merge(merge_bindings);
            let before = store.get();

            let poller = poller_for(&server, &store);
            assert!(poller.refresh_urls().await.is_err());

            store.merge(merge_bindings);
            assert_eq!(store.get(), before);
        });
    });

    let errors: u64 = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| key.key().name() == "binding_refresh_error")
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(n) => n,
            other => panic!("unexpected metric value {other:?}"),
        })
        .sum();
    assert_eq!(errors, 1);
}
