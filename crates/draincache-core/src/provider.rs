//! HTTP client for the control-plane binding provider.

use async_trait::async_trait;
use reqwest::{Client, Response};
use thiserror::Error;

const URLS_PATH: &str = "/internal/v4/syslog_drain_urls";
const CERTS_PATH: &str = "/internal/v4/mtls_syslog_drain_urls";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to binding provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected http response from binding provider: {0}")]
    UnexpectedStatus(u16),
}

/// The capability set the poller needs from the provider. Raw responses are
/// returned; decoding is the poller's business.
#[async_trait]
pub trait ProviderClient: Send + Sync + 'static {
    async fn get_urls(&self, next_id: u64) -> Result<Response, ProviderError>;
    async fn get_certs(&self) -> Result<Response, ProviderError>;
}

/// Production provider client. The supplied `reqwest::Client` carries the
/// operator's outbound mTLS identity and the per-request timeout.
pub struct HttpProviderClient {
    http: Client,
    addr: String,
    batch_size: usize,
}

impl HttpProviderClient {
    pub fn new(http: Client, addr: impl Into<String>, batch_size: usize) -> Self {
        let addr = addr.into();
        Self { http, addr: addr.trim_end_matches('/').to_string(), batch_size }
    }

    async fn get(&self, url: String) -> Result<Response, ProviderError> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ProviderError::UnexpectedStatus(resp.status().as_u16()));
        }
        Ok(resp)
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn get_urls(&self, next_id: u64) -> Result<Response, ProviderError> {
        self.get(format!(
            "{}{}?batch_size={}&next_id={}",
            self.addr, URLS_PATH, self.batch_size, next_id
        ))
        .await
    }

    async fn get_certs(&self) -> Result<Response, ProviderError> {
        self.get(format!("{}{}", self.addr, CERTS_PATH)).await
    }
}
