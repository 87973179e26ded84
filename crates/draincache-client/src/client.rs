//! HTTP client for the binding cache API.

use draincache_types::Binding;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Fetches the published snapshot and the aggregate drain list from the
/// cache. The supplied `reqwest::Client` carries the agent's mTLS identity
/// and timeouts.
pub struct CacheClient {
    http: reqwest::Client,
    cache_addr: String,
}

impl CacheClient {
    pub fn new(http: reqwest::Client, cache_addr: impl Into<String>) -> Self {
        let cache_addr = cache_addr.into();
        Self { http, cache_addr: cache_addr.trim_end_matches('/').to_string() }
    }

    /// The merged snapshot from `GET /bindings`.
    pub async fn get(&self) -> Result<Vec<Binding>, ClientError> {
        self.fetch_json("bindings").await
    }

    /// The aggregate drain URLs from `GET /aggregate`.
    pub async fn get_aggregate(&self) -> Result<Vec<String>, ClientError> {
        self.fetch_json("aggregate").await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.http.get(format!("{}/{}", self.cache_addr, path)).send().await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }
}
