use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::services::discovery::catalog::InstanceEndpoint;
use crate::services::discovery::client::{DiscoveryClient, DiscoveryError, DiscoveryResult};

#[derive(Debug, Deserialize)]
struct ServicesResponse {
    services: Vec<String>,
}

/// HTTP/JSON registry client.
///
/// Wire format:
/// - `GET {base}/v1/services`                -> `{"services": ["a", "b"]}`
/// - `GET {base}/v1/services/{id}/instances` -> `[{"host": "...", "port": n}, ...]`
///
/// Every request carries the client-level timeout; the refresher puts its own
/// deadline around the whole pull on top of that.
#[derive(Clone, Debug)]
pub struct HttpRegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRegistryClient {
    // Create a client for a registry base URL like `http://registry:8761`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DiscoveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::Connection(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T>(&self, path: &str) -> DiscoveryResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Connection(e.to_string()))?
            .error_for_status()
            .map_err(|e| DiscoveryError::Response(e.to_string()))?;

        resp.json::<T>()
            .await
            .map_err(|e| DiscoveryError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl DiscoveryClient for HttpRegistryClient {
    fn registry_name(&self) -> &'static str {
        "http"
    }

    async fn services(&self) -> DiscoveryResult<Vec<String>> {
        let body: ServicesResponse = self.get_json("/v1/services").await?;
        Ok(body.services)
    }

    async fn instances(&self, service_id: &str) -> DiscoveryResult<Vec<InstanceEndpoint>> {
        self.get_json(&format!("/v1/services/{service_id}/instances"))
            .await
    }
}
