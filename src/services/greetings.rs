//! Client for the greetings backend, resolved through the registry mirror.
//!
//! The gateway route forwards `GET /greet/{name}` to whichever instance of
//! the greetings service is currently registered. Instance choice is
//! round-robin over the catalog entry; there is no health tracking here
//! beyond what the registry itself reports.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::services::discovery::{InstanceEndpoint, ServiceCatalog};

#[derive(Debug, Error)]
pub enum GreetingsError {
    #[error("no registered instance of {0}")]
    NoInstance(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
    #[error("upstream returned an invalid body: {0}")]
    InvalidBody(String),
}

/// Body of the greetings service response, e.g. `{"greeting": "Hello, X!"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Greeting {
    pub greeting: String,
}

#[derive(Debug)]
pub struct GreetingsClient {
    http: reqwest::Client,
    catalog: ServiceCatalog,
    service_id: String,
    next: AtomicUsize,
}

impl GreetingsClient {
    pub fn new(
        service_id: String,
        catalog: ServiceCatalog,
        timeout: Duration,
    ) -> Result<Self, GreetingsError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GreetingsError::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            catalog,
            service_id,
            next: AtomicUsize::new(0),
        })
    }

    /// Round-robin choice among the currently registered instances.
    fn choose(&self) -> Option<InstanceEndpoint> {
        let snapshot = self.catalog.snapshot();
        let instances = snapshot.get(&self.service_id)?;
        if instances.is_empty() {
            return None;
        }

        let n = self.next.fetch_add(1, Ordering::Relaxed);
        Some(instances[n % instances.len()].clone())
    }

    pub async fn greet(&self, name: &str) -> Result<Greeting, GreetingsError> {
        let instance = self
            .choose()
            .ok_or_else(|| GreetingsError::NoInstance(self.service_id.clone()))?;

        let url = format!("http://{}:{}/greet/{}", instance.host, instance.port, name);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GreetingsError::Upstream(e.to_string()))?;

        resp.json::<Greeting>()
            .await
            .map_err(|e| GreetingsError::InvalidBody(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with(catalog: ServiceCatalog) -> GreetingsClient {
        GreetingsClient::new(
            "greetings-service".to_string(),
            catalog,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn choose_rotates_over_registered_instances() {
        let catalog = ServiceCatalog::new();
        catalog.replace(
            "greetings-service",
            vec![
                InstanceEndpoint::new("10.0.0.5", 8080),
                InstanceEndpoint::new("10.0.0.6", 8080),
            ],
        );
        let client = client_with(catalog);

        let picks: Vec<_> = (0..4).map(|_| client.choose().unwrap().host).collect();
        assert_eq!(picks, vec!["10.0.0.5", "10.0.0.6", "10.0.0.5", "10.0.0.6"]);
    }

    #[test]
    fn choose_returns_none_without_instances() {
        let catalog = ServiceCatalog::new();
        let client = client_with(catalog.clone());
        assert!(client.choose().is_none());

        // An empty entry is also "no instance to call".
        catalog.replace("greetings-service", Vec::new());
        assert!(client.choose().is_none());
    }
}
