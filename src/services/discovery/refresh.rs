//! Background refresh of the registry mirror.
//!
//! The refresher is the catalog's only writer. It reacts to "registry
//! changed" notifications and falls back to periodic polling, so a broken
//! event source degrades to staleness rather than to a wrong catalog.
//!
//! Failure policy: a pull that errors or exceeds its deadline is abandoned
//! for that cycle; the previous snapshot stays in place and the next trigger
//! retries. Nothing here ever propagates into the request path.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::services::discovery::catalog::{CatalogSnapshot, ServiceCatalog};
use crate::services::discovery::client::{DiscoveryClient, DiscoveryResult};

/// Notification from the discovery collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The registry's content changed (or may have); re-pull everything.
    Changed,
}

pub struct CatalogRefresher<C> {
    catalog: ServiceCatalog,
    client: Arc<C>,
    poll_interval: Duration,
    pull_timeout: Duration,
}

impl<C: DiscoveryClient> CatalogRefresher<C> {
    pub fn new(
        catalog: ServiceCatalog,
        client: Arc<C>,
        poll_interval: Duration,
        pull_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            client,
            poll_interval,
            pull_timeout,
        }
    }

    /// Spawn the refresh loop on its own task.
    ///
    /// The first poll tick fires immediately and doubles as the startup
    /// pull; startup itself is not blocked on it, the catalog simply stays
    /// empty (= deny everything) until the pull lands.
    pub fn spawn(self, mut events: mpsc::Receiver<RegistryEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut poll = tokio::time::interval(self.poll_interval);
            poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = poll.tick() => self.refresh("poll").await,
                    event = events.recv() => match event {
                        Some(RegistryEvent::Changed) => self.refresh("event").await,
                        None => break,
                    },
                }
            }

            // 通知元が落ちても poll fallback だけで動き続ける
            loop {
                poll.tick().await;
                self.refresh("poll").await;
            }
        })
    }

    /// One refresh cycle, bounded by the pull deadline.
    pub(crate) async fn refresh(&self, trigger: &'static str) {
        match tokio::time::timeout(self.pull_timeout, self.pull_catalog()).await {
            Ok(Ok(services)) => {
                tracing::debug!(
                    trigger,
                    services,
                    registry = self.client.registry_name(),
                    "catalog refreshed"
                );
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    trigger,
                    error = %err,
                    "registry pull failed, keeping last catalog"
                );
            }
            Err(_) => {
                tracing::warn!(
                    trigger,
                    timeout_ms = self.pull_timeout.as_millis() as u64,
                    "registry pull timed out, keeping last catalog"
                );
            }
        }
    }

    /// Full re-pull: list every service id, fetch its instances, install the
    /// result as the new snapshot. Any failure abandons the whole cycle so
    /// the catalog is never half-updated.
    async fn pull_catalog(&self) -> DiscoveryResult<usize> {
        let service_ids = self.client.services().await?;

        let mut mapping = CatalogSnapshot::with_capacity(service_ids.len());
        for service_id in service_ids {
            let instances = self.client.instances(&service_id).await?;
            mapping.insert(service_id, instances);
        }

        let services = mapping.len();
        self.catalog.replace_all(mapping);
        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::services::discovery::catalog::InstanceEndpoint;
    use crate::services::discovery::client::DiscoveryError;

    struct StubRegistry {
        listing: Mutex<CatalogSnapshot>,
        fail: AtomicBool,
    }

    impl StubRegistry {
        fn with(listing: CatalogSnapshot) -> Arc<Self> {
            Arc::new(Self {
                listing: Mutex::new(listing),
                fail: AtomicBool::new(false),
            })
        }

        fn set_listing(&self, listing: CatalogSnapshot) {
            *self.listing.lock().unwrap() = listing;
        }
    }

    #[async_trait]
    impl DiscoveryClient for StubRegistry {
        fn registry_name(&self) -> &'static str {
            "stub"
        }

        async fn services(&self) -> DiscoveryResult<Vec<String>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DiscoveryError::Connection("stub down".into()));
            }
            Ok(self.listing.lock().unwrap().keys().cloned().collect())
        }

        async fn instances(&self, service_id: &str) -> DiscoveryResult<Vec<InstanceEndpoint>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DiscoveryError::Connection("stub down".into()));
            }
            Ok(self
                .listing
                .lock()
                .unwrap()
                .get(service_id)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn listing(entries: &[(&str, &[(&str, u16)])]) -> CatalogSnapshot {
        entries
            .iter()
            .map(|(svc, eps)| {
                (
                    svc.to_string(),
                    eps.iter()
                        .map(|(h, p)| InstanceEndpoint::new(*h, *p))
                        .collect(),
                )
            })
            .collect()
    }

    fn refresher(client: Arc<StubRegistry>) -> (ServiceCatalog, CatalogRefresher<StubRegistry>) {
        let catalog = ServiceCatalog::new();
        let refresher = CatalogRefresher::new(
            catalog.clone(),
            client,
            // Long enough that only explicit triggers matter in tests.
            Duration::from_secs(3600),
            Duration::from_secs(1),
        );
        (catalog, refresher)
    }

    async fn wait_for(catalog: &ServiceCatalog, pred: impl Fn(&CatalogSnapshot) -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if pred(&catalog.snapshot()) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("catalog did not reach the expected state in time");
    }

    #[tokio::test]
    async fn pull_installs_the_full_listing() {
        let registry = StubRegistry::with(listing(&[
            ("greetings-service", &[("10.0.0.5", 8080)]),
            ("html5-client", &[("10.0.0.7", 80), ("10.0.0.8", 80)]),
        ]));
        let (catalog, refresher) = refresher(registry);

        refresher.refresh("test").await;

        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.get("greetings-service"),
            Some(&vec![InstanceEndpoint::new("10.0.0.5", 8080)])
        );
        assert_eq!(snapshot.get("html5-client").map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn failed_pull_keeps_the_previous_snapshot() {
        let registry = StubRegistry::with(listing(&[("svc", &[("1.2.3.4", 80)])]));
        let (catalog, refresher) = refresher(registry.clone());

        refresher.refresh("test").await;
        assert!(catalog.snapshot().contains_key("svc"));

        registry.fail.store(true, Ordering::SeqCst);
        refresher.refresh("test").await;

        // Stale beats unavailable.
        assert_eq!(
            catalog.snapshot().get("svc"),
            Some(&vec![InstanceEndpoint::new("1.2.3.4", 80)])
        );
    }

    #[tokio::test]
    async fn deregistered_services_disappear_after_a_pull() {
        let registry = StubRegistry::with(listing(&[
            ("stays", &[("1.1.1.1", 80)]),
            ("goes", &[("2.2.2.2", 80)]),
        ]));
        let (catalog, refresher) = refresher(registry.clone());

        refresher.refresh("test").await;
        assert_eq!(catalog.snapshot().len(), 2);

        registry.set_listing(listing(&[("stays", &[("1.1.1.1", 80)])]));
        refresher.refresh("test").await;

        let snapshot = catalog.snapshot();
        assert!(snapshot.contains_key("stays"));
        assert!(!snapshot.contains_key("goes"));
    }

    #[tokio::test]
    async fn change_event_triggers_a_refresh() {
        let registry = StubRegistry::with(listing(&[("svc", &[("1.2.3.4", 80)])]));
        let (catalog, refresher) = refresher(registry.clone());

        let (tx, rx) = mpsc::channel(8);
        let handle = refresher.spawn(rx);

        // Startup pull (immediate first tick).
        wait_for(&catalog, |s| s.contains_key("svc")).await;

        registry.set_listing(listing(&[("svc", &[("5.6.7.8", 80)])]));
        tx.send(RegistryEvent::Changed).await.unwrap();

        wait_for(&catalog, |s| {
            s.get("svc") == Some(&vec![InstanceEndpoint::new("5.6.7.8", 80)])
        })
        .await;

        handle.abort();
    }
}
