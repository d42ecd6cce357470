//! In-memory mirror of the discovery registry.
//!
//! Holds the latest known `service id -> instance endpoints` mapping and
//! serves it to concurrent readers without ever blocking on a refresh.
//!
//! Concurrency contract:
//! - many readers (request handlers), exactly one writer (the refresher)
//! - readers take an immutable snapshot via an atomic pointer load; a
//!   snapshot taken while a refresh is in flight sees either the whole old
//!   mapping or the whole new one, never a mix
//! - a snapshot stays valid for as long as the reader holds it, regardless
//!   of how many refreshes land in the meantime

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;

/// A single registered service instance (network endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceEndpoint {
    pub host: String,
    pub port: u16,
}

impl InstanceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Immutable point-in-time view of the whole mirror.
///
/// Per-service endpoint order is the registry's listing order; matching
/// ignores it, it only matters for diagnostics.
pub type CatalogSnapshot = HashMap<String, Vec<InstanceEndpoint>>;

/// Shared, atomically swappable registry mirror.
///
/// Cheap to clone; all clones point at the same snapshot slot. Starts empty,
/// so readers before the first refresh simply see no services.
#[derive(Clone, Debug, Default)]
pub struct ServiceCatalog {
    snapshot: Arc<ArcSwap<CatalogSnapshot>>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. Never blocks and never observes a torn state.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    /// Install a new endpoint list for one service id.
    ///
    /// An empty list is valid (the service currently has no healthy
    /// instances). Other service ids are left untouched.
    pub fn replace(&self, service_id: impl Into<String>, endpoints: Vec<InstanceEndpoint>) {
        let service_id = service_id.into();
        self.snapshot.rcu(|current| {
            let mut next: CatalogSnapshot = (**current).clone();
            next.insert(service_id.clone(), endpoints.clone());
            next
        });
    }

    /// Install a full new snapshot in one atomic step.
    ///
    /// Service ids missing from `mapping` are dropped: a deregistered
    /// service must stop matching immediately.
    pub fn replace_all(&self, mapping: CatalogSnapshot) {
        self.snapshot.store(Arc::new(mapping));
    }
}
