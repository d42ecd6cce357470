//! Discovery registry interface consumed by the catalog refresher.
use async_trait::async_trait;
use thiserror::Error;

use crate::services::discovery::catalog::InstanceEndpoint;

/// Result type for registry operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Registry-layer errors (transport/protocol/payload).
///
/// Kept independent from `AppError`: a failed pull is the refresher's
/// problem and must never surface on the request path.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("registry connection error: {0}")]
    Connection(String),
    #[error("registry response error: {0}")]
    Response(String),
    #[error("registry payload error: {0}")]
    InvalidPayload(String),
}

/// A minimal read-only view of a service registry.
///
/// This is intentionally small:
/// - the refresher only needs "all service ids" plus "instances per id"
/// - registration/heartbeat belong to the registry's own clients, not here
#[async_trait]
pub trait DiscoveryClient: Send + Sync + 'static {
    // Returns the registry backend name (for logging).
    fn registry_name(&self) -> &'static str;

    // All service ids currently known to the registry.
    async fn services(&self) -> DiscoveryResult<Vec<String>>;

    // Current instances of one service, in the registry's listing order.
    async fn instances(&self, service_id: &str) -> DiscoveryResult<Vec<InstanceEndpoint>>;
}
