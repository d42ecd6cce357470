pub mod catalog;
pub mod client;
pub mod http;
pub mod refresh;

pub use catalog::{CatalogSnapshot, InstanceEndpoint, ServiceCatalog};
pub use client::{DiscoveryClient, DiscoveryError};
pub use http::HttpRegistryClient;
pub use refresh::{CatalogRefresher, RegistryEvent};
