//! Origin authorization backed by the registry mirror.
//!
//! The allow-list here is not configuration: a cross-origin caller is
//! allowed exactly when its origin resolves to the `host:port` of a
//! currently registered service instance.
//!
//! Policy:
//! - `Origin` wins over `Referer`; blank values count as absent. No headers,
//!   no authorization.
//! - Anything that does not parse as a URL is denied, silently (fail
//!   closed). The request itself still proceeds; only the CORS approval is
//!   withheld.
//! - A missing port takes the scheme default (80 for http, 443 for https);
//!   a scheme without a known default is denied.
//! - Hosts compare case-insensitively, ports exactly.
use url::Url;

use crate::services::discovery::ServiceCatalog;

#[derive(Clone, Debug)]
pub struct OriginAuthorizer {
    catalog: ServiceCatalog,
}

impl OriginAuthorizer {
    pub fn new(catalog: ServiceCatalog) -> Self {
        Self { catalog }
    }

    /// Decide whether the presumed caller is a currently registered service
    /// instance. Pure in-memory read; never blocks, never errors.
    pub fn is_allowed(&self, origin: Option<&str>, referer: Option<&str>) -> bool {
        let Some(candidate) = candidate(origin, referer) else {
            return false;
        };

        let Some((host, port)) = host_port(candidate) else {
            return false;
        };

        let snapshot = self.catalog.snapshot();
        let matched = snapshot
            .values()
            .flatten()
            .any(|ep| port == ep.port && host.eq_ignore_ascii_case(&ep.host));

        if !matched {
            tracing::debug!(%host, port, "origin does not match any registered instance");
        }
        matched
    }
}

/// The string to authorize: `Origin` if non-blank, else `Referer`.
///
/// Shared with the middleware so that the echoed header value is exactly the
/// value the decision was made on.
pub(crate) fn candidate<'a>(origin: Option<&'a str>, referer: Option<&'a str>) -> Option<&'a str> {
    origin
        .filter(|v| !v.trim().is_empty())
        .or_else(|| referer.filter(|v| !v.trim().is_empty()))
}

/// `host` and effective `port` of a header-style URL value.
///
/// Path and query are ignored, so a full `Referer` URL works the same as a
/// bare `Origin`.
fn host_port(raw: &str) -> Option<(String, u16)> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default()?;
    Some((host, port))
}
