//! CORS allow-origin decision for browser clients.
//!
//! Unlike a config-driven allowlist, the decision here is backed by the
//! discovery registry mirror: a cross-origin caller is approved exactly when
//! it is a currently registered service instance.
//!
//! Policy:
//! - On approval, the value the decision was made on (`Origin`, or the
//!   `Referer` fallback) is echoed in `Access-Control-Allow-Origin`. Never a
//!   wildcard.
//! - On denial, no CORS header is added and the request continues unchanged;
//!   the browser enforces the rest.
//! - This middleware should be applied at the Router level (not inside
//!   handlers).
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::services::authorizer::candidate;
use crate::state::AppState;

/// Apply the discovery-backed CORS policy to the given Router.
pub fn apply(router: Router, state: AppState) -> Router {
    router.layer(middleware::from_fn_with_state(
        state,
        allow_origin_middleware,
    ))
}

async fn allow_origin_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = header_str(&req, header::ORIGIN);
    let referer = header_str(&req, header::REFERER);

    // Decide before the request is consumed by the rest of the pipeline.
    let approved = if state
        .authorizer
        .is_allowed(origin.as_deref(), referer.as_deref())
    {
        candidate(origin.as_deref(), referer.as_deref()).map(str::to_owned)
    } else {
        None
    };

    let mut response = next.run(req).await;

    if let Some(value) = approved
        && let Ok(value) = HeaderValue::from_str(&value)
    {
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }

    response
}

fn header_str(req: &Request<Body>, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}
