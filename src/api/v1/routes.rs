/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /greet, /registry/refresh を集約
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{greet::greet, health::health, registry};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/greet/{name}", get(greet))
        .route("/registry/refresh", post(registry::refresh))
}
