/*
 * Responsibility
 * - Config読み込み → 依存生成 (catalog / refresher / clients) → Router 組み立て
 * - Middleware の適用 (CORS / HTTP 共通層)
 * - axum::serve() で起動
 */
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::{AppEnv, Config},
    middleware,
    services::{
        authorizer::OriginAuthorizer,
        discovery::{CatalogRefresher, HttpRegistryClient, RegistryEvent, ServiceCatalog},
        greetings::GreetingsClient,
    },
    state::AppState,
};

// refresh は毎回全量 pull なので通知を溜める意味はない。小さくてよい。
const REGISTRY_EVENT_BUFFER: usize = 8;

fn init_tracing(app_env: AppEnv) {
    // Prefer RUST_LOG if set; otherwise use a sensible per-env default.
    // Ex:
    // RUST_LOG=info,edge_service=debug,tower_http=debug cargo run
    let default_filter = if app_env.is_production() {
        "info,tower_http=info"
    } else {
        "debug,tower_http=debug"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.app_env);

    tracing::info!(
        "starting edge service in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    let catalog = ServiceCatalog::new();

    let registry = Arc::new(HttpRegistryClient::new(
        &config.registry_url,
        config.registry_timeout,
    )?);

    // catalog の唯一の writer。request path から完全に切り離した task で
    // 動かし、event (webhook) と poll fallback の両方で追従する。
    let (refresh_tx, refresh_rx) = mpsc::channel::<RegistryEvent>(REGISTRY_EVENT_BUFFER);
    CatalogRefresher::new(
        catalog.clone(),
        registry,
        config.registry_refresh_interval,
        config.registry_timeout,
    )
    .spawn(refresh_rx);

    let authorizer = OriginAuthorizer::new(catalog.clone());
    let greetings = Arc::new(GreetingsClient::new(
        config.greetings_service_id.clone(),
        catalog,
        config.upstream_timeout,
    )?);

    Ok(AppState::new(authorizer, greetings, refresh_tx))
}

fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state.clone());

    let router = middleware::cors::apply(router, state);
    middleware::http::apply(router)
}
