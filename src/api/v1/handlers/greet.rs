/*
 * Responsibility
 * - GET /greet/{name} の gateway handler
 * - catalog から greetings-service の instance を選んで転送する
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::v1::dto::greeting::GreetingResponse;
use crate::error::AppError;
use crate::state::AppState;

pub async fn greet(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GreetingResponse>, AppError> {
    let greeting = state.greetings.greet(&name).await?;

    Ok(Json(GreetingResponse {
        greeting: greeting.greeting,
    }))
}
