/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - GreetingsError など service 層の error を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::greetings::GreetingsError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no available instance of {service}")]
    Unavailable { service: String },
    #[error("upstream call failed")]
    Upstream,
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unavailable { service } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                format!("no available instance of {service}."),
            ),
            AppError::Upstream => (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "upstream call failed".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<GreetingsError> for AppError {
    fn from(e: GreetingsError) -> Self {
        match e {
            GreetingsError::NoInstance(service) => AppError::Unavailable { service },
            GreetingsError::Upstream(_) | GreetingsError::InvalidBody(_) => AppError::Upstream,
        }
    }
}
