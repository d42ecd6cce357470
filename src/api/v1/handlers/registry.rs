/*
 * Responsibility
 * - POST /registry/refresh (registry からの "changed" 通知 webhook)
 * - refresher への通知だけを行う (pull の完了をここでは待たない)
 */
use axum::{Json, extract::State, http::StatusCode};
use serde_json::json;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::AppError;
use crate::services::discovery::RegistryEvent;
use crate::state::AppState;

pub async fn refresh(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    match state.refresh_tx.try_send(RegistryEvent::Changed) {
        // A full queue means a refresh is already pending; that cycle will
        // observe this change too.
        Ok(()) | Err(TrySendError::Full(_)) => {
            Ok((StatusCode::ACCEPTED, Json(json!({"status": "accepted"}))))
        }
        Err(TrySendError::Closed(_)) => Err(AppError::Internal),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::services::authorizer::OriginAuthorizer;
    use crate::services::discovery::ServiceCatalog;
    use crate::services::greetings::GreetingsClient;

    fn state_with(tx: mpsc::Sender<RegistryEvent>) -> AppState {
        let catalog = ServiceCatalog::new();
        let greetings = Arc::new(
            GreetingsClient::new(
                "greetings-service".to_string(),
                catalog.clone(),
                Duration::from_secs(1),
            )
            .unwrap(),
        );
        AppState::new(OriginAuthorizer::new(catalog), greetings, tx)
    }

    #[tokio::test]
    async fn webhook_enqueues_a_change_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let (status, _) = refresh(State(state_with(tx))).await.unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(matches!(rx.try_recv(), Ok(RegistryEvent::Changed)));
    }

    #[tokio::test]
    async fn webhook_coalesces_when_a_refresh_is_already_pending() {
        let (tx, _rx) = mpsc::channel(1);
        let state = state_with(tx);

        let (first, _) = refresh(State(state.clone())).await.unwrap();
        // Queue is full now; the pending cycle covers this notification too.
        let (second, _) = refresh(State(state)).await.unwrap();

        assert_eq!(first, StatusCode::ACCEPTED);
        assert_eq!(second, StatusCode::ACCEPTED);
    }
}
