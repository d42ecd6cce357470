/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - authorizer: OriginAuthorizer, greetings: Arc<GreetingsClient> など
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::services::{
    authorizer::OriginAuthorizer, discovery::RegistryEvent, greetings::GreetingsClient,
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub authorizer: OriginAuthorizer,
    pub greetings: Arc<GreetingsClient>,
    // registry からの "changed" webhook を refresher に中継する
    pub refresh_tx: mpsc::Sender<RegistryEvent>,
}

impl AppState {
    pub fn new(
        authorizer: OriginAuthorizer,
        greetings: Arc<GreetingsClient>,
        refresh_tx: mpsc::Sender<RegistryEvent>,
    ) -> Self {
        Self {
            authorizer,
            greetings,
            refresh_tx,
        }
    }
}
