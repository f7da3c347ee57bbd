use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use herald::{Identity, OnlineUser, PresenceBackend};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Presence backend double: a mutable online-user list plus a record of
/// every direct message, keyed by recipient identity.
#[derive(Clone, Default)]
pub struct FakePresenceBackend {
    online: Arc<RwLock<Vec<OnlineUser>>>,
    sent_messages: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl FakePresenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self, user: OnlineUser) {
        self.online.write().await.push(user);
    }

    pub async fn disconnect(&self, identity: &Identity) {
        self.online
            .write()
            .await
            .retain(|u| &u.identity != identity);
    }

    pub async fn messages_for(&self, identity: &Identity) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(identity.as_str())
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PresenceBackend for FakePresenceBackend {
    async fn online_users(&self) -> Vec<OnlineUser> {
        self.online.read().await.clone()
    }

    async fn send_direct_message(&self, to: &Identity, text: &str) {
        self.sent_messages
            .write()
            .await
            .entry(to.as_str().to_string())
            .or_default()
            .push(text.to_string());
    }
}
