// Host-server collaborator seam
//
// The chat/voice server connection itself lives outside this crate. The
// engine only needs two things from it: the current online-user snapshot
// and a way to send a direct message to a connected user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::user::Identity;

/// A currently-connected user as reported by the host server
///
/// The display name is session-local and not guaranteed unique; the
/// identity is the stable account token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    pub identity: Identity,
    pub display_name: String,
}

impl OnlineUser {
    pub fn new(identity: Identity, display_name: impl Into<String>) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
        }
    }
}

/// Trait for the presence/messaging collaborator
///
/// `send_direct_message` is best-effort: there is no delivery
/// confirmation and no retry, so the method surfaces no error. Offline
/// recipients are the caller's concern (the dispatcher checks the
/// snapshot first and skips them).
#[async_trait]
pub trait PresenceBackend: Send + Sync {
    /// The live snapshot of connected users. Callers must not cache the
    /// result across events; names and presence change between calls.
    async fn online_users(&self) -> Vec<OnlineUser>;

    /// Deliver `text` to the user named by `to`, fire-and-forget.
    async fn send_direct_message(&self, to: &Identity, text: &str);
}

/// A no-op presence backend
///
/// Reports nobody online and discards messages. Useful in tests and for
/// embedders that want to wire the engine before the real server
/// connection exists.
pub struct NoOpPresenceBackend;

#[async_trait]
impl PresenceBackend for NoOpPresenceBackend {
    async fn online_users(&self) -> Vec<OnlineUser> {
        Vec::new()
    }

    async fn send_direct_message(&self, _to: &Identity, _text: &str) {}
}
