use serde::{Deserialize, Serialize};

use super::model::Subscription;

/// Target half of a subscribe/unsubscribe request
///
/// Mirrors the two optional command arguments: the acting user supplies
/// either a raw identity token (usable even when the target is offline,
/// and the literal `ALL` for the wildcard) or a display name (only
/// resolvable while the target is connected). Supplying both, or
/// neither, is ambiguous and rejected by the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetRequest {
    pub uid: Option<String>,
    pub nickname: Option<String>,
}

impl TargetRequest {
    pub fn uid(token: impl Into<String>) -> Self {
        Self {
            uid: Some(token.into()),
            nickname: None,
        }
    }

    pub fn nickname(name: impl Into<String>) -> Self {
        Self {
            uid: None,
            nickname: Some(name.into()),
        }
    }

    /// Shorthand for the wildcard target
    pub fn all() -> Self {
        Self::uid(crate::user::WILDCARD_TOKEN)
    }
}

/// A subscription enriched for display
///
/// `target_name` carries the target's current display name when the
/// target is connected; listings fall back to the raw identity token
/// otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub subscription: Subscription,
    pub target_name: Option<String>,
}

impl SubscriptionView {
    /// The label a listing shows for the target: nickname when known,
    /// raw token otherwise.
    pub fn target_label(&self) -> &str {
        self.target_name
            .as_deref()
            .unwrap_or_else(|| self.subscription.target().as_str())
    }
}
