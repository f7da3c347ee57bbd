use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::events::PresenceEvent;
use crate::backend::PresenceBackend;
use crate::storage::StorageError;
use crate::subscription::{EventKind, SubscriptionRegistry};
use crate::user::{Identity, IdentityResolver};

/// Accounting for one dispatch call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Subscribers that received the message
    pub delivered: usize,
    /// Matching subscribers that were skipped because they are offline
    pub skipped_offline: usize,
}

/// Fans an occurring event out to its subscribers
///
/// Stateless: every call is a pure function of the incoming event, the
/// current registry contents, and the current presence snapshot. The
/// dispatcher never mutates the registry.
pub struct EventDispatcher {
    registry: Arc<SubscriptionRegistry>,
    backend: Arc<dyn PresenceBackend>,
    resolver: IdentityResolver,
}

impl EventDispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>, backend: Arc<dyn PresenceBackend>) -> Self {
        Self {
            registry,
            resolver: IdentityResolver::new(backend.clone()),
            backend,
        }
    }

    /// Entry point for the host's event callbacks
    #[instrument(skip(self, event))]
    pub async fn handle(&self, event: &PresenceEvent) -> Result<DispatchSummary, StorageError> {
        debug!(
            kind = %event.kind(),
            user = %event.user().identity,
            "Handling presence event"
        );

        self.dispatch(&event.user().identity, event.kind(), &event.message())
            .await
    }

    /// Delivers `message` once to every subscriber interested in `kind`
    /// events about `target`
    ///
    /// A subscriber with several matching subscriptions (say, one for
    /// the specific kind and one wildcard) still receives the message at
    /// most once per call. Offline subscribers are skipped silently:
    /// delivery is best-effort, there is no offline mailbox. `kind` is
    /// an occurring event and therefore never the wildcard.
    #[instrument(skip(self, message))]
    pub async fn dispatch(
        &self,
        target: &Identity,
        kind: EventKind,
        message: &str,
    ) -> Result<DispatchSummary, StorageError> {
        let subscriptions = self.registry.list_by_target(target).await?;

        let mut notified: HashSet<Identity> = HashSet::new();
        let mut summary = DispatchSummary::default();

        for subscription in subscriptions {
            if !subscription.event().matches(kind) {
                continue;
            }
            if !notified.insert(subscription.subscriber().clone()) {
                continue;
            }

            if self.resolver.is_online(subscription.subscriber()).await {
                self.backend
                    .send_direct_message(subscription.subscriber(), message)
                    .await;
                summary.delivered += 1;
            } else {
                debug!(
                    subscriber = %subscription.subscriber(),
                    "Subscriber offline, skipping delivery"
                );
                summary.skipped_offline += 1;
            }
        }

        info!(
            target = %target,
            kind = %kind,
            delivered = summary.delivered,
            skipped_offline = summary.skipped_offline,
            "Dispatched event"
        );

        Ok(summary)
    }
}
