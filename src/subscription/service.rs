use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::{
    model::{EventKind, Subscription, SubscriptionError},
    registry::{AddOutcome, RemoveOutcome, SubscriptionRegistry},
    types::{SubscriptionView, TargetRequest},
};
use crate::backend::{OnlineUser, PresenceBackend};
use crate::storage::StorageError;
use crate::user::{Identity, IdentityResolver, Target};

/// Policy hook deciding which targets accept TRACK subscriptions
///
/// Track changes only occur on media-playing accounts, so embedders
/// usually restrict TRACK targets to the accounts they recognize as
/// media clients. That knowledge lives with the embedder; the engine
/// only enforces whatever policy it is handed.
#[async_trait]
pub trait TrackTargetPolicy: Send + Sync {
    async fn allows(&self, target: &Target) -> bool;
}

/// Default policy: every target may receive TRACK subscriptions
pub struct AllowAllTrackTargets;

#[async_trait]
impl TrackTargetPolicy for AllowAllTrackTargets {
    async fn allows(&self, _target: &Target) -> bool {
        true
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("ambiguous target: {reason}")]
    AmbiguousTarget { reason: &'static str },

    #[error("TRACK subscriptions are restricted to media clients, target {target} is not one")]
    TrackTargetRejected { target: Target },
}

/// Operation surface for the command-parsing collaborator
///
/// Parsing user text into these calls and formatting the replies stay
/// outside this crate; the service only exposes the operations and
/// their structured outcomes.
pub struct SubscriptionService {
    registry: Arc<SubscriptionRegistry>,
    backend: Arc<dyn PresenceBackend>,
    resolver: IdentityResolver,
    track_policy: Arc<dyn TrackTargetPolicy>,
}

impl SubscriptionService {
    pub fn new(registry: Arc<SubscriptionRegistry>, backend: Arc<dyn PresenceBackend>) -> Self {
        Self {
            registry,
            resolver: IdentityResolver::new(backend.clone()),
            backend,
            track_policy: Arc::new(AllowAllTrackTargets),
        }
    }

    /// Replaces the default allow-everything TRACK policy
    pub fn with_track_policy(mut self, policy: Arc<dyn TrackTargetPolicy>) -> Self {
        self.track_policy = policy;
        self
    }

    /// Resolves a target request to a concrete target
    ///
    /// Returns the target's current display name alongside, when one is
    /// known, so callers can phrase their reply.
    async fn resolve_target(
        &self,
        request: &TargetRequest,
    ) -> Result<(Target, Option<String>), ServiceError> {
        match (&request.uid, &request.nickname) {
            (Some(_), Some(_)) => Err(ServiceError::AmbiguousTarget {
                reason: "both an identity token and a nickname were supplied",
            }),
            (None, None) => Err(ServiceError::AmbiguousTarget {
                reason: "neither an identity token nor a nickname was supplied",
            }),
            (Some(uid), None) => {
                let target = Target::parse(uid.clone()).map_err(SubscriptionError::from)?;
                let name = match &target {
                    Target::User(id) => self.resolver.name_for_id(id).await,
                    Target::All => None,
                };
                Ok((target, name))
            }
            (None, Some(nickname)) => match self.resolver.id_for_name(nickname).await {
                Some(id) => Ok((Target::User(id), Some(nickname.clone()))),
                None => Err(ServiceError::AmbiguousTarget {
                    reason: "the nickname does not resolve to a connected user",
                }),
            },
        }
    }

    /// Registers the acting user's interest in `kind` events of a target
    #[instrument(skip(self, acting, target))]
    pub async fn subscribe(
        &self,
        acting: &Identity,
        kind: EventKind,
        target: &TargetRequest,
    ) -> Result<AddOutcome, ServiceError> {
        let (target, target_name) = self.resolve_target(target).await?;

        if kind == EventKind::Track && !self.track_policy.allows(&target).await {
            debug!(target = %target, "TRACK subscription rejected by policy");
            return Err(ServiceError::TrackTargetRejected { target });
        }

        let subscription = Subscription::new(acting.clone(), kind, target)?;
        let outcome = self.registry.add(subscription).await?;

        if let AddOutcome::Added(subscription) = &outcome {
            info!(
                subscription = %subscription,
                target_name = ?target_name,
                "Subscription created"
            );
        }

        Ok(outcome)
    }

    /// Removes a previously registered interest, same target rules as subscribe
    #[instrument(skip(self, acting, target))]
    pub async fn unsubscribe(
        &self,
        acting: &Identity,
        kind: EventKind,
        target: &TargetRequest,
    ) -> Result<RemoveOutcome, ServiceError> {
        let (target, _) = self.resolve_target(target).await?;

        let subscription = Subscription::new(acting.clone(), kind, target)?;
        Ok(self.registry.remove(&subscription).await?)
    }

    /// The acting user's subscriptions, optionally filtered by kind,
    /// with target nicknames resolved where the target is connected
    #[instrument(skip(self, acting))]
    pub async fn subscriptions_for(
        &self,
        acting: &Identity,
        kind: Option<EventKind>,
    ) -> Result<Vec<SubscriptionView>, ServiceError> {
        let subscriptions = self.registry.list_by_subscriber(acting).await?;

        let mut views = Vec::new();
        for subscription in subscriptions {
            if let Some(kind) = kind {
                if subscription.event() != kind {
                    continue;
                }
            }

            let target_name = match subscription.target() {
                Target::User(id) => self.resolver.name_for_id(id).await,
                Target::All => None,
            };
            views.push(SubscriptionView {
                subscription,
                target_name,
            });
        }

        debug!(count = views.len(), "Listed subscriptions for user");
        Ok(views)
    }

    /// Currently-connected users as (display name, identity) pairs
    pub async fn online_users(&self) -> Vec<OnlineUser> {
        self.backend.online_users().await
    }
}
