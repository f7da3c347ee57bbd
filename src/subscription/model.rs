use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::user::{Identity, InvalidIdentity, Target};

/// Categories of observable state change a user can subscribe to
///
/// `All` is the wildcard kind: valid in a subscription's event field
/// ("notify me about anything this target does"), never emitted as an
/// actual occurring event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum EventKind {
    Join,
    Leave,
    Away,
    Back,
    Mute,
    Deaf,
    Track,
    All,
}

impl EventKind {
    /// Parses a raw kind string, case-insensitively ("join" == "JOIN")
    pub fn parse(value: &str) -> Result<Self, SubscriptionError> {
        Self::from_str(value).map_err(|_| SubscriptionError::InvalidEventKind {
            value: value.to_string(),
        })
    }

    /// Whether a subscription with this kind matches an occurring event
    pub fn matches(&self, incoming: EventKind) -> bool {
        *self == EventKind::All || *self == incoming
    }
}

/// Errors raised while constructing a subscription
///
/// All of these fire before the value exists; a partially-built
/// subscription is never observable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubscriptionError {
    #[error(transparent)]
    InvalidIdentity(#[from] InvalidIdentity),

    #[error("invalid event kind: {value:?}")]
    InvalidEventKind { value: String },

    #[error("subscription is missing its {field} field")]
    Incomplete { field: &'static str },

    #[error("a user cannot subscribe to their own events")]
    SelfSubscription,
}

/// One registered interest: (subscriber, event kind, target)
///
/// Immutable once constructed; two subscriptions are equal iff all three
/// fields are equal. The persisted record uses the field names
/// `subscriberId`, `eventKind`, `targetId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    subscriber_id: Identity,
    event_kind: EventKind,
    target_id: Target,
}

impl Subscription {
    /// Validating factory: the only way to obtain a `Subscription`
    ///
    /// The field types already guarantee well-formed tokens; the
    /// remaining structural rule is that a user cannot subscribe to
    /// themselves.
    pub fn new(
        subscriber: Identity,
        event: EventKind,
        target: Target,
    ) -> Result<Self, SubscriptionError> {
        if let Target::User(target_id) = &target {
            if target_id == &subscriber {
                return Err(SubscriptionError::SelfSubscription);
            }
        }

        Ok(Self {
            subscriber_id: subscriber,
            event_kind: event,
            target_id: target,
        })
    }

    pub fn builder() -> SubscriptionBuilder {
        SubscriptionBuilder::default()
    }

    pub fn subscriber(&self) -> &Identity {
        &self.subscriber_id
    }

    pub fn event(&self) -> EventKind {
        self.event_kind
    }

    pub fn target(&self) -> &Target {
        &self.target_id
    }
}

/// Renders `subscriber | eventKind | target` for logs and replies.
/// The format is stable but not versioned; collaborators must not parse
/// it back.
impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.subscriber_id, self.event_kind, self.target_id
        )
    }
}

/// Fail-fast builder over raw command input
///
/// Each setter validates its token immediately and refuses bad input on
/// the spot; `build` only has to check the two structural rules that
/// need every field present (completeness and self-subscription).
#[derive(Debug, Default)]
pub struct SubscriptionBuilder {
    subscriber: Option<Identity>,
    event: Option<EventKind>,
    target: Option<Target>,
}

impl SubscriptionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subscriber from a raw token. The wildcard is never a
    /// valid subscriber, so this parses a plain identity.
    pub fn with_subscriber(mut self, token: &str) -> Result<Self, SubscriptionError> {
        self.subscriber = Some(Identity::parse(token)?);
        Ok(self)
    }

    pub fn with_event(mut self, kind: &str) -> Result<Self, SubscriptionError> {
        self.event = Some(EventKind::parse(kind)?);
        Ok(self)
    }

    /// Sets the target from a raw token: an identity or the literal `ALL`.
    pub fn with_target(mut self, token: &str) -> Result<Self, SubscriptionError> {
        self.target = Some(Target::parse(token)?);
        Ok(self)
    }

    pub fn build(self) -> Result<Subscription, SubscriptionError> {
        let subscriber = self
            .subscriber
            .ok_or(SubscriptionError::Incomplete {
                field: "subscriber",
            })?;
        let event = self
            .event
            .ok_or(SubscriptionError::Incomplete { field: "event" })?;
        let target = self
            .target
            .ok_or(SubscriptionError::Incomplete { field: "target" })?;

        Subscription::new(subscriber, event, target)
    }
}
