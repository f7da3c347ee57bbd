// Subscription data model, persisted registry, and command-facing service
//
// The registry is the single source of truth for who subscribed to what;
// the service wraps it with target resolution and presence lookups for
// the command-parsing collaborator.

pub use model::{EventKind, Subscription, SubscriptionBuilder, SubscriptionError};
pub use registry::{AddOutcome, RemoveOutcome, SubscriptionRegistry};
pub use service::{AllowAllTrackTargets, ServiceError, SubscriptionService, TrackTargetPolicy};
pub use types::{SubscriptionView, TargetRequest};

mod model;
mod registry;
mod service;
mod types;
