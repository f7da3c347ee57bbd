use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::model::Subscription;
use crate::storage::{KvStore, StorageError};
use crate::user::Identity;

/// Store key under which the subscription sequence is persisted
const STORE_KEY: &str = "subscriptions";

/// Result of attempting to add a subscription
///
/// `AlreadyExists` is an expected outcome, not a failure: callers report
/// it to the acting user as an informational reply.
#[derive(Debug, Clone)]
pub enum AddOutcome {
    /// The subscription was appended and persisted
    Added(Subscription),
    /// An equal-by-value subscription was already present
    AlreadyExists(Subscription),
}

/// Result of attempting to remove a subscription
#[derive(Debug, Clone)]
pub enum RemoveOutcome {
    /// The subscription was removed and the remainder persisted
    Removed(Subscription),
    /// No equal-by-value subscription was present
    NotFound,
}

/// The persisted collection of subscriptions
///
/// Single source of truth for registered interests. The backing store
/// may be shared by several independently-running processes, so every
/// operation reloads the sequence before acting and every mutation
/// persists the result immediately. This narrows lost-update races
/// without eliminating them; there is no transactional atomicity across
/// the reload-then-persist window.
///
/// Insertion order carries no meaning but is preserved so listings are
/// deterministic.
pub struct SubscriptionRegistry {
    store: Arc<dyn KvStore>,
}

impl SubscriptionRegistry {
    /// Opens the registry over a backing store
    ///
    /// If the store has no record under the registry key yet, an empty
    /// sequence is persisted immediately, so "key missing" collapses
    /// into "key present, empty" for every later reload.
    #[instrument(skip(store))]
    pub async fn open(store: Arc<dyn KvStore>) -> Result<Self, StorageError> {
        let registry = Self { store };

        if registry.store.get(STORE_KEY).await?.is_none() {
            info!(key = STORE_KEY, "No subscription record found, initializing empty sequence");
            registry.persist(&[]).await?;
        }

        Ok(registry)
    }

    async fn load(&self) -> Result<Vec<Subscription>, StorageError> {
        let subscriptions = match self.store.get(STORE_KEY).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };

        debug!(count = subscriptions.len(), "Reloaded subscriptions from store");
        Ok(subscriptions)
    }

    async fn persist(&self, subscriptions: &[Subscription]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(subscriptions)?;
        self.store.set(STORE_KEY, bytes).await?;

        debug!(count = subscriptions.len(), "Persisted subscriptions to store");
        Ok(())
    }

    /// Whether an equal-by-value subscription is already registered
    #[instrument(skip(self, subscription))]
    pub async fn has(&self, subscription: &Subscription) -> Result<bool, StorageError> {
        Ok(self.load().await?.contains(subscription))
    }

    /// Registers a subscription, idempotently
    #[instrument(skip(self, subscription))]
    pub async fn add(&self, subscription: Subscription) -> Result<AddOutcome, StorageError> {
        let mut subscriptions = self.load().await?;

        if subscriptions.contains(&subscription) {
            debug!(subscription = %subscription, "Subscription already registered");
            return Ok(AddOutcome::AlreadyExists(subscription));
        }

        subscriptions.push(subscription.clone());
        self.persist(&subscriptions).await?;

        info!(subscription = %subscription, "Registered new subscription");
        Ok(AddOutcome::Added(subscription))
    }

    /// Removes a subscription by exact value match, idempotently
    #[instrument(skip(self, subscription))]
    pub async fn remove(&self, subscription: &Subscription) -> Result<RemoveOutcome, StorageError> {
        let subscriptions = self.load().await?;

        if !subscriptions.contains(subscription) {
            debug!(subscription = %subscription, "Subscription not registered, nothing to remove");
            return Ok(RemoveOutcome::NotFound);
        }

        let remaining: Vec<Subscription> = subscriptions
            .into_iter()
            .filter(|existing| existing != subscription)
            .collect();
        self.persist(&remaining).await?;

        info!(subscription = %subscription, "Removed subscription");
        Ok(RemoveOutcome::Removed(subscription.clone()))
    }

    /// Every registered subscription, in insertion order
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Subscription>, StorageError> {
        self.load().await
    }

    /// Subscriptions registered by `subscriber`
    #[instrument(skip(self))]
    pub async fn list_by_subscriber(
        &self,
        subscriber: &Identity,
    ) -> Result<Vec<Subscription>, StorageError> {
        let subscriptions = self.load().await?;
        Ok(subscriptions
            .into_iter()
            .filter(|s| s.subscriber() == subscriber)
            .collect())
    }

    /// Subscriptions that apply to events about `target`
    ///
    /// The wildcard match is structural: a subscription stored with the
    /// `ALL` target matches every identity without being expanded into
    /// per-target duplicates.
    #[instrument(skip(self))]
    pub async fn list_by_target(
        &self,
        target: &Identity,
    ) -> Result<Vec<Subscription>, StorageError> {
        let subscriptions = self.load().await?;
        Ok(subscriptions
            .into_iter()
            .filter(|s| s.target().covers(target))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryKvStore;

    mod helpers {
        use super::*;

        pub fn token(payload: char) -> String {
            let mut t: String = std::iter::repeat(payload).take(27).collect();
            t.push('=');
            t
        }

        pub fn identity(payload: char) -> Identity {
            Identity::parse(token(payload)).unwrap()
        }

        pub fn subscription(subscriber: char, kind: &str, target: &str) -> Subscription {
            Subscription::builder()
                .with_subscriber(&token(subscriber))
                .unwrap()
                .with_event(kind)
                .unwrap()
                .with_target(target)
                .unwrap()
                .build()
                .unwrap()
        }

        pub async fn open_registry() -> (SubscriptionRegistry, Arc<InMemoryKvStore>) {
            let store = Arc::new(InMemoryKvStore::new());
            let registry = SubscriptionRegistry::open(store.clone()).await.unwrap();
            (registry, store)
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_open_initializes_missing_key_to_empty_sequence() {
        let store = Arc::new(InMemoryKvStore::new());
        assert!(!store.contains_key("subscriptions"));

        let registry = SubscriptionRegistry::open(store.clone()).await.unwrap();

        assert!(store.contains_key("subscriptions"));
        assert!(registry.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_preserves_existing_records() {
        let existing = vec![subscription('A', "JOIN", &token('B'))];
        let store = Arc::new(InMemoryKvStore::with_entries(vec![(
            "subscriptions".to_string(),
            serde_json::to_vec(&existing).unwrap(),
        )]));

        let registry = SubscriptionRegistry::open(store).await.unwrap();

        assert_eq!(registry.list_all().await.unwrap(), existing);
    }

    #[tokio::test]
    async fn test_add_then_has_is_true() {
        let (registry, _) = open_registry().await;
        let sub = subscription('A', "JOIN", &token('B'));

        registry.add(sub.clone()).await.unwrap();

        assert!(registry.has(&sub).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_twice_reports_already_exists() {
        let (registry, _) = open_registry().await;
        let sub = subscription('A', "JOIN", &token('B'));

        let first = registry.add(sub.clone()).await.unwrap();
        assert!(matches!(first, AddOutcome::Added(_)));

        let second = registry.add(sub.clone()).await.unwrap();
        assert!(matches!(second, AddOutcome::AlreadyExists(_)));

        assert_eq!(registry.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_then_has_is_false() {
        let (registry, _) = open_registry().await;
        let sub = subscription('A', "JOIN", &token('B'));
        registry.add(sub.clone()).await.unwrap();

        let outcome = registry.remove(&sub).await.unwrap();
        assert!(matches!(outcome, RemoveOutcome::Removed(_)));

        assert!(!registry.has(&sub).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_missing_reports_not_found() {
        let (registry, _) = open_registry().await;
        let sub = subscription('A', "JOIN", &token('B'));

        let outcome = registry.remove(&sub).await.unwrap();
        assert!(matches!(outcome, RemoveOutcome::NotFound));
    }

    #[tokio::test]
    async fn test_remove_only_filters_exact_value_match() {
        let (registry, _) = open_registry().await;
        let join = subscription('A', "JOIN", &token('B'));
        let leave = subscription('A', "LEAVE", &token('B'));
        registry.add(join.clone()).await.unwrap();
        registry.add(leave.clone()).await.unwrap();

        registry.remove(&join).await.unwrap();

        assert_eq!(registry.list_all().await.unwrap(), vec![leave]);
    }

    #[tokio::test]
    async fn test_list_all_preserves_insertion_order_and_is_idempotent() {
        let (registry, _) = open_registry().await;
        let first = subscription('A', "JOIN", &token('B'));
        let second = subscription('C', "LEAVE", &token('B'));
        let third = subscription('A', "MUTE", "ALL");
        registry.add(first.clone()).await.unwrap();
        registry.add(second.clone()).await.unwrap();
        registry.add(third.clone()).await.unwrap();

        let listed = registry.list_all().await.unwrap();
        assert_eq!(listed, vec![first, second, third]);
        assert_eq!(registry.list_all().await.unwrap(), listed);
    }

    #[tokio::test]
    async fn test_list_by_subscriber_filters() {
        let (registry, _) = open_registry().await;
        let alices = subscription('A', "JOIN", &token('B'));
        let carols = subscription('C', "JOIN", &token('B'));
        registry.add(alices.clone()).await.unwrap();
        registry.add(carols).await.unwrap();

        let listed = registry.list_by_subscriber(&identity('A')).await.unwrap();
        assert_eq!(listed, vec![alices]);
    }

    #[tokio::test]
    async fn test_list_by_target_includes_wildcard_subscriptions() {
        let (registry, _) = open_registry().await;
        let specific = subscription('A', "JOIN", &token('B'));
        let wildcard = subscription('C', "JOIN", "ALL");
        let unrelated = subscription('D', "JOIN", &token('E'));
        registry.add(specific.clone()).await.unwrap();
        registry.add(wildcard.clone()).await.unwrap();
        registry.add(unrelated).await.unwrap();

        let listed = registry.list_by_target(&identity('B')).await.unwrap();
        assert_eq!(listed, vec![specific, wildcard.clone()]);

        // the wildcard record matches any other identity as well
        let listed = registry.list_by_target(&identity('E')).await.unwrap();
        assert!(listed.contains(&wildcard));
    }

    #[tokio::test]
    async fn test_registry_sees_writes_from_another_instance_sharing_the_store() {
        let store = Arc::new(InMemoryKvStore::new());
        let first = SubscriptionRegistry::open(store.clone()).await.unwrap();
        let second = SubscriptionRegistry::open(store).await.unwrap();

        let sub = subscription('A', "JOIN", &token('B'));
        first.add(sub.clone()).await.unwrap();

        // no cache layer: the second instance reloads and sees the write
        assert!(second.has(&sub).await.unwrap());
        assert_eq!(second.list_all().await.unwrap(), vec![sub]);
    }
}
