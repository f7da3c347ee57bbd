use std::sync::Arc;
use tracing::debug;

use super::identity::Identity;
use crate::backend::PresenceBackend;

/// Bidirectional lookup between identities and display names
///
/// A pure function of the live connected-user snapshot: every call asks
/// the backend for the current snapshot, nothing is cached. Display
/// names are not unique, so `id_for_name` returns the first match;
/// an accepted approximation, not a correctness guarantee.
#[derive(Clone)]
pub struct IdentityResolver {
    backend: Arc<dyn PresenceBackend>,
}

impl IdentityResolver {
    pub fn new(backend: Arc<dyn PresenceBackend>) -> Self {
        Self { backend }
    }

    /// Resolves a display name to the identity of a connected user
    pub async fn id_for_name(&self, name: &str) -> Option<Identity> {
        let result = self
            .backend
            .online_users()
            .await
            .into_iter()
            .find(|user| user.display_name == name)
            .map(|user| user.identity);

        debug!(name = %name, identity = ?result, "Display name to identity lookup");
        result
    }

    /// Resolves an identity to the display name of a connected user
    pub async fn name_for_id(&self, identity: &Identity) -> Option<String> {
        let result = self
            .backend
            .online_users()
            .await
            .into_iter()
            .find(|user| &user.identity == identity)
            .map(|user| user.display_name);

        debug!(identity = %identity, name = ?result, "Identity to display name lookup");
        result
    }

    /// Whether the identity currently has a connected session
    pub async fn is_online(&self, identity: &Identity) -> bool {
        self.backend
            .online_users()
            .await
            .iter()
            .any(|user| &user.identity == identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_utils::FakePresenceBackend;
    use crate::backend::OnlineUser;

    fn identity(payload: char) -> Identity {
        let mut t: String = std::iter::repeat(payload).take(27).collect();
        t.push('=');
        Identity::parse(t).unwrap()
    }

    async fn resolver_with(users: Vec<OnlineUser>) -> (IdentityResolver, Arc<FakePresenceBackend>) {
        let backend = Arc::new(FakePresenceBackend::new());
        for user in users {
            backend.connect(user).await;
        }
        (IdentityResolver::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_id_for_name_finds_connected_user() {
        let alice = identity('A');
        let (resolver, _) =
            resolver_with(vec![OnlineUser::new(alice.clone(), "alice")]).await;

        assert_eq!(resolver.id_for_name("alice").await, Some(alice));
        assert_eq!(resolver.id_for_name("bob").await, None);
    }

    #[tokio::test]
    async fn test_name_for_id_finds_connected_user() {
        let alice = identity('A');
        let (resolver, _) =
            resolver_with(vec![OnlineUser::new(alice.clone(), "alice")]).await;

        assert_eq!(resolver.name_for_id(&alice).await, Some("alice".to_string()));
        assert_eq!(resolver.name_for_id(&identity('B')).await, None);
    }

    #[tokio::test]
    async fn test_colliding_names_resolve_to_first_match() {
        let first = identity('A');
        let second = identity('B');
        let (resolver, _) = resolver_with(vec![
            OnlineUser::new(first.clone(), "twin"),
            OnlineUser::new(second, "twin"),
        ])
        .await;

        assert_eq!(resolver.id_for_name("twin").await, Some(first));
    }

    #[tokio::test]
    async fn test_lookup_is_not_cached_across_calls() {
        let alice = identity('A');
        let (resolver, backend) =
            resolver_with(vec![OnlineUser::new(alice.clone(), "alice")]).await;

        assert!(resolver.is_online(&alice).await);

        backend.disconnect(&alice).await;
        assert!(!resolver.is_online(&alice).await);
    }
}
