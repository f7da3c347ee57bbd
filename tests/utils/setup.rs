use std::sync::Arc;

use herald::{
    EventDispatcher, Identity, InMemoryKvStore, OnlineUser, SubscriptionRegistry,
    SubscriptionService,
};

use super::mocks::FakePresenceBackend;

/// Installs a log subscriber so `RUST_LOG=herald=debug` surfaces engine
/// logs during test runs. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald=info".into()),
        )
        .try_init();
}

/// Builds an identity token: 27 copies of `payload` plus the `=` pad.
pub fn token(payload: char) -> String {
    let mut t: String = std::iter::repeat(payload).take(27).collect();
    t.push('=');
    t
}

pub fn identity(payload: char) -> Identity {
    Identity::parse(token(payload)).unwrap()
}

/// The whole engine wired over one shared store and one fake backend
pub struct TestSetup {
    pub store: Arc<InMemoryKvStore>,
    pub backend: Arc<FakePresenceBackend>,
    pub registry: Arc<SubscriptionRegistry>,
    pub service: SubscriptionService,
    pub dispatcher: EventDispatcher,
}

impl TestSetup {
    pub async fn new() -> Self {
        Self::over_store(Arc::new(InMemoryKvStore::new())).await
    }

    /// Wires a fresh engine instance over an existing store, as a
    /// restarted or redundant process would.
    pub async fn over_store(store: Arc<InMemoryKvStore>) -> Self {
        init_tracing();

        let backend = Arc::new(FakePresenceBackend::new());
        let registry = Arc::new(SubscriptionRegistry::open(store.clone()).await.unwrap());
        let service = SubscriptionService::new(registry.clone(), backend.clone());
        let dispatcher = EventDispatcher::new(registry.clone(), backend.clone());

        Self {
            store,
            backend,
            registry,
            service,
            dispatcher,
        }
    }

    pub async fn connect(&self, payload: char, name: &str) -> OnlineUser {
        let user = OnlineUser::new(identity(payload), name);
        self.backend.connect(user.clone()).await;
        user
    }
}
