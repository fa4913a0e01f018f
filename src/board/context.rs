use std::sync::Arc;

use crate::error::{BoardError, Result};
use crate::interfaces::identity::IdentityProvider;
use crate::interfaces::store::DocumentStore;
use crate::providers::memory::{LocalIdentity, MemoryStore};

/// Explicitly constructed connection state: the document store and
/// identity handles every store and the engine operate through. Replaces
/// module-level globals so tests can inject doubles.
pub struct BoardContext {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    app_id: String,
}

impl BoardContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        app_id: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            identity,
            app_id: app_id.into(),
        })
    }

    /// Context backed by the in-memory provider with a locally generated
    /// identity. Used when no remote backend is configured.
    pub fn in_memory(app_id: impl Into<String>) -> Arc<Self> {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LocalIdentity::new()),
            app_id,
        )
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The auth gate: every board operation resolves the user through
    /// here before touching the store.
    pub fn require_user(&self) -> Result<String> {
        self.identity.current_user().ok_or(BoardError::Auth)
    }

    pub fn columns_path(&self, user: &str) -> String {
        self.user_path(user, "boardColumns")
    }

    pub fn tasks_path(&self, user: &str) -> String {
        self.user_path(user, "tasks")
    }

    pub fn personnel_path(&self, user: &str) -> String {
        self.user_path(user, "personnel")
    }

    fn user_path(&self, user: &str, collection: &str) -> String {
        format!("apps/{}/users/{}/{}", self.app_id, user, collection)
    }
}
