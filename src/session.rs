use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// In-flight searches by caller-supplied session key. Starting a search under
/// a key that is already running cancels the older one.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    active: Arc<DashMap<String, (Uuid, CancellationToken)>>,
}

/// Handle for one running search. Dropping it unregisters the search unless a
/// newer one has already taken its key.
#[derive(Debug)]
pub struct SessionGuard {
    registry: SessionRegistry,
    key: String,
    id: Uuid,
    token: CancellationToken,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, key: &str) -> SessionGuard {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();
        if let Some((previous_id, previous)) = self
            .active
            .insert(key.to_string(), (id, token.clone()))
        {
            debug!(session_key = key, %previous_id, "superseding running search");
            previous.cancel();
        }
        SessionGuard {
            registry: self.clone(),
            key: key.to_string(),
            id,
            token,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl SessionGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry
            .active
            .remove_if(&self.key, |_, (id, _)| *id == self.id);
    }
}
