//! Tracks which users are mid-registration.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Tracks users with an onboarding conversation in progress.
#[async_trait]
pub trait SessionTracker: Send + Sync {
    /// Mark `user_id` as being onboarded.
    async fn begin(&self, user_id: &str);

    async fn is_active(&self, user_id: &str) -> bool;

    /// Forget `user_id`. Clearing an unknown user is a no-op.
    async fn clear(&self, user_id: &str);
}

/// Process-local session set. Lost on restart, which only means the next
/// message re-opens the session.
#[derive(Default)]
pub struct InMemorySessions {
    active: RwLock<HashSet<String>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionTracker for InMemorySessions {
    async fn begin(&self, user_id: &str) {
        let mut active = self.active.write().await;
        if active.insert(user_id.to_string()) {
            tracing::debug!(user_id, "Onboarding session started");
        }
    }

    async fn is_active(&self, user_id: &str) -> bool {
        self.active.read().await.contains(user_id)
    }

    async fn clear(&self, user_id: &str) {
        if self.active.write().await.remove(user_id) {
            tracing::debug!(user_id, "Onboarding session cleared");
        }
    }
}
