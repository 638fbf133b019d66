//! Session storage
//!
//! Each thread id owns one conversation behind its own async mutex, so runs
//! on the same thread queue up while different threads proceed in parallel.
//! Currently in-memory only.

use crate::models::ConversationState;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub type SessionHandle = Arc<Mutex<ConversationState>>;

/// Trait for session persistence
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Existing session for `thread_id`, or a new empty one
    async fn open(&self, thread_id: &str) -> Result<SessionHandle>;
    async fn get(&self, thread_id: &str) -> Result<Option<SessionHandle>>;
    async fn list(&self) -> Result<Vec<String>>;
}

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn open(&self, thread_id: &str) -> Result<SessionHandle> {
        if let Some(existing) = self.sessions.read().await.get(thread_id) {
            return Ok(existing.clone());
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::new(thread_id))));
        Ok(handle.clone())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<SessionHandle>> {
        Ok(self.sessions.read().await.get(thread_id).cloned())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
