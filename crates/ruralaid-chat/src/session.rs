//! In-memory registry of live conversations.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::conversation::{Conversation, Responder};

/// Live conversations keyed by session id. All share one responder.
pub struct SessionRegistry {
    responder: Arc<dyn Responder>,
    sessions: RwLock<HashMap<String, Arc<Conversation>>>,
}

impl SessionRegistry {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a conversation with a fresh session id.
    pub fn create(&self) -> Arc<Conversation> {
        let conversation = Arc::new(Conversation::new(self.responder.clone()));
        self.sessions
            .write()
            .insert(conversation.session_id().to_string(), conversation.clone());
        info!(session = %conversation.session_id(), "session started");
        conversation
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Conversation>> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Look up `session_id`, or start a new session when it is absent or unknown.
    pub fn get_or_create(&self, session_id: Option<&str>) -> Arc<Conversation> {
        session_id
            .and_then(|id| self.get(id))
            .unwrap_or_else(|| self.create())
    }

    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
