use crate::llm::ChatMessage;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    pub history: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sessions held for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the session, creating it on first use.
    pub fn get_or_create(&self, key: &SessionKey) -> Session {
        if let Some(session) = self.sessions.read().get(key) {
            return session.clone();
        }

        let mut sessions = self.sessions.write();
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(
                    app = %key.app_name,
                    user = %key.user_id,
                    session = %key.session_id,
                    "Session created"
                );
                let now = Utc::now();
                Session {
                    key: key.clone(),
                    history: Vec::new(),
                    created_at: now,
                    updated_at: now,
                }
            })
            .clone()
    }

    pub fn get(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.read().get(key).cloned()
    }

    pub fn append(&self, key: &SessionKey, messages: impl IntoIterator<Item = ChatMessage>) {
        if let Some(session) = self.sessions.write().get_mut(key) {
            session.history.extend(messages);
            session.updated_at = Utc::now();
        }
    }

    pub fn remove(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_reuses_session() {
        let service = InMemorySessionService::new();
        let key = SessionKey::new("agent_factory", "u1", "s1");

        let first = service.get_or_create(&key);
        service.append(&key, [ChatMessage::user("hello")]);
        let second = service.get_or_create(&key);

        assert_eq!(service.len(), 1);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.history.len(), 1);
    }

    #[test]
    fn test_sessions_are_scoped_by_user() {
        let service = InMemorySessionService::new();
        service.get_or_create(&SessionKey::new("app", "u1", "s1"));
        service.get_or_create(&SessionKey::new("app", "u2", "s1"));

        assert_eq!(service.len(), 2);
        assert!(service.get(&SessionKey::new("other", "u1", "s1")).is_none());
    }

    #[test]
    fn test_remove_session() {
        let service = InMemorySessionService::new();
        let key = SessionKey::new("app", "u", "s");
        service.get_or_create(&key);
        service.append(&key, [ChatMessage::user("x")]);

        let removed = service.remove(&key).unwrap();
        assert_eq!(removed.history.len(), 1);
        assert!(service.is_empty());
        assert!(service.remove(&key).is_none());
    }

    #[test]
    fn test_append_to_unknown_session_is_ignored() {
        let service = InMemorySessionService::new();
        service.append(&SessionKey::new("app", "u", "s"), [ChatMessage::user("x")]);
        assert!(service.is_empty());
    }
}
