//! In-Memory Repository
//!
//! Users, sessions and TTL entries behind one `tokio` RwLock. Used by tests
//! and by local runs without a database.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::{
    session::Session,
    user::{User, UserClient},
};
use crate::domain::repository::{SessionRepository, TtlStore, UserRepository};
use crate::domain::value_object::{SessionId, UserId, email::Email};
use crate::error::{AuthError, AuthResult};

struct TtlEntry {
    value: String,
    expires_at: Instant,
}

impl TtlEntry {
    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, Session>,
    entries: HashMap<String, TtlEntry>,
}

impl State {
    fn with_user(&self, session: &Session) -> Option<(Session, UserClient)> {
        self.users
            .get(&session.user_id)
            .map(|user| (session.clone(), user.to_client()))
    }
}

#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<RwLock<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw session row, expired or not
    pub async fn session(&self, session_id: &SessionId) -> Option<Session> {
        self.state.read().await.sessions.get(session_id).cloned()
    }

    /// Overwrite a session row as-is
    pub async fn put_session(&self, session: Session) {
        self.state
            .write()
            .await
            .sessions
            .insert(session.id, session);
    }

    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Stored TTL entries, lapsed ones included
    pub async fn token_count(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for MemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        state.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.as_str().eq_ignore_ascii_case(email.as_str()))
            .cloned())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.users.get_mut(&user.user_id) {
            *existing = user.clone();
        }
        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for MemoryAuthRepository {
    async fn insert_session(&self, session: &Session) -> AuthResult<()> {
        self.state
            .write()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(())
    }

    async fn find_session_with_user(
        &self,
        session_id: &SessionId,
    ) -> AuthResult<Option<(Session, UserClient)>> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .get(session_id)
            .and_then(|session| state.with_user(session)))
    }

    async fn find_user_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> AuthResult<Option<(Session, UserClient)>> {
        let state = self.state.read().await;
        Ok(state
            .sessions
            .get(session_id)
            .filter(|session| session.user_id == *user_id)
            .and_then(|session| state.with_user(session)))
    }

    async fn update_session_expiry(
        &self,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if let Some(session) = state.sessions.get_mut(session_id) {
            session.expires_at = Some(expires_at);
            session.updated_at = updated_at;
        }
        Ok(())
    }

    async fn touch_session(
        &self,
        session_id: &SessionId,
        ip: Option<&str>,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut state = self.state.write().await;
        Ok(match state.sessions.get_mut(session_id) {
            Some(session) => {
                session.touch_at(at, ip.map(str::to_string));
                true
            }
            None => false,
        })
    }

    async fn list_user_sessions(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let state = self.state.read().await;
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|session| session.user_id == *user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn delete_user_session(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> AuthResult<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .sessions
            .get(session_id)
            .is_some_and(|session| session.user_id == *user_id);
        if owned {
            state.sessions.remove(session_id);
        }
        Ok(owned)
    }
}

// ============================================================================
// TTL Store Implementation
// ============================================================================

impl TtlStore for MemoryAuthRepository {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> AuthResult<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| AuthError::TokenStoreFault(format!("ttl out of range: {ttl:?}")))?;
        self.state
            .write()
            .await
            .entries
            .insert(key.to_string(), TtlEntry { value, expires_at });
        Ok(())
    }

    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let mut state = self.state.write().await;
        match state.entries.get(key) {
            Some(entry) if entry.is_live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                state.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> AuthResult<bool> {
        let removed = self.state.write().await.entries.remove(key);
        Ok(removed.is_some_and(|entry| entry.is_live()))
    }

    async fn take(&self, key: &str) -> AuthResult<Option<String>> {
        let removed = self.state.write().await.entries.remove(key);
        Ok(removed
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value))
    }
}
