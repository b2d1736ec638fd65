//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the
//! infrastructure layer. Method names are unique across traits so one
//! adapter can implement all of them without call-site ambiguity.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::entity::{
    session::Session,
    user::{User, UserClient},
};
use crate::domain::value_object::{SessionId, UserId, email::Email};
use crate::error::AuthResult;

/// User directory
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;
}

/// Durable session records
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn insert_session(&self, session: &Session) -> AuthResult<()>;

    /// Session joined with its owner's client projection
    async fn find_session_with_user(
        &self,
        session_id: &SessionId,
    ) -> AuthResult<Option<(Session, UserClient)>>;

    /// Same as [`find_session_with_user`](LocalSessionRepository::find_session_with_user)
    /// but only when `user_id` owns the session
    async fn find_user_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> AuthResult<Option<(Session, UserClient)>>;

    async fn update_session_expiry(
        &self,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Set `last_activity_at`, and `ip` when given. Returns whether the row exists.
    async fn touch_session(
        &self,
        session_id: &SessionId,
        ip: Option<&str>,
        at: DateTime<Utc>,
    ) -> AuthResult<bool>;

    /// All sessions of a user, newest first, expired ones included
    async fn list_user_sessions(&self, user_id: &UserId) -> AuthResult<Vec<Session>>;

    /// Delete only if `user_id` owns the session
    async fn delete_user_session(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> AuthResult<bool>;
}

/// Key-value store with per-entry expiry
#[trait_variant::make(TtlStore: Send)]
pub trait LocalTtlStore {
    /// Insert or overwrite; the entry disappears after `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> AuthResult<()>;

    /// Live value, if any
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Returns whether a live entry was removed
    async fn delete(&self, key: &str) -> AuthResult<bool>;

    /// Atomic get-and-delete. Of concurrent callers, at most one gets `Some`.
    async fn take(&self, key: &str) -> AuthResult<Option<String>>;
}
