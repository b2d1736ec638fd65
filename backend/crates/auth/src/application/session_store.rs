//! Session Store
//!
//! Sessions slide: once less than half of the refresh window remains, a
//! validation pushes `expires_at` out to a full window from now. Requests
//! in the first half of the window cause no writes.
//!
//! Expired sessions are deleted when `validate` finds them. The read path
//! used by the auth middleware only hides them.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entity::{
    identity::AuthIdentity,
    session::{Session, SessionSummary},
    user::UserClient,
};
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::{SessionId, UserId};
use crate::error::AuthResult;

/// Outcome of [`SessionStore::validate`]
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub session: Session,
    pub user: UserClient,
    /// `expires_at` was extended by this call
    pub refreshed: bool,
}

pub struct SessionStore<S>
where
    S: SessionRepository,
{
    repo: Arc<S>,
    refresh_window: chrono::Duration,
}

impl<S> SessionStore<S>
where
    S: SessionRepository,
{
    pub fn new(repo: Arc<S>, refresh_window: chrono::Duration) -> Self {
        Self {
            repo,
            refresh_window,
        }
    }

    pub async fn create(
        &self,
        user_id: UserId,
        user_agent: Option<String>,
        ip: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<Session> {
        let session = Session::new(user_id, user_agent, ip, expires_at, Utc::now());
        self.repo.insert_session(&session).await?;

        tracing::info!(
            user_id = %session.user_id,
            session_id = %session.id,
            expires_at = %expires_at,
            "Session created"
        );

        Ok(session)
    }

    pub async fn validate(&self, session_id: &SessionId) -> AuthResult<Option<ValidatedSession>> {
        self.validate_at(session_id, Utc::now()).await
    }

    /// [`validate`](Self::validate) against an explicit clock
    pub async fn validate_at(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<ValidatedSession>> {
        let Some((mut session, user)) = self.repo.find_session_with_user(session_id).await? else {
            return Ok(None);
        };

        if session.is_expired_at(now) {
            self.repo
                .delete_user_session(&session.id, &session.user_id)
                .await?;
            tracing::debug!(session_id = %session.id, "Expired session removed");
            return Ok(None);
        }

        let refreshed = session.needs_refresh_at(now, self.refresh_window);
        if refreshed {
            session.extend_at(now, self.refresh_window);
            if let Some(expires_at) = session.expires_at {
                self.repo
                    .update_session_expiry(&session.id, expires_at, now)
                    .await?;
                tracing::debug!(
                    session_id = %session.id,
                    expires_at = %expires_at,
                    "Session extended"
                );
            }
        }

        Ok(Some(ValidatedSession {
            session,
            user,
            refreshed,
        }))
    }

    /// Read-only lookup for the request path: never extends, never deletes.
    pub async fn get_by_user_and_id(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> AuthResult<Option<AuthIdentity>> {
        self.get_by_user_and_id_at(user_id, session_id, Utc::now())
            .await
    }

    pub async fn get_by_user_and_id_at(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<AuthIdentity>> {
        let found = self.repo.find_user_session(user_id, session_id).await?;

        Ok(found
            .filter(|(session, _)| !session.is_expired_at(now))
            .map(|(session, user)| AuthIdentity { user, session }))
    }

    /// Record activity. `expires_at` is left alone.
    pub async fn touch(&self, session_id: &SessionId, ip: Option<&str>) -> AuthResult<bool> {
        self.repo.touch_session(session_id, ip, Utc::now()).await
    }

    /// Live sessions of `user_id`, newest first
    pub async fn list(
        &self,
        user_id: &UserId,
        current: Option<&SessionId>,
    ) -> AuthResult<Vec<SessionSummary>> {
        let now = Utc::now();
        let sessions = self.repo.list_user_sessions(user_id).await?;

        Ok(sessions
            .iter()
            .filter(|session| !session.is_expired_at(now))
            .map(|session| session.summary(current))
            .collect())
    }

    /// Delete only when `user_id` owns the session.
    pub async fn delete(&self, session_id: &SessionId, user_id: &UserId) -> AuthResult<bool> {
        let deleted = self.repo.delete_user_session(session_id, user_id).await?;
        if deleted {
            tracing::info!(user_id = %user_id, session_id = %session_id, "Session deleted");
        }
        Ok(deleted)
    }
}
