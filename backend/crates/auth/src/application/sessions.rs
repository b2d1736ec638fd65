//! Session Self-Service
//!
//! Lets a signed-in user see and revoke their own sessions.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::domain::entity::{identity::AuthIdentity, session::SessionSummary};
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::SessionId;
use crate::error::{AuthError, AuthResult};

pub struct ManageSessionsUseCase<S>
where
    S: SessionRepository,
{
    sessions: SessionStore<S>,
}

impl<S> ManageSessionsUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionStore::new(session_repo, config.refresh_window()),
        }
    }

    pub async fn list(&self, identity: &AuthIdentity) -> AuthResult<Vec<SessionSummary>> {
        self.sessions
            .list(&identity.user.id, Some(&identity.session.id))
            .await
    }

    /// Revoke one of the caller's sessions, possibly the current one.
    pub async fn revoke(&self, identity: &AuthIdentity, session_id: &SessionId) -> AuthResult<()> {
        if !self.sessions.delete(session_id, &identity.user.id).await? {
            return Err(AuthError::UnknownSession);
        }
        Ok(())
    }
}
