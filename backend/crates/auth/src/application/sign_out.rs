//! Sign Out Use Case
//!
//! Ends the caller's current session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::domain::entity::identity::AuthIdentity;
use crate::domain::repository::SessionRepository;
use crate::error::AuthResult;

pub struct SignOutUseCase<S>
where
    S: SessionRepository,
{
    sessions: SessionStore<S>,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionStore::new(session_repo, config.refresh_window()),
        }
    }

    /// Returns whether a session was deleted.
    pub async fn execute(&self, identity: &AuthIdentity) -> AuthResult<bool> {
        let deleted = self
            .sessions
            .delete(&identity.session.id, &identity.user.id)
            .await?;

        tracing::info!(
            user_id = %identity.user.id,
            session_id = %identity.session.id,
            "User signed out"
        );

        Ok(deleted)
    }
}
