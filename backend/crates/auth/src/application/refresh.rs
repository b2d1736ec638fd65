//! Refresh Use Case
//!
//! Exchanges a refresh token for a new access token. A new refresh token is
//! only minted when the session itself was extended.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::application::issue_tokens::{IssuedTokens, TokenIssuer};
use crate::application::session_store::SessionStore;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionRepository;
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
pub struct RefreshOutput {
    pub session: Session,
    pub tokens: IssuedTokens,
}

pub struct RefreshUseCase<S>
where
    S: SessionRepository,
{
    sessions: SessionStore<S>,
    issuer: TokenIssuer,
}

impl<S> RefreshUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionStore::new(session_repo, config.refresh_window()),
            issuer: TokenIssuer::new(config),
        }
    }

    pub async fn execute(&self, refresh_token: &str, ip: Option<&str>) -> AuthResult<RefreshOutput> {
        self.execute_at(refresh_token, ip, Utc::now()).await
    }

    /// [`execute`](Self::execute) with the session clock pinned
    pub async fn execute_at(
        &self,
        refresh_token: &str,
        ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<RefreshOutput> {
        let claims = self.issuer.verify_refresh_at(refresh_token, now)?;

        let validated = self
            .sessions
            .validate_at(&claims.session_id, now)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        self.sessions.touch(&validated.session.id, ip).await?;

        let tokens = self.issuer.issue(&validated.session, validated.refreshed)?;

        tracing::info!(
            user_id = %validated.session.user_id,
            session_id = %validated.session.id,
            refreshed = validated.refreshed,
            "Access token refreshed"
        );

        Ok(RefreshOutput {
            session: validated.session,
            tokens,
        })
    }
}
