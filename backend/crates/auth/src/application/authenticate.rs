//! Authenticate Use Case
//!
//! Turns a presented access credential into an [`AuthIdentity`]:
//! verify the signed token, resolve its session, then apply the
//! account-state gate. Read-only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::jwt;
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::application::session_store::SessionStore;
use crate::domain::entity::identity::AuthIdentity;
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::{SessionId, UserId};
use crate::error::{AuthError, AuthResult};

pub const BEARER_PREFIX: &str = "Bearer ";

/// Claims of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub session_id: SessionId,
}

/// Claims of a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub session_id: SessionId,
}

/// Whether a route admits accounts with an unverified email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationPolicy {
    #[default]
    RequireVerified,
    AllowUnverified,
}

/// Pick the credential: the cookie wins, else `Authorization: Bearer <token>`.
pub fn extract_credential(cookie: Option<&str>, authorization: Option<&str>) -> AuthResult<String> {
    if let Some(token) = cookie.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    let header = authorization
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::MissingCredential)?;

    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty() && !token.contains(char::is_whitespace))
        .map(str::to_string)
        .ok_or(AuthError::InvalidCredentialScheme)
}

pub struct AuthenticateUseCase<S>
where
    S: SessionRepository,
{
    sessions: SessionStore<S>,
    config: Arc<AuthConfig>,
}

impl<S> AuthenticateUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionStore::new(session_repo, config.refresh_window()),
            config,
        }
    }

    pub async fn execute(&self, token: &str, policy: VerificationPolicy) -> AuthResult<AuthIdentity> {
        self.execute_at(token, policy, Utc::now()).await
    }

    pub async fn execute_at(
        &self,
        token: &str,
        policy: VerificationPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<AuthIdentity> {
        let claims: AccessClaims = jwt::verify_at(token, &self.config.token_secret, now)?;

        let identity = self
            .sessions
            .get_by_user_and_id_at(&claims.user_id, &claims.session_id, now)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if policy == VerificationPolicy::RequireVerified && !identity.user.is_email_verified() {
            return Err(AuthError::AccountUnverified {
                verification_sent: false,
            });
        }

        Ok(identity)
    }
}
