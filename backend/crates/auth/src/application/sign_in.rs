//! Sign In Use Case
//!
//! Authenticates a user and creates a session.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::issue_tokens::{IssuedTokens, TokenIssuer};
use crate::application::session_store::SessionStore;
use crate::application::token_cache::TokenCache;
use crate::application::verify_email::send_verification_email;
use crate::domain::entity::{session::Session, user::UserClient};
use crate::domain::repository::{SessionRepository, TtlStore, UserRepository};
use crate::domain::services::{EmailQueue, PasswordHashing};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: Email,
    /// Unvalidated: any stored password must still be accepted
    pub password: String,
    pub client: ClientInfo,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub user: UserClient,
    pub session: Session,
    pub tokens: IssuedTokens,
}

/// Sign in use case
pub struct SignInUseCase<U, S, T>
where
    U: UserRepository,
    S: SessionRepository,
    T: TtlStore,
{
    user_repo: Arc<U>,
    sessions: SessionStore<S>,
    tokens: TokenCache<T>,
    hasher: Arc<dyn PasswordHashing>,
    mailer: Arc<dyn EmailQueue>,
    config: Arc<AuthConfig>,
}

impl<U, S, T> SignInUseCase<U, S, T>
where
    U: UserRepository,
    S: SessionRepository,
    T: TtlStore,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        token_store: Arc<T>,
        hasher: Arc<dyn PasswordHashing>,
        mailer: Arc<dyn EmailQueue>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            sessions: SessionStore::new(session_repo, config.refresh_window()),
            tokens: TokenCache::new(token_store),
            hasher,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let mut user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let credentials = user.credentials.as_ref().ok_or(AuthError::AccountNotFound)?;
        if !self.hasher.verify(&input.password, credentials) {
            return Err(AuthError::CredentialMismatch);
        }

        if !user.is_email_verified() {
            send_verification_email(&self.tokens, self.mailer.as_ref(), &self.config, &user)
                .await?;
            return Err(AuthError::AccountUnverified {
                verification_sent: true,
            });
        }

        user.record_login();
        self.user_repo.update(&user).await?;

        let ClientInfo { ip, user_agent } = input.client;
        let expires_at = Utc::now()
            .checked_add_signed(self.config.session_lifetime())
            .ok_or_else(|| AuthError::Internal("session lifetime out of range".into()))?;
        let session = self
            .sessions
            .create(
                user.user_id,
                user_agent,
                ip.map(|ip| ip.to_string()),
                expires_at,
            )
            .await?;

        let tokens = TokenIssuer::new(self.config.clone()).issue(&session, true)?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.id,
            "User signed in"
        );

        Ok(SignInOutput {
            user: user.to_client(),
            session,
            tokens,
        })
    }
}
