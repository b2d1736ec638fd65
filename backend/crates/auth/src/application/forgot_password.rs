//! Forgot Password Use Case
//!
//! Step one of the reset flow: mail a code to the account owner, then trade
//! that code for a short-lived reset token.
//!
//! The request step answers identically whether or not the account exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::application::token_cache::TokenCache;
use crate::domain::entity::ephemeral_token::TokenData;
use crate::domain::repository::{TtlStore, UserRepository};
use crate::domain::services::{EmailJob, EmailQueue, EmailTemplate};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Reset token handed out after a successful code check
#[derive(Debug, Clone)]
pub struct ResetGrant {
    pub reset_token: String,
    pub reset_token_expires_at: DateTime<Utc>,
}

pub struct ForgotPasswordUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    user_repo: Arc<U>,
    tokens: TokenCache<T>,
    mailer: Arc<dyn EmailQueue>,
    config: Arc<AuthConfig>,
}

impl<U, T> ForgotPasswordUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    pub fn new(
        user_repo: Arc<U>,
        token_store: Arc<T>,
        mailer: Arc<dyn EmailQueue>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            tokens: TokenCache::new(token_store),
            mailer,
            config,
        }
    }

    /// Mail a reset code if the account exists. Never fails.
    pub async fn request(&self, email: &Email) {
        if let Err(e) = self.try_request(email).await {
            tracing::error!(error = %e, "Forgot-password request failed");
        }
    }

    async fn try_request(&self, email: &Email) -> AuthResult<()> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            tracing::debug!("Forgot-password request for unknown email");
            return Ok(());
        };

        let code = self
            .tokens
            .create(
                user.user_id,
                user.email.as_str(),
                TokenData::VerifyForgotPassword {
                    email: user.email.as_str().to_string(),
                },
                Some(self.config.forgot_password_token_ttl),
            )
            .await?;

        let job = EmailJob::to_user(
            user.email.as_str(),
            &user.full_name(),
            "Reset your password",
            EmailTemplate::VerifyForgotPassword,
            code,
        );
        self.mailer
            .enqueue(job)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::info!(user_id = %user.user_id, "Password reset code sent");
        Ok(())
    }

    /// Trade a mailed code for a reset token. The code is spent on success.
    pub async fn verify_code(&self, code: &str) -> AuthResult<ResetGrant> {
        let token = self
            .tokens
            .verify(code)
            .await
            .ok_or(AuthError::InvalidEphemeralToken("unknown or expired"))?;

        let email = match token.data {
            TokenData::VerifyForgotPassword { email } => email,
            TokenData::VerifyEmail { .. } | TokenData::ResetPassword => {
                return Err(AuthError::InvalidEphemeralToken("not a forgot-password token"));
            }
        };

        let mut user = self
            .user_repo
            .find_by_email(&Email::from_db(email))
            .await?
            .filter(|user| user.user_id == token.user_id)
            .ok_or(AuthError::InvalidEphemeralToken("token does not match an account"))?;

        self.tokens
            .consume(code)
            .await
            .ok_or(AuthError::InvalidEphemeralToken("already used"))?;

        // Receiving the code proves ownership of the address.
        if !user.is_email_verified() {
            user.mark_email_verified();
            self.user_repo.update(&user).await?;
        }

        let grant = self
            .tokens
            .issue(
                user.user_id,
                user.email.as_str(),
                TokenData::ResetPassword,
                Some(self.config.reset_password_token_ttl),
            )
            .await?;

        tracing::info!(user_id = %user.user_id, "Password reset token issued");

        Ok(ResetGrant {
            reset_token: grant.key,
            reset_token_expires_at: grant.expires_at,
        })
    }
}
