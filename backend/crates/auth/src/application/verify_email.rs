//! Verify Email Use Case
//!
//! Confirms address ownership with the code mailed at sign-up (or at a
//! sign-in attempt on an unverified account).

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_cache::TokenCache;
use crate::domain::entity::ephemeral_token::TokenData;
use crate::domain::entity::user::{User, UserClient};
use crate::domain::repository::{TtlStore, UserRepository};
use crate::domain::services::{EmailJob, EmailQueue, EmailTemplate};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Issue a verify-email code and queue the mail carrying it.
///
/// Queue failures are logged; the code stays valid either way.
pub(crate) async fn send_verification_email<T>(
    tokens: &TokenCache<T>,
    mailer: &dyn EmailQueue,
    config: &AuthConfig,
    user: &User,
) -> AuthResult<()>
where
    T: TtlStore,
{
    let email = user.email.as_str();
    let code = tokens
        .create(
            user.user_id,
            email,
            TokenData::VerifyEmail {
                email: email.to_string(),
            },
            Some(config.ephemeral_token_ttl),
        )
        .await?;

    let job = EmailJob::to_user(
        email,
        &user.full_name(),
        "Verify your email",
        EmailTemplate::VerifyUserEmail,
        code,
    );
    if let Err(e) = mailer.enqueue(job) {
        tracing::error!(error = %e, user_id = %user.user_id, "Failed to queue verification email");
    }

    Ok(())
}

pub struct VerifyEmailUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    user_repo: Arc<U>,
    tokens: TokenCache<T>,
}

impl<U, T> VerifyEmailUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    pub fn new(user_repo: Arc<U>, token_store: Arc<T>) -> Self {
        Self {
            user_repo,
            tokens: TokenCache::new(token_store),
        }
    }

    pub async fn execute(&self, code: &str) -> AuthResult<UserClient> {
        // Kind check first, so a foreign code is not burned here.
        let peeked = self
            .tokens
            .verify(code)
            .await
            .ok_or(AuthError::InvalidEphemeralToken("unknown or expired"))?;
        if !matches!(peeked.data, TokenData::VerifyEmail { .. }) {
            return Err(AuthError::InvalidEphemeralToken("not a verify-email token"));
        }

        let token = self
            .tokens
            .consume(code)
            .await
            .ok_or(AuthError::InvalidEphemeralToken("unknown or expired"))?;
        let TokenData::VerifyEmail { email } = token.data else {
            return Err(AuthError::InvalidEphemeralToken("not a verify-email token"));
        };

        let mut user = self
            .user_repo
            .find_by_email(&Email::from_db(email))
            .await?
            .filter(|user| user.user_id == token.user_id)
            .ok_or(AuthError::InvalidEphemeralToken("token does not match an account"))?;

        if user.is_email_verified() {
            return Err(AuthError::AlreadyVerified);
        }

        user.mark_email_verified();
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Email verified");

        Ok(user.to_client())
    }
}
