//! Reset Password Use Case
//!
//! Final step of the reset flow: a reset token plus a new password.

use std::sync::Arc;

use crate::application::token_cache::TokenCache;
use crate::domain::entity::ephemeral_token::TokenData;
use crate::domain::repository::{TtlStore, UserRepository};
use crate::domain::services::PasswordHashing;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct ResetPasswordInput {
    pub token: String,
    pub new_password: RawPassword,
}

pub struct ResetPasswordUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    user_repo: Arc<U>,
    tokens: TokenCache<T>,
    hasher: Arc<dyn PasswordHashing>,
}

impl<U, T> ResetPasswordUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    pub fn new(user_repo: Arc<U>, token_store: Arc<T>, hasher: Arc<dyn PasswordHashing>) -> Self {
        Self {
            user_repo,
            tokens: TokenCache::new(token_store),
            hasher,
        }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<()> {
        let token = self
            .tokens
            .verify(&input.token)
            .await
            .ok_or(AuthError::InvalidEphemeralToken("unknown or expired"))?;

        match token.data {
            TokenData::ResetPassword => {}
            TokenData::VerifyEmail { .. } | TokenData::VerifyForgotPassword { .. } => {
                return Err(AuthError::InvalidEphemeralToken("not a reset token"));
            }
        }

        let mut user = self
            .user_repo
            .find_by_email(&Email::from_db(token.email))
            .await?
            .filter(|user| user.user_id == token.user_id)
            .ok_or(AuthError::InvalidEphemeralToken("token does not match an account"))?;

        let reused = user.credentials.as_ref().is_some_and(|current| {
            self.hasher
                .verify(input.new_password.expose_secret(), current)
        });
        if reused {
            return Err(AuthError::PasswordReused);
        }

        let credentials = self.hasher.hash(&input.new_password)?;

        self.tokens
            .consume(&input.token)
            .await
            .ok_or(AuthError::InvalidEphemeralToken("already used"))?;

        user.set_credentials(credentials);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password reset");
        Ok(())
    }
}
