//! Sign Up Use Case
//!
//! Creates a new, unverified account and mails its verification code.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_cache::TokenCache;
use crate::application::verify_email::send_verification_email;
use crate::domain::entity::user::User;
use crate::domain::repository::{TtlStore, UserRepository};
use crate::domain::services::{EmailQueue, PasswordHashing};
use crate::domain::value_object::{UserId, email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Sign up input
#[derive(Debug)]
pub struct SignUpInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: RawPassword,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user_id: UserId,
}

/// Sign up use case
pub struct SignUpUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    user_repo: Arc<U>,
    tokens: TokenCache<T>,
    hasher: Arc<dyn PasswordHashing>,
    mailer: Arc<dyn EmailQueue>,
    config: Arc<AuthConfig>,
}

impl<U, T> SignUpUseCase<U, T>
where
    U: UserRepository,
    T: TtlStore,
{
    pub fn new(
        user_repo: Arc<U>,
        token_store: Arc<T>,
        hasher: Arc<dyn PasswordHashing>,
        mailer: Arc<dyn EmailQueue>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            tokens: TokenCache::new(token_store),
            hasher,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let credentials = self.hasher.hash(&input.password)?;
        let user = User::new(input.first_name, input.last_name, input.email, credentials);

        // A concurrent sign-up with the same email surfaces as EmailTaken here.
        self.user_repo.create(&user).await?;

        send_verification_email(&self.tokens, self.mailer.as_ref(), &self.config, &user).await?;

        tracing::info!(user_id = %user.user_id, "User signed up");

        Ok(SignUpOutput {
            user_id: user.user_id,
        })
    }
}
