//! Application Layer
//!
//! Use cases and application services.

pub mod authenticate;
pub mod config;
pub mod forgot_password;
pub mod issue_tokens;
pub mod refresh;
pub mod reset_password;
pub mod session_store;
pub mod sessions;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod token_cache;
pub mod verify_email;

// Re-exports
pub use authenticate::{
    AccessClaims, AuthenticateUseCase, RefreshClaims, VerificationPolicy, extract_credential,
};
pub use config::AuthConfig;
pub use forgot_password::{ForgotPasswordUseCase, ResetGrant};
pub use issue_tokens::{IssuedTokens, TokenIssuer};
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use reset_password::{ResetPasswordInput, ResetPasswordUseCase};
pub use session_store::{SessionStore, ValidatedSession};
pub use sessions::ManageSessionsUseCase;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
pub use token_cache::{EphemeralGrant, TokenCache};
pub use verify_email::VerifyEmailUseCase;
