//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and service ports
//! - `application/` - Use cases, token cache, session store
//! - `infra/` - PostgreSQL and in-memory stores, Argon2, email queue
//! - `presentation/` - HTTP handlers, DTOs, extractors, router
//!
//! ## Features
//! - Email + password sign-up with email verification
//! - Stateless HS256 access tokens bound to server-side sessions
//! - Sliding session refresh: refresh tokens are reissued only when the
//!   session is extended
//! - Single-use ephemeral codes for email verification and password reset
//! - Session self-service (list, revoke)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, keyed by a per-user random salt
//! - Access cookie preferred over `Authorization: Bearer`
//! - Signature, expiry and missing-session failures are indistinguishable
//!   to clients
//! - Password-reset codes are consumed atomically

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{
    Argon2PasswordHasher, ChannelEmailQueue, MemoryAuthRepository, PgAuthRepository,
    RecordingEmailQueue, spawn_email_worker,
};
pub use presentation::{AuthAppState, auth_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
