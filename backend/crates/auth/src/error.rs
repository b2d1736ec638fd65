//! Auth Error Types
//!
//! Every failure the auth pipeline and the credential flows can produce.
//! Each variant maps to exactly one status, client message and optional
//! machine code; the internal detail stays in the log.

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::jwt::TokenError;
use serde::Serialize;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Cow<'static, str>,
    pub message: Cow<'static, str>,
}

impl FieldError {
    pub fn new(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Neither the access cookie nor an Authorization header was sent
    #[error("no access credential presented")]
    MissingCredential,

    /// Authorization header present but not `Bearer <token>`
    #[error("authorization header is not a bearer credential")]
    InvalidCredentialScheme,

    #[error("signed token rejected")]
    InvalidSignature,

    #[error("signed token expired")]
    ExpiredToken,

    /// Token verified but its session is gone or dead
    #[error("session not found or expired")]
    SessionNotFound,

    #[error("email address not verified (verification sent: {verification_sent})")]
    AccountUnverified { verification_sent: bool },

    /// Unknown email, or an account without a password
    #[error("no account for the given credentials")]
    AccountNotFound,

    #[error("password mismatch")]
    CredentialMismatch,

    /// Ephemeral token absent, expired, consumed, of the wrong kind, or
    /// pointing at a different user
    #[error("ephemeral token invalid: {0}")]
    InvalidEphemeralToken(&'static str),

    #[error("ephemeral token store failure: {0}")]
    TokenStoreFault(String),

    #[error("request validation failed ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("refresh token missing from body and cookie")]
    MissingRefreshToken,

    #[error("email address already registered")]
    EmailTaken,

    #[error("email address already verified")]
    AlreadyVerified,

    #[error("new password equals the current one")]
    PasswordReused,

    /// Session to revoke does not exist or is not the caller's
    #[error("no such session for this user")]
    UnknownSession,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Validation failure for a single field
    pub fn invalid_field(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        AuthError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingCredential
            | AuthError::InvalidCredentialScheme
            | AuthError::InvalidSignature
            | AuthError::ExpiredToken
            | AuthError::SessionNotFound
            | AuthError::InvalidEphemeralToken(_) => ErrorKind::Unauthorized,
            AuthError::AccountUnverified { .. }
            | AuthError::AlreadyVerified
            | AuthError::PasswordReused => ErrorKind::Forbidden,
            AuthError::AccountNotFound
            | AuthError::CredentialMismatch
            | AuthError::UnknownSession => ErrorKind::NotFound,
            AuthError::Validation(_) | AuthError::MissingRefreshToken => ErrorKind::BadRequest,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::TokenStoreFault(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Machine-readable code for clients that branch on the failure
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AuthError::AccountUnverified { .. } => Some("AUTH_USER_NOT_VERIFIED"),
            AuthError::AccountNotFound | AuthError::CredentialMismatch => {
                Some("AUTH_USER_NOT_FOUND")
            }
            AuthError::EmailTaken => Some("AUTH_EMAIL_ALREADY_EXISTS"),
            AuthError::AlreadyVerified => Some("AUTH_USER_ALREADY_VERIFIED"),
            AuthError::PasswordReused => Some("AUTH_PASSWORD_REUSED"),
            AuthError::Validation(_) => Some("VALIDATION_ERROR"),
            _ => None,
        }
    }

    /// The message clients see. Never carries internal detail.
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing authentication token",
            AuthError::InvalidCredentialScheme => {
                "invalid authentication type, use a Bearer token"
            }
            // indistinguishable on purpose
            AuthError::InvalidSignature | AuthError::ExpiredToken | AuthError::SessionNotFound => {
                "unauthorized"
            }
            AuthError::AccountUnverified {
                verification_sent: true,
            } => {
                "Please verify your email address. We've sent a verification link to your email address."
            }
            AuthError::AccountUnverified {
                verification_sent: false,
            } => "email not verified",
            AuthError::AccountNotFound | AuthError::CredentialMismatch => "invalid credentials",
            AuthError::InvalidEphemeralToken(_) => "invalid or expired token",
            AuthError::Validation(_) => "invalid request body",
            AuthError::MissingRefreshToken => "missing refresh token",
            AuthError::EmailTaken => "email not available",
            AuthError::AlreadyVerified => "user verified already",
            AuthError::PasswordReused => {
                "The new password must be different from the old password."
            }
            AuthError::UnknownSession => "session not found",
            AuthError::TokenStoreFault(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                "An unexpected error occurred. Please try again later."
            }
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let mut err = AppError::new(self.kind(), self.client_message());
        if let Some(code) = self.code() {
            err = err.with_code(code);
        }
        if let AuthError::Validation(fields) = self {
            err = err.with_details(field_errors_json(fields));
        }
        err
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::TokenStoreFault(msg) => {
                tracing::error!(message = %msg, "Ephemeral token store failure");
            }
            AuthError::CredentialMismatch => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidSignature => {
                tracing::warn!("Rejected forged or malformed access token");
            }
            AuthError::InvalidEphemeralToken(reason) => {
                tracing::warn!(reason, "Rejected ephemeral token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

/// `{ "field": ["message", ...] }`
fn field_errors_json(fields: &[FieldError]) -> serde_json::Value {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for f in fields {
        grouped
            .entry(f.field.as_ref())
            .or_default()
            .push(f.message.as_ref());
    }
    serde_json::json!(grouped)
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthError::InvalidSignature,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::Signing(reason) => AuthError::Internal(format!("token signing: {reason}")),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
