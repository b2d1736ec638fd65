//! API DTOs (Data Transfer Objects)
//!
//! Request bodies carry their own field rules through [`Validate`]; value
//! objects built from them in the handlers apply the domain policy on top.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{IssuedTokens, ResetGrant};
use crate::domain::entity::session::SessionSummary;
use crate::domain::value_object::email::Email;
use crate::error::FieldError;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_CODE_LENGTH: usize = 255;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_RESET_TOKEN_LENGTH: usize = 12;

/// Same body whether or not the account exists
pub const FORGOT_PASSWORD_ACK: &str =
    "You will received a mail containing your reset link if we found your account";

/// Field-level request checks, run by `ValidatedJson` after deserializing
pub trait Validate {
    /// Every violated rule; empty when the body is acceptable
    fn validate(&self) -> Vec<FieldError>;
}

// ============================================================================
// Rule Helpers
// ============================================================================

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    max: Option<usize>,
) {
    let len = value.chars().count();
    if len < min {
        let message = if min == 1 {
            format!("{field} is required")
        } else {
            format!("{field} must be at least {min} characters")
        };
        errors.push(FieldError::new(field, message));
    } else if let Some(max) = max.filter(|max| len > *max) {
        errors.push(FieldError::new(
            field,
            format!("{field} must be at most {max} characters"),
        ));
    }
}

fn check_email(errors: &mut Vec<FieldError>, value: &str) {
    if Email::new(value).is_err() {
        errors.push(FieldError::new("email", "invalid email"));
    }
}

// ============================================================================
// Sign Up
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_length(&mut errors, "first_name", self.first_name.trim(), 1, Some(MAX_NAME_LENGTH));
        check_length(&mut errors, "last_name", self.last_name.trim(), 1, Some(MAX_NAME_LENGTH));
        check_email(&mut errors, &self.email);
        check_length(&mut errors, "password", &self.password, MIN_PASSWORD_LENGTH, None);
        if self.confirm_password != self.password {
            errors.push(FieldError::new("confirm_password", "password not a match"));
        }
        errors
    }
}

// ============================================================================
// Sign In
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl Validate for SignInRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&mut errors, &self.email);
        check_length(&mut errors, "password", &self.password, 1, None);
        errors
    }
}

// ============================================================================
// Refresh
// ============================================================================

/// Optional body of `POST /refresh`; the cookie is the fallback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

impl Validate for RefreshRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(token) = &self.refresh_token {
            check_length(&mut errors, "refresh_token", token, 1, None);
        }
        errors
    }
}

// ============================================================================
// Email Verification and Password Recovery
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailRequest {
    pub code: String,
}

impl Validate for VerifyEmailRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_length(&mut errors, "code", &self.code, 1, Some(MAX_CODE_LENGTH));
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&mut errors, &self.email);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyForgotPasswordRequest {
    pub token: String,
}

impl Validate for VerifyForgotPasswordRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_length(&mut errors, "token", &self.token, MIN_RESET_TOKEN_LENGTH, None);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_length(&mut errors, "token", &self.token, MIN_RESET_TOKEN_LENGTH, None);
        check_length(&mut errors, "password", &self.password, MIN_PASSWORD_LENGTH, None);
        errors
    }
}

// ============================================================================
// Responses
// ============================================================================

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Issued credentials, mirrored into cookies by the handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub access_token_expires_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_at: Option<String>,
}

impl From<&IssuedTokens> for AuthResponse {
    fn from(tokens: &IssuedTokens) -> Self {
        Self {
            access_token: tokens.access.token.clone(),
            access_token_expires_at: rfc3339(tokens.access.expires_at),
            refresh_token: tokens.refresh.as_ref().map(|r| r.token.clone()),
            refresh_token_expires_at: tokens.refresh.as_ref().map(|r| rfc3339(r.expires_at)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetGrantResponse {
    pub reset_token: String,
    pub reset_token_expires_at: String,
}

impl From<ResetGrant> for ResetGrantResponse {
    fn from(grant: ResetGrant) -> Self {
        Self {
            reset_token: grant.reset_token,
            reset_token_expires_at: rfc3339(grant.reset_token_expires_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}


#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up() -> SignUpRequest {
        SignUpRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "correct horse".into(),
            confirm_password: "correct horse".into(),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_ref()).collect()
    }

    #[test]
    fn test_valid_sign_up() {
        assert!(sign_up().validate().is_empty());
    }

    #[test]
    fn test_sign_up_collects_every_violation() {
        let req = SignUpRequest {
            first_name: "  ".into(),
            last_name: "x".repeat(MAX_NAME_LENGTH + 1),
            email: "not-an-email".into(),
            password: "short".into(),
            confirm_password: "different".into(),
        };
        assert_eq!(
            fields(&req.validate()),
            ["first_name", "last_name", "email", "password", "confirm_password"]
        );
    }

    #[test]
    fn test_confirm_password_message() {
        let req = SignUpRequest {
            confirm_password: "another horse".into(),
            ..sign_up()
        };
        let errors = req.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "password not a match");
    }

    #[test]
    fn test_reset_token_minimum() {
        let req = VerifyForgotPasswordRequest {
            token: "elevenchars".into(),
        };
        assert_eq!(fields(&req.validate()), ["token"]);
    }

    #[test]
    fn test_empty_refresh_token_rejected_but_absent_allowed() {
        assert!(RefreshRequest::default().validate().is_empty());
        let req = RefreshRequest {
            refresh_token: Some(String::new()),
        };
        assert_eq!(fields(&req.validate()), ["refresh_token"]);
    }

    #[test]
    fn test_rfc3339_is_utc_with_z() {
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(rfc3339(at), "2026-01-02T03:04:05.000Z");
    }
}
