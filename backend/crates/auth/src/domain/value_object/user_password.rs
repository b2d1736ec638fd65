//! User Password Value Objects
//!
//! Clear text passwords as they arrive from clients, and the stored
//! `(hash, salt)` pair. Cryptography lives in `platform::password`.

use platform::password::{ClearTextPassword, PasswordPolicyError};
use std::fmt;

use crate::error::{AuthError, AuthResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Policy-checked password from user input, zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Apply the password policy, reporting violations against `field`.
    pub fn new(raw: String, field: &'static str) -> AuthResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| {
            let message = match e {
                PasswordPolicyError::TooShort { min, .. } => {
                    format!("password must be at least {min} characters")
                }
                PasswordPolicyError::TooLong { max, .. } => {
                    format!("password must be at most {max} characters")
                }
                PasswordPolicyError::EmptyOrWhitespace => "password cannot be empty".to_string(),
                PasswordPolicyError::InvalidCharacter => {
                    "password contains invalid characters".to_string()
                }
            };
            AuthError::invalid_field(field, message)
        })?;

        Ok(Self(clear_text))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// Stored Credentials
// ============================================================================

/// Stored password material: PHC hash string plus the base64 per-user salt.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordCredentials {
    pub hash: String,
    pub salt: String,
}

impl PasswordCredentials {
    pub fn new(hash: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            salt: salt.into(),
        }
    }

    /// Both columns are nullable; an account has a password only when both are set.
    pub fn from_db(hash: Option<String>, salt: Option<String>) -> Option<Self> {
        match (hash, salt) {
            (Some(hash), Some(salt)) => Some(Self { hash, salt }),
            _ => None,
        }
    }
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("hash", &"[HASH]")
            .field("salt", &"[SALT]")
            .finish()
    }
}
