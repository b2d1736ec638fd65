//! Ephemeral Tokens
//!
//! Single-use, TTL-bound payloads behind an unguessable key. Used for the
//! out-of-band flows (email verification, password reset).

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::domain::value_object::UserId;

/// Per-flow payload, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenData {
    VerifyEmail { email: String },
    VerifyForgotPassword { email: String },
    ResetPassword,
}

impl TokenData {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenData::VerifyEmail { .. } => TokenKind::VerifyEmail,
            TokenData::VerifyForgotPassword { .. } => TokenKind::VerifyForgotPassword,
            TokenData::ResetPassword => TokenKind::ResetPassword,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TokenKind {
    #[display("verify_email")]
    VerifyEmail,
    #[display("verify_forgot_password")]
    VerifyForgotPassword,
    #[display("reset_password")]
    ResetPassword,
}

/// What the TTL store holds under a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralToken {
    pub user_id: UserId,
    pub email: String,
    pub data: TokenData,
    pub expires_at: DateTime<Utc>,
}

impl EphemeralToken {
    pub fn kind(&self) -> TokenKind {
        self.data.kind()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let token = EphemeralToken {
            user_id: UserId::new(),
            email: "ada@example.com".into(),
            data: TokenData::VerifyEmail {
                email: "ada@example.com".into(),
            },
            expires_at: Utc::now(),
        };

        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["data"]["kind"], "verify_email");
        assert_eq!(json["data"]["email"], "ada@example.com");

        let back: EphemeralToken = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_unit_variant_serializes_with_tag_only() {
        let json = serde_json::to_value(TokenData::ResetPassword).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "reset_password" }));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TokenKind::VerifyForgotPassword.to_string(), "verify_forgot_password");
        assert_eq!(
            TokenData::ResetPassword.kind(),
            TokenKind::ResetPassword
        );
    }
}
