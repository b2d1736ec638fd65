//! Token Issuer
//!
//! Signs access and refresh tokens for a session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::jwt::{self, SignedToken};

use crate::application::authenticate::{AccessClaims, RefreshClaims};
use crate::application::config::AuthConfig;
use crate::domain::entity::session::Session;
use crate::error::AuthResult;

/// Tokens handed to the client after login or refresh
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access: SignedToken,
    /// Only on login, and on refreshes that extended the session
    pub refresh: Option<SignedToken>,
}

pub struct TokenIssuer {
    config: Arc<AuthConfig>,
}

impl TokenIssuer {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    pub fn issue(&self, session: &Session, with_refresh: bool) -> AuthResult<IssuedTokens> {
        let access = jwt::sign(
            &AccessClaims {
                user_id: session.user_id,
                session_id: session.id,
            },
            &self.config.token_secret,
            self.config.access_token_ttl,
            self.config.issuer(),
        )?;

        let refresh = if with_refresh {
            Some(jwt::sign(
                &RefreshClaims {
                    session_id: session.id,
                },
                &self.config.token_secret,
                self.config.refresh_token_ttl,
                self.config.issuer(),
            )?)
        } else {
            None
        };

        Ok(IssuedTokens { access, refresh })
    }

    pub fn verify_refresh_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<RefreshClaims> {
        Ok(jwt::verify_at(token, &self.config.token_secret, now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::UserId;

    fn session() -> Session {
        let now = Utc::now();
        Session::new(UserId::new(), None, None, now + chrono::Duration::days(30), now)
    }

    #[test]
    fn test_access_only() {
        let issuer = TokenIssuer::new(Arc::new(AuthConfig::development()));
        let tokens = issuer.issue(&session(), false).unwrap();
        assert!(tokens.refresh.is_none());
        assert_eq!(tokens.access.expires_in.as_secs(), 900);
    }

    #[test]
    fn test_refresh_claims_carry_session_only() {
        let config = Arc::new(AuthConfig::development());
        let issuer = TokenIssuer::new(config.clone());
        let session = session();
        let tokens = issuer.issue(&session, true).unwrap();
        let refresh = tokens.refresh.unwrap();

        let claims = issuer.verify_refresh_at(&refresh.token, Utc::now()).unwrap();
        assert_eq!(claims.session_id, session.id);

        let raw: serde_json::Map<String, serde_json::Value> =
            jwt::verify(&refresh.token, &config.token_secret).unwrap();
        assert!(!raw.contains_key("user_id"));
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token_for_other_secret() {
        let issuer = TokenIssuer::new(Arc::new(AuthConfig::development()));
        let other = TokenIssuer::new(Arc::new(AuthConfig::development()));
        let tokens = issuer.issue(&session(), true).unwrap();
        let refresh = tokens.refresh.unwrap();
        assert!(other.verify_refresh_at(&refresh.token, Utc::now()).is_err());
    }
}
