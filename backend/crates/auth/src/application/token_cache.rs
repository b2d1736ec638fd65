//! Ephemeral Token Cache
//!
//! Issues unguessable keys for one-time flows and resolves them back to
//! their payload. Reads fail closed: any store or decoding problem is
//! reported as "no such token".

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use platform::crypto::random_token;

use crate::domain::entity::ephemeral_token::{EphemeralToken, TokenData};
use crate::domain::repository::TtlStore;
use crate::domain::value_object::UserId;
use crate::error::{AuthError, AuthResult};

/// Lifetime used when the caller does not pick one
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Random bytes per key (256 bits)
pub const TOKEN_KEY_BYTES: usize = 32;

/// A freshly stored token
#[derive(Debug, Clone)]
pub struct EphemeralGrant {
    pub key: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenCache<T>
where
    T: TtlStore,
{
    store: Arc<T>,
}

impl<T> Clone for TokenCache<T>
where
    T: TtlStore,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T> TokenCache<T>
where
    T: TtlStore,
{
    pub fn new(store: Arc<T>) -> Self {
        Self { store }
    }

    /// Store a payload and return its key.
    pub async fn create(
        &self,
        user_id: UserId,
        email: &str,
        data: TokenData,
        ttl: Option<Duration>,
    ) -> AuthResult<String> {
        self.issue(user_id, email, data, ttl).await.map(|grant| grant.key)
    }

    /// [`create`](Self::create), also reporting when the token lapses.
    pub async fn issue(
        &self,
        user_id: UserId,
        email: &str,
        data: TokenData,
        ttl: Option<Duration>,
    ) -> AuthResult<EphemeralGrant> {
        let ttl = ttl.unwrap_or(DEFAULT_TOKEN_TTL);
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::Internal(format!("token ttl out of range: {ttl:?}")))?;

        let key = random_token(TOKEN_KEY_BYTES);
        let token = EphemeralToken {
            user_id,
            email: email.to_string(),
            data,
            expires_at,
        };
        let value = serde_json::to_string(&token)
            .map_err(|e| AuthError::Internal(format!("token encoding: {e}")))?;

        self.store
            .set(&key, value, ttl)
            .await
            .map_err(|e| AuthError::TokenStoreFault(e.to_string()))?;

        tracing::debug!(
            kind = %token.kind(),
            user_id = %user_id,
            expires_at = %token.expires_at,
            "Ephemeral token issued"
        );

        Ok(EphemeralGrant {
            key,
            expires_at: token.expires_at,
        })
    }

    /// Look up a token without consuming it.
    pub async fn verify(&self, key: &str) -> Option<EphemeralToken> {
        self.verify_at(key, Utc::now()).await
    }

    /// [`verify`](Self::verify) against an explicit clock
    pub async fn verify_at(&self, key: &str, now: DateTime<Utc>) -> Option<EphemeralToken> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Token store read failed; treating token as invalid");
                return None;
            }
        };

        let token = decode(&raw)?;
        if token.is_expired_at(now) {
            if let Err(e) = self.store.delete(key).await {
                tracing::warn!(error = %e, "Failed to drop expired token");
            }
            return None;
        }

        Some(token)
    }

    /// Remove a token. Returns whether it existed; never fails.
    pub async fn invalidate(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(existed) => existed,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to invalidate token");
                false
            }
        }
    }

    /// Atomically fetch and remove. Only one concurrent caller wins.
    pub async fn consume(&self, key: &str) -> Option<EphemeralToken> {
        self.consume_at(key, Utc::now()).await
    }

    /// [`consume`](Self::consume) against an explicit clock
    pub async fn consume_at(&self, key: &str, now: DateTime<Utc>) -> Option<EphemeralToken> {
        let raw = match self.store.take(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Token store take failed; treating token as invalid");
                return None;
            }
        };

        decode(&raw).filter(|token| !token.is_expired_at(now))
    }
}

fn decode(raw: &str) -> Option<EphemeralToken> {
    serde_json::from_str(raw)
        .map_err(|e| tracing::warn!(error = %e, "Undecodable ephemeral token payload"))
        .ok()
}
