//! Compact Signed Tokens (HS256)
//!
//! Stateless `header.claims.signature` tokens in the JWS compact layout.
//! The verifier accepts exactly one algorithm (HS256); a token declaring
//! anything else is rejected before the signature is looked at.
//!
//! Signature and expiry failures are reported separately so callers can tell
//! "forged or mangled" apart from "genuine but stale".

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::crypto::{from_base64url, hmac_sha256, to_base64url, verify_hmac_sha256};

/// The only algorithm this codec signs with or accepts
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Secret or payload unusable for signing
    #[error("token signing failed: {0}")]
    Signing(&'static str),

    /// Malformed, wrong algorithm, or bad signature
    #[error("invalid token")]
    Invalid,

    /// Correctly signed but past its `exp`
    #[error("token expired")]
    Expired,
}

/// A freshly signed token and its lifetime
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_in: Duration,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Sign `payload` with `secret`, valid for `ttl` from now.
pub fn sign<P: Serialize>(
    payload: &P,
    secret: &[u8],
    ttl: Duration,
    issuer: Option<&str>,
) -> Result<SignedToken, TokenError> {
    sign_at(payload, secret, ttl, issuer, Utc::now())
}

/// [`sign`] against an explicit clock
pub fn sign_at<P: Serialize>(
    payload: &P,
    secret: &[u8],
    ttl: Duration,
    issuer: Option<&str>,
    now: DateTime<Utc>,
) -> Result<SignedToken, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Signing("empty secret"));
    }

    let mut claims = match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => map,
        _ => return Err(TokenError::Signing("payload must serialize to a JSON object")),
    };

    let ttl_chrono =
        chrono::Duration::from_std(ttl).map_err(|_| TokenError::Signing("ttl out of range"))?;
    let expires_at = now
        .checked_add_signed(ttl_chrono)
        .ok_or(TokenError::Signing("ttl out of range"))?;

    claims.insert("iat".into(), now.timestamp().into());
    claims.insert("exp".into(), expires_at.timestamp().into());
    if let Some(iss) = issuer {
        claims.insert("iss".into(), iss.into());
    }

    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: "JWT".to_string(),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|_| TokenError::Signing("header encoding"))?;
    let claims_json =
        serde_json::to_vec(&claims).map_err(|_| TokenError::Signing("claims encoding"))?;

    let signing_input = format!("{}.{}", to_base64url(&header_json), to_base64url(&claims_json));
    let signature = hmac_sha256(secret, signing_input.as_bytes())
        .map_err(|_| TokenError::Signing("unusable key"))?;

    Ok(SignedToken {
        token: format!("{}.{}", signing_input, to_base64url(&signature)),
        expires_in: ttl,
        expires_at,
    })
}

/// Verify `token` and decode its payload.
pub fn verify<P: DeserializeOwned>(token: &str, secret: &[u8]) -> Result<P, TokenError> {
    verify_at(token, secret, Utc::now())
}

/// [`verify`] against an explicit clock
pub fn verify_at<P: DeserializeOwned>(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<P, TokenError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Invalid);
    };

    let header: Header = decode_segment(header_b64)?;
    if header.alg != ALGORITHM {
        return Err(TokenError::Invalid);
    }

    let signature = from_base64url(signature_b64).map_err(|_| TokenError::Invalid)?;
    let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
    if secret.is_empty() || !verify_hmac_sha256(secret, signing_input.as_bytes(), &signature) {
        return Err(TokenError::Invalid);
    }

    let claims: Map<String, Value> = decode_segment(claims_b64)?;
    let exp = claims
        .get("exp")
        .and_then(Value::as_i64)
        .ok_or(TokenError::Invalid)?;
    if exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }

    serde_json::from_value(Value::Object(claims)).map_err(|_| TokenError::Invalid)
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = from_base64url(segment).map_err(|_| TokenError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Access {
        user_id: String,
        session_id: String,
    }

    fn access() -> Access {
        Access {
            user_id: "u-1".into(),
            session_id: "s-1".into(),
        }
    }

    #[test]
    fn test_sign_then_verify_before_expiry() {
        let now = Utc::now();
        let signed = sign_at(&access(), SECRET, Duration::from_secs(60), None, now).unwrap();
        assert_eq!(signed.expires_in, Duration::from_secs(60));

        let decoded: Access =
            verify_at(&signed.token, SECRET, now + chrono::Duration::seconds(59)).unwrap();
        assert_eq!(decoded, access());
    }

    #[test]
    fn test_verify_after_expiry_is_expired() {
        let now = Utc::now();
        let signed = sign_at(&access(), SECRET, Duration::from_secs(60), None, now).unwrap();

        let at_exp = verify_at::<Access>(&signed.token, SECRET, now + chrono::Duration::seconds(60));
        assert_eq!(at_exp.unwrap_err(), TokenError::Expired);

        let later = verify_at::<Access>(&signed.token, SECRET, now + chrono::Duration::hours(1));
        assert_eq!(later.unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_other_secret_is_invalid_even_when_expired() {
        let now = Utc::now();
        let signed = sign_at(&access(), SECRET, Duration::from_secs(60), None, now).unwrap();
        let other = b"ffffffffffffffffffffffffffffffff";

        let fresh = verify_at::<Access>(&signed.token, other, now);
        assert_eq!(fresh.unwrap_err(), TokenError::Invalid);

        let stale = verify_at::<Access>(&signed.token, other, now + chrono::Duration::days(2));
        assert_eq!(stale.unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_embeds_iat_exp_and_issuer() {
        let now = Utc::now();
        let signed =
            sign_at(&access(), SECRET, Duration::from_secs(900), Some("sessiond"), now).unwrap();

        let claims: Map<String, Value> = verify_at(&signed.token, SECRET, now).unwrap();
        assert_eq!(claims["iat"], now.timestamp());
        assert_eq!(claims["exp"], now.timestamp() + 900);
        assert_eq!(claims["iss"], "sessiond");
        assert_eq!(signed.expires_at.timestamp(), now.timestamp() + 900);
    }

    #[test]
    fn test_rejects_other_algorithm() {
        let signed = sign(&access(), SECRET, Duration::from_secs(60), None).unwrap();
        let none_header = to_base64url(br#"{"alg":"none","typ":"JWT"}"#);
        let (_, rest) = signed.token.split_once('.').unwrap();
        let forged = format!("{}.{}", none_header, rest);

        assert_eq!(verify::<Access>(&forged, SECRET).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_rejects_tampered_claims() {
        let signed = sign(&access(), SECRET, Duration::from_secs(60), None).unwrap();
        let parts: Vec<&str> = signed.token.split('.').collect();
        let tampered_claims = to_base64url(br#"{"user_id":"admin","session_id":"s-1","exp":9999999999}"#);
        let forged = format!("{}.{}.{}", parts[0], tampered_claims, parts[2]);

        assert_eq!(verify::<Access>(&forged, SECRET).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_rejects_malformed_structure() {
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.##"] {
            assert_eq!(verify::<Access>(token, SECRET).unwrap_err(), TokenError::Invalid);
        }
    }

    #[test]
    fn test_signing_errors() {
        let empty = sign(&access(), b"", Duration::from_secs(60), None);
        assert!(matches!(empty, Err(TokenError::Signing(_))));

        let not_object = sign(&"just a string", SECRET, Duration::from_secs(60), None);
        assert!(matches!(not_object, Err(TokenError::Signing(_))));

        let far = Duration::from_secs(99_999_999 * 7 * 86_400);
        let overflow = sign(&access(), SECRET, far, None);
        assert_eq!(overflow.err(), Some(TokenError::Signing("ttl out of range")));
    }
}
