//! Password Hashing and Verification
//!
//! NIST SP 800-63B length policy plus Argon2id hashing where every user gets
//! a random salt that is fed to Argon2 as its keyed secret. The stored pair is
//! `(PHC string, salt)`; both are needed to verify.
//!
//! ## Security Features
//! - Memory-hard hashing prevents GPU/ASIC attacks
//! - Zeroization of clear text on drop
//! - Unicode NFKC normalization before hashing and verifying

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::random_bytes;

/// Minimum password length (NIST: SHALL be at least 8)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (NIST: SHOULD permit at least 64)
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Per-user salt length in bytes
pub const SALT_LENGTH: usize = 16;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("password contains invalid control characters")]
    InvalidCharacter,
}

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Policy-checked clear text password, zeroized on drop.
///
/// Does not implement `Clone`; Debug output is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Normalize (NFKC) and validate a new password.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let raw = Zeroizing::new(raw);
        let normalized: String = raw.nfkc().collect();
        let candidate = Self(normalized);

        if candidate.0.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        // NIST: count code points, not bytes
        let char_count = candidate.0.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if candidate
            .0
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(candidate)
    }

    /// The normalized clear text, for comparisons against a stored hash
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Output of [`Argon2Hasher::hash`]: store both halves.
#[derive(Clone, PartialEq, Eq)]
pub struct SaltedHash {
    /// PHC string (algorithm, params, PHC salt, digest)
    pub hash: String,
    /// Random per-user secret fed to Argon2
    pub salt: Vec<u8>,
}

impl fmt::Debug for SaltedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaltedHash")
            .field("hash", &"[HASH]")
            .field("salt", &"[SALT]")
            .finish()
    }
}

/// Argon2id hasher with configurable cost
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Default for Argon2Hasher {
    /// OWASP baseline: m=19456 (19 MiB), t=2, p=1
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Explicit cost: memory in KiB, iterations, lanes
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordHashError> {
        Params::new(m_cost, t_cost, p_cost, None)
            .map(Self::new)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
    }

    /// Hash with a fresh random salt.
    pub fn hash(&self, password: &ClearTextPassword) -> Result<SaltedHash, PasswordHashError> {
        let salt = random_bytes(SALT_LENGTH);
        let argon2 = self.argon2(&salt)?;
        let phc_salt = SaltString::generate(OsRng);

        let hash = argon2
            .hash_password(password.as_bytes(), &phc_salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(SaltedHash {
            hash: hash.to_string(),
            salt,
        })
    }

    /// Check an unvalidated candidate against a stored `(hash, salt)` pair.
    ///
    /// Any malformed input verifies as `false`. Argon2 compares in constant time.
    pub fn verify(&self, candidate: &str, hash: &str, salt: &[u8]) -> bool {
        let normalized = Zeroizing::new(candidate.nfkc().collect::<String>());

        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        let Ok(argon2) = self.argon2(salt) else {
            return false;
        };

        argon2
            .verify_password(normalized.as_bytes(), &parsed)
            .is_ok()
    }

    fn argon2<'k>(&self, secret: &'k [u8]) -> Result<Argon2<'k>, PasswordHashError> {
        Argon2::new_with_secret(secret, Algorithm::Argon2id, Version::V0x13, self.params.clone())
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
