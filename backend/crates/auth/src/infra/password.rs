//! Argon2 Password Hashing Adapter

use platform::crypto::{from_base64, to_base64};
use platform::password::Argon2Hasher;

use crate::domain::services::PasswordHashing;
use crate::domain::value_object::user_password::{PasswordCredentials, RawPassword};
use crate::error::{AuthError, AuthResult};

/// [`PasswordHashing`] backed by `platform`'s Argon2id hasher.
///
/// The per-user salt is stored base64-encoded next to the PHC string.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    inner: Argon2Hasher,
}

impl Argon2PasswordHasher {
    pub fn new(inner: Argon2Hasher) -> Self {
        Self { inner }
    }
}

impl PasswordHashing for Argon2PasswordHasher {
    fn hash(&self, password: &RawPassword) -> AuthResult<PasswordCredentials> {
        let salted = self
            .inner
            .hash(password.inner())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(PasswordCredentials::new(salted.hash, to_base64(&salted.salt)))
    }

    fn verify(&self, candidate: &str, stored: &PasswordCredentials) -> bool {
        match from_base64(&stored.salt) {
            Ok(salt) => self.inner.verify(candidate, &stored.hash, &salt),
            Err(_) => false,
        }
    }
}
