//! User Entity
//!
//! The account record plus its client-safe projection.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::{UserId, email::Email, user_password::PasswordCredentials};

/// User entity
///
/// Holds password material; never serialize it. Use [`User::to_client`].
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Unique, lower-cased
    pub email: Email,
    /// Absent for accounts that never set a password
    pub credentials: Option<PasswordCredentials>,
    pub is_active: bool,
    pub avatar_url: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: Email,
        credentials: PasswordCredentials,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email,
            credentials: Some(credentials),
            is_active: true,
            avatar_url: None,
            email_verified_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", as used in email salutations
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    pub fn mark_email_verified(&mut self) {
        let now = Utc::now();
        self.email_verified_at = Some(now);
        self.updated_at = now;
    }

    pub fn set_credentials(&mut self, credentials: PasswordCredentials) {
        self.credentials = Some(credentials);
        self.updated_at = Utc::now();
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn to_client(&self) -> UserClient {
        UserClient {
            id: self.user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.as_str().to_string(),
            is_active: self.is_active,
            avatar_url: self.avatar_url.clone(),
            email_verified_at: self.email_verified_at,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Everything about a user except password material
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserClient {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub avatar_url: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserClient {
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "Ada",
            "Lovelace",
            Email::new("ada@example.com").unwrap(),
            PasswordCredentials::new("hash", "salt"),
        )
    }

    #[test]
    fn test_new_user_is_unverified() {
        let user = user();
        assert!(!user.is_email_verified());
        assert!(user.is_active);
        assert!(user.last_login_at.is_none());
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_mark_verified() {
        let mut user = user();
        user.mark_email_verified();
        assert!(user.is_email_verified());
        assert!(user.to_client().is_email_verified());
    }

    #[test]
    fn test_client_projection_has_no_password() {
        let json = serde_json::to_value(user().to_client()).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.keys().all(|k| !k.contains("password") && !k.contains("salt")));
        assert_eq!(object["email"], "ada@example.com");
    }
}
