//! Application Configuration
//!
//! Secrets, lifetimes and cookie policy for the auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Minimum accepted signing secret length in bytes
pub const MIN_SECRET_LENGTH: usize = 32;
/// Maximum accepted signing secret length in bytes
pub const MAX_SECRET_LENGTH: usize = 128;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key for access and refresh tokens
    pub token_secret: Vec<u8>,
    /// `iss` claim, when set
    pub token_issuer: Option<String>,
    /// Access token lifetime (15 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime, also the sliding session window (30 days)
    pub refresh_token_ttl: Duration,
    /// Session lifetime granted at login (30 days)
    pub session_ttl: Duration,
    /// Email verification code lifetime (1 hour)
    pub ephemeral_token_ttl: Duration,
    /// Forgot-password code lifetime (1 day)
    pub forgot_password_token_ttl: Duration,
    /// Reset token lifetime (1 hour)
    pub reset_password_token_ttl: Duration,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    /// Refresh cookie is only sent to this path
    pub refresh_cookie_path: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: Vec::new(),
            token_issuer: None,
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 3600),
            session_ttl: Duration::from_secs(30 * 24 * 3600),
            ephemeral_token_ttl: Duration::from_secs(3600),
            forgot_password_token_ttl: Duration::from_secs(24 * 3600),
            reset_password_token_ttl: Duration::from_secs(3600),
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            refresh_cookie_path: "/api/v1/auth/refresh".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = vec![0u8; MIN_SECRET_LENGTH];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure, Lax cookies)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            ..Self::with_random_secret()
        }
    }

    /// Secure, Strict cookies signed with `secret`
    pub fn production(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            token_secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sliding-refresh window for sessions
    pub fn refresh_window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.refresh_token_ttl).unwrap_or(chrono::Duration::MAX)
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_ttl).unwrap_or(chrono::Duration::MAX)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.token_issuer.as_deref()
    }

    /// `Path=/`, lives as long as the access token
    pub fn access_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.access_cookie_name)
            .with_max_age(self.access_token_ttl.as_secs())
            .with_policy(self.cookie_secure, self.cookie_same_site)
    }

    /// Scoped to the refresh endpoint, lives as long as the refresh token
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.refresh_cookie_name)
            .with_path(&self.refresh_cookie_path)
            .with_max_age(self.refresh_token_ttl.as_secs())
            .with_policy(self.cookie_secure, self.cookie_same_site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_window(), chrono::Duration::days(30));
        assert_eq!(config.session_lifetime(), chrono::Duration::days(30));
        assert_eq!(config.forgot_password_token_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn test_random_secret() {
        let a = AuthConfig::with_random_secret();
        let b = AuthConfig::with_random_secret();
        assert_eq!(a.token_secret.len(), MIN_SECRET_LENGTH);
        assert_ne!(a.token_secret, b.token_secret);
    }

    #[test]
    fn test_cookie_policies() {
        let dev = AuthConfig::development();
        let access = dev.access_cookie().build_set_cookie("a");
        assert!(access.contains("SameSite=Lax"));
        assert!(!access.contains("Secure"));
        assert!(access.contains("; Path=/;"));
        assert!(access.contains("Max-Age=900"));

        let prod = AuthConfig::production(vec![7u8; 32]);
        let refresh = prod.refresh_cookie().build_set_cookie("r");
        assert!(refresh.contains("Secure"));
        assert!(refresh.contains("SameSite=Strict"));
        assert!(refresh.contains("Path=/api/v1/auth/refresh"));
        assert!(refresh.contains(&format!("Max-Age={}", 30 * 86_400)));
    }
}
