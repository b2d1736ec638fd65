//! Environment Configuration
//!
//! Builds [`AuthConfig`] and server settings from environment variables.
//! Durations use the `<n>(ms|s|m|h|d|w)` grammar, e.g. `15m`, `30d`.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use auth::application::config::{MAX_SECRET_LENGTH, MIN_SECRET_LENGTH};
use platform::duration::parse_duration;

pub const DEFAULT_PORT: u16 = 31113;
/// Upper bound for any configured token or session lifetime
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 86_400);
pub const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

/// Everything `main` reads from the environment
pub struct ServerConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` returns the raw value of a variable, if set
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let frontend_origins = lookup("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            frontend_origins,
            auth: auth_config(&lookup)?,
        })
    }
}

fn auth_config(lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<AuthConfig> {
    let production = lookup("ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));

    let mut config = match lookup("AUTH_SECRET") {
        Some(secret) => {
            let len = secret.len();
            if !(MIN_SECRET_LENGTH..=MAX_SECRET_LENGTH).contains(&len) {
                bail!(
                    "AUTH_SECRET must be {MIN_SECRET_LENGTH}-{MAX_SECRET_LENGTH} characters (got {len})"
                );
            }
            AuthConfig::production(secret.into_bytes())
        }
        None if cfg!(debug_assertions) && !production => {
            tracing::warn!("AUTH_SECRET not set; signing with a random per-process secret");
            AuthConfig::with_random_secret()
        }
        None => bail!("AUTH_SECRET must be set"),
    };

    if !production {
        let dev = AuthConfig::development();
        config.cookie_secure = dev.cookie_secure;
        config.cookie_same_site = dev.cookie_same_site;
    }

    config.token_issuer = lookup("AUTH_ISSUER").filter(|issuer| !issuer.trim().is_empty());

    if let Some(ttl) = duration_var(lookup, "AUTH_EXPIRES_IN")? {
        config.access_token_ttl = ttl;
    }
    if let Some(ttl) = duration_var(lookup, "AUTH_REFRESH_EXPIRES_IN")? {
        config.refresh_token_ttl = ttl;
    }
    if let Some(ttl) = duration_var(lookup, "SESSION_EXPIRES_IN")? {
        config.session_ttl = ttl;
    }

    if let Some(name) = lookup("ACCESS_TOKEN_COOKIE_NAME") {
        config.access_cookie_name = name;
    }
    if let Some(name) = lookup("REFRESH_TOKEN_COOKIE_NAME") {
        config.refresh_cookie_name = name;
    }
    if let Some(path) = lookup("REFRESH_PATH") {
        config.refresh_cookie_path = path;
    }

    Ok(config)
}

fn duration_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> anyhow::Result<Option<Duration>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let ttl = parse_duration(&raw).with_context(|| format!("{key} is not a duration"))?;
    if ttl > MAX_TTL {
        bail!("{key} must be at most {} days", MAX_TTL.as_secs() / 86_400);
    }
    Ok(Some(ttl))
}
