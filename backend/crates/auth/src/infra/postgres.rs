//! PostgreSQL Repository Implementations

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    session::Session,
    user::{User, UserClient},
};
use crate::domain::repository::{SessionRepository, TtlStore, UserRepository};
use crate::domain::value_object::{
    SessionId, UserId, email::Email, user_password::PasswordCredentials,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete dead sessions and lapsed ephemeral tokens
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let sessions_deleted = sqlx::query(
            "DELETE FROM sessions WHERE expires_at IS NULL OR expires_at <= now()",
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        let tokens_deleted = sqlx::query("DELETE FROM ephemeral_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(
            sessions_deleted,
            tokens_deleted,
            "Cleaned up expired sessions and tokens"
        );

        Ok(sessions_deleted + tokens_deleted)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let (password_hash, password_salt) = match &user.credentials {
            Some(c) => (Some(c.hash.as_str()), Some(c.salt.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                first_name,
                last_name,
                email,
                password_hash,
                password_salt,
                is_active,
                avatar_url,
                email_verified_at,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.user_id.into_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.email.as_str())
        .bind(password_hash)
        .bind(password_salt)
        .bind(user.is_active)
        .bind(&user.avatar_url)
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailTaken,
            other => AuthError::Database(other),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                first_name,
                last_name,
                email,
                password_hash,
                password_salt,
                is_active,
                avatar_url,
                email_verified_at,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.into_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                first_name,
                last_name,
                email,
                password_hash,
                password_salt,
                is_active,
                avatar_url,
                email_verified_at,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let (password_hash, password_salt) = match &user.credentials {
            Some(c) => (Some(c.hash.as_str()), Some(c.salt.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            UPDATE users SET
                first_name = $2,
                last_name = $3,
                password_hash = $4,
                password_salt = $5,
                is_active = $6,
                avatar_url = $7,
                email_verified_at = $8,
                last_login_at = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(user.user_id.into_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(password_hash)
        .bind(password_salt)
        .bind(user.is_active)
        .bind(&user.avatar_url)
        .bind(user.email_verified_at)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

/// Session columns plus the owner's client projection
const SESSION_WITH_USER: &str = r#"
    SELECT
        s.id,
        s.user_id,
        s.user_agent,
        s.ip,
        s.expires_at,
        s.last_activity_at,
        s.created_at,
        s.updated_at,
        u.first_name AS user_first_name,
        u.last_name AS user_last_name,
        u.email AS user_email,
        u.is_active AS user_is_active,
        u.avatar_url AS user_avatar_url,
        u.email_verified_at AS user_email_verified_at,
        u.last_login_at AS user_last_login_at,
        u.created_at AS user_created_at,
        u.updated_at AS user_updated_at
    FROM sessions s
    INNER JOIN users u ON u.id = s.user_id
"#;

impl SessionRepository for PgAuthRepository {
    async fn insert_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id,
                user_id,
                user_agent,
                ip,
                expires_at,
                last_activity_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id.into_uuid())
        .bind(session.user_id.into_uuid())
        .bind(&session.user_agent)
        .bind(&session.ip)
        .bind(session.expires_at)
        .bind(session.last_activity_at)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session_with_user(
        &self,
        session_id: &SessionId,
    ) -> AuthResult<Option<(Session, UserClient)>> {
        let query = format!("{SESSION_WITH_USER} WHERE s.id = $1");
        let row = sqlx::query_as::<_, SessionUserRow>(&query)
            .bind(session_id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SessionUserRow::into_parts))
    }

    async fn find_user_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> AuthResult<Option<(Session, UserClient)>> {
        let query = format!("{SESSION_WITH_USER} WHERE s.id = $1 AND s.user_id = $2");
        let row = sqlx::query_as::<_, SessionUserRow>(&query)
            .bind(session_id.into_uuid())
            .bind(user_id.into_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SessionUserRow::into_parts))
    }

    async fn update_session_expiry(
        &self,
        session_id: &SessionId,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        // GREATEST keeps concurrent refreshes monotonic.
        sqlx::query(
            r#"
            UPDATE sessions SET
                expires_at = GREATEST(COALESCE(expires_at, $2), $2),
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(session_id.into_uuid())
        .bind(expires_at)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn touch_session(
        &self,
        session_id: &SessionId,
        ip: Option<&str>,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE sessions SET
                last_activity_at = $2,
                ip = COALESCE($3, ip),
                updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(session_id.into_uuid())
        .bind(at)
        .bind(ip)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn list_user_sessions(&self, user_id: &UserId) -> AuthResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                id,
                user_id,
                user_agent,
                ip,
                expires_at,
                last_activity_at,
                created_at,
                updated_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.into_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionRow::into_session).collect())
    }

    async fn delete_user_session(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
    ) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE id = $1 AND user_id = $2")
            .bind(session_id.into_uuid())
            .bind(user_id.into_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }
}

// ============================================================================
// TTL Store Implementation
// ============================================================================

impl TtlStore for PgAuthRepository {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> AuthResult<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AuthError::TokenStoreFault(format!("ttl out of range: {ttl:?}")))?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::TokenStoreFault(format!("ttl out of range: {ttl:?}")))?;

        sqlx::query(
            r#"
            INSERT INTO ephemeral_tokens (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM ephemeral_tokens WHERE key = $1 AND expires_at > now()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        if value.is_none() {
            sqlx::query("DELETE FROM ephemeral_tokens WHERE key = $1 AND expires_at <= now()")
                .bind(key)
                .execute(&self.pool)
                .await?;
        }

        Ok(value)
    }

    async fn delete(&self, key: &str) -> AuthResult<bool> {
        let live = sqlx::query_scalar::<_, bool>(
            "DELETE FROM ephemeral_tokens WHERE key = $1 RETURNING expires_at > now()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(live.unwrap_or(false))
    }

    async fn take(&self, key: &str) -> AuthResult<Option<String>> {
        // Row-level DELETE ... RETURNING: exactly one concurrent caller gets the row.
        let value = sqlx::query_scalar::<_, String>(
            "DELETE FROM ephemeral_tokens WHERE key = $1 AND expires_at > now() RETURNING value",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: Option<String>,
    password_salt: Option<String>,
    is_active: bool,
    avatar_url: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            email: Email::from_db(self.email),
            credentials: PasswordCredentials::from_db(self.password_hash, self.password_salt),
            is_active: self.is_active,
            avatar_url: self.avatar_url,
            email_verified_at: self.email_verified_at,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    user_agent: Option<String>,
    ip: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    last_activity_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            id: SessionId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            user_agent: self.user_agent,
            ip: self.ip,
            expires_at: self.expires_at,
            last_activity_at: self.last_activity_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    #[sqlx(flatten)]
    session: SessionRow,
    user_first_name: String,
    user_last_name: String,
    user_email: String,
    user_is_active: bool,
    user_avatar_url: Option<String>,
    user_email_verified_at: Option<DateTime<Utc>>,
    user_last_login_at: Option<DateTime<Utc>>,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
}

impl SessionUserRow {
    fn into_parts(self) -> (Session, UserClient) {
        let session = self.session.into_session();
        let user = UserClient {
            id: session.user_id,
            first_name: self.user_first_name,
            last_name: self.user_last_name,
            email: self.user_email,
            is_active: self.user_is_active,
            avatar_url: self.user_avatar_url,
            email_verified_at: self.user_email_verified_at,
            last_login_at: self.user_last_login_at,
            created_at: self.user_created_at,
            updated_at: self.user_updated_at,
        };
        (session, user)
    }
}
