//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use platform::cookie::extract_cookie;

use crate::application::config::AuthConfig;
use crate::application::{
    ForgotPasswordUseCase, IssuedTokens, ManageSessionsUseCase, RefreshUseCase,
    ResetPasswordInput, ResetPasswordUseCase, SignInInput, SignInUseCase, SignOutUseCase,
    SignUpInput, SignUpUseCase, VerifyEmailUseCase,
};
use crate::domain::repository::{SessionRepository, TtlStore, UserRepository};
use crate::domain::services::{EmailQueue, PasswordHashing};
use crate::domain::value_object::{
    SessionId, email::Email, user_password::RawPassword,
};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthResponse, FORGOT_PASSWORD_ACK, ForgotPasswordRequest, MessageResponse, RefreshRequest,
    ResetGrantResponse, ResetPasswordRequest, SessionListResponse, SignInRequest, SignUpRequest,
    Validate, VerifyEmailRequest, VerifyForgotPasswordRequest,
};
use crate::presentation::extract::{CurrentIdentity, RequestClient, ValidatedJson, ValidatedPath};

/// Everything a storage backend must provide to serve the auth routes
pub trait AuthBackend:
    UserRepository + SessionRepository + TtlStore + Clone + Send + Sync + 'static
{
}

impl<T> AuthBackend for T where
    T: UserRepository + SessionRepository + TtlStore + Clone + Send + Sync + 'static
{
}

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthBackend,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub hasher: Arc<dyn PasswordHashing>,
    pub mailer: Arc<dyn EmailQueue>,
}

impl<R> AuthAppState<R>
where
    R: AuthBackend,
{
    pub fn new(
        repo: R,
        config: AuthConfig,
        hasher: Arc<dyn PasswordHashing>,
        mailer: Arc<dyn EmailQueue>,
    ) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            hasher,
            mailer,
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /sign-up
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> AuthResult<(StatusCode, Json<MessageResponse>)>
where
    R: AuthBackend,
{
    let input = SignUpInput {
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email: Email::new(req.email)?,
        password: RawPassword::new(req.password, "password")?,
    };

    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.hasher.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("user account created successfully")),
    ))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /sign-in
pub async fn sign_in<R>(
    State(state): State<AuthAppState<R>>,
    RequestClient(client): RequestClient,
    ValidatedJson(req): ValidatedJson<SignInRequest>,
) -> AuthResult<Response>
where
    R: AuthBackend,
{
    let input = SignInInput {
        email: Email::new(req.email)?,
        password: req.password,
        client,
    };

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.hasher.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    let output = use_case.execute(input).await?;

    Ok(token_response(&state.config, &output.tokens))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /refresh
///
/// The body is optional; `refresh_token` in it wins over the refresh cookie.
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    RequestClient(client): RequestClient,
    headers: HeaderMap,
    body: Bytes,
) -> AuthResult<Response>
where
    R: AuthBackend,
{
    let token = parse_refresh_body(&body)?
        .or_else(|| extract_cookie(&headers, &state.config.refresh_cookie_name))
        .ok_or(AuthError::MissingRefreshToken)?;

    let use_case = RefreshUseCase::new(state.repo.clone(), state.config.clone());
    let output = use_case
        .execute(&token, client.ip_string().as_deref())
        .await?;

    Ok(token_response(&state.config, &output.tokens))
}

fn parse_refresh_body(body: &[u8]) -> AuthResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let req: RefreshRequest = serde_json::from_slice(body)
        .map_err(|e| AuthError::invalid_field("body", e.to_string()))?;

    let errors = req.validate();
    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }

    Ok(req.refresh_token)
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /verify-email
pub async fn verify_email<R>(
    State(state): State<AuthAppState<R>>,
    ValidatedJson(req): ValidatedJson<VerifyEmailRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthBackend,
{
    let use_case = VerifyEmailUseCase::new(state.repo.clone(), state.repo.clone());
    use_case.execute(&req.code).await?;

    Ok(Json(MessageResponse::new("user email verified")))
}

// ============================================================================
// Password Recovery
// ============================================================================

/// POST /password/forget
pub async fn forgot_password<R>(
    State(state): State<AuthAppState<R>>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthBackend,
{
    let email = Email::new(req.email)?;

    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.request(&email).await;

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_ACK)))
}

/// POST /password/verify-email
pub async fn verify_forgot_password<R>(
    State(state): State<AuthAppState<R>>,
    ValidatedJson(req): ValidatedJson<VerifyForgotPasswordRequest>,
) -> AuthResult<Json<ResetGrantResponse>>
where
    R: AuthBackend,
{
    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    let grant = use_case.verify_code(&req.token).await?;

    Ok(Json(grant.into()))
}

/// POST /password/reset
pub async fn reset_password<R>(
    State(state): State<AuthAppState<R>>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthBackend,
{
    let input = ResetPasswordInput {
        token: req.token,
        new_password: RawPassword::new(req.password, "password")?,
    };

    let use_case =
        ResetPasswordUseCase::new(state.repo.clone(), state.repo.clone(), state.hasher.clone());
    use_case.execute(input).await?;

    Ok(Json(MessageResponse::new("password resetted successfully")))
}

// ============================================================================
// Authenticated Routes
// ============================================================================

/// DELETE /logout
///
/// Both cookies are cleared even if the session was already gone.
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Response
where
    R: AuthBackend,
{
    let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
    if let Err(e) = use_case.execute(&identity).await {
        tracing::warn!(error = %e, session_id = %identity.session.id, "Session delete failed on logout");
    }

    let mut response = Json(MessageResponse::new("logout successful")).into_response();
    clear_auth_cookies(&state.config, response.headers_mut());
    response
}

/// GET /sessions
pub async fn list_sessions<R>(
    State(state): State<AuthAppState<R>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> AuthResult<Json<SessionListResponse>>
where
    R: AuthBackend,
{
    let use_case = ManageSessionsUseCase::new(state.repo.clone(), state.config.clone());
    let sessions = use_case.list(&identity).await?;

    Ok(Json(SessionListResponse { sessions }))
}

/// DELETE /sessions/{session_id}
pub async fn revoke_session<R>(
    State(state): State<AuthAppState<R>>,
    CurrentIdentity(identity): CurrentIdentity,
    ValidatedPath(session_id): ValidatedPath<SessionId>,
) -> AuthResult<Json<MessageResponse>>
where
    R: AuthBackend,
{
    let use_case = ManageSessionsUseCase::new(state.repo.clone(), state.config.clone());
    use_case.revoke(&identity, &session_id).await?;

    tracing::info!(
        user_id = %identity.user.id,
        session_id = %session_id,
        "Session revoked"
    );

    Ok(Json(MessageResponse::new("session revoked")))
}

// ============================================================================
// Cookie Helpers
// ============================================================================

/// JSON body plus the matching `Set-Cookie` headers
fn token_response(config: &AuthConfig, tokens: &IssuedTokens) -> Response {
    let mut response = Json(AuthResponse::from(tokens)).into_response();
    set_auth_cookies(config, tokens, response.headers_mut());
    response
}

fn set_auth_cookies(config: &AuthConfig, tokens: &IssuedTokens, headers: &mut HeaderMap) {
    append_cookie(headers, config.access_cookie().build_set_cookie(&tokens.access.token));
    if let Some(refresh) = &tokens.refresh {
        append_cookie(headers, config.refresh_cookie().build_set_cookie(&refresh.token));
    }
}

fn clear_auth_cookies(config: &AuthConfig, headers: &mut HeaderMap) {
    append_cookie(headers, config.access_cookie().build_delete_cookie());
    append_cookie(headers, config.refresh_cookie().build_delete_cookie());
}

fn append_cookie(headers: &mut HeaderMap, cookie: String) {
    match HeaderValue::try_from(cookie) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Dropped malformed Set-Cookie header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_refresh_body_defers_to_cookie() {
        assert_eq!(parse_refresh_body(b"").unwrap(), None);
        assert_eq!(parse_refresh_body(b"  \n").unwrap(), None);
        assert_eq!(parse_refresh_body(b"{}").unwrap(), None);
    }

    #[test]
    fn test_refresh_body_token() {
        let token = parse_refresh_body(br#"{"refresh_token":"abc"}"#).unwrap();
        assert_eq!(token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_malformed_refresh_body() {
        assert!(matches!(
            parse_refresh_body(b"{not json"),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            parse_refresh_body(br#"{"refresh_token":""}"#),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_logout_clears_both_cookies() {
        let config = AuthConfig::development();
        let mut headers = HeaderMap::new();
        clear_auth_cookies(&config, &mut headers);

        let cookies: Vec<&str> = headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("access_token=;"));
        assert!(cookies[1].starts_with("refresh_token=;"));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }
}
