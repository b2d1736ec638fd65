//! Auth Middleware
//!
//! Guards protected routes: resolves the caller to an [`AuthIdentity`] and
//! stores it in the request extensions for [`CurrentIdentity`].
//!
//! [`AuthIdentity`]: crate::domain::entity::identity::AuthIdentity
//! [`CurrentIdentity`]: crate::presentation::extract::CurrentIdentity

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use platform::cookie::extract_cookie;

use crate::application::config::AuthConfig;
use crate::application::{AuthenticateUseCase, VerificationPolicy, extract_credential};
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::{AuthAppState, AuthBackend};

/// Reject unless the caller holds a live session on a verified account
pub async fn require_auth<R>(
    State(state): State<AuthAppState<R>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthBackend,
{
    authenticate(state, req, next, VerificationPolicy::RequireVerified).await
}

/// Like [`require_auth`] but lets unverified accounts through
pub async fn require_auth_allow_unverified<R>(
    State(state): State<AuthAppState<R>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: AuthBackend,
{
    authenticate(state, req, next, VerificationPolicy::AllowUnverified).await
}

async fn authenticate<R>(
    state: AuthAppState<R>,
    mut req: Request,
    next: Next,
    policy: VerificationPolicy,
) -> Result<Response, AuthError>
where
    R: AuthBackend,
{
    let token = request_credential(req.headers(), &state.config)?;

    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.config.clone());
    let identity = use_case.execute(&token, policy).await?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

fn request_credential(headers: &HeaderMap, config: &AuthConfig) -> AuthResult<String> {
    let cookie = extract_cookie(headers, &config.access_cookie_name);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    extract_credential(cookie.as_deref(), authorization)
}
