//! Auth Router

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::presentation::handlers::{self, AuthAppState, AuthBackend};
use crate::presentation::middleware::require_auth;

/// All auth routes, meant to be nested under `/api/v1/auth`.
///
/// `/logout` and `/sessions*` sit behind [`require_auth`].
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthBackend,
{
    let protected = Router::new()
        .route("/logout", delete(handlers::logout::<R>))
        .route("/sessions", get(handlers::list_sessions::<R>))
        .route("/sessions/{session_id}", delete(handlers::revoke_session::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R>,
        ));

    Router::new()
        .route("/sign-up", post(handlers::sign_up::<R>))
        .route("/sign-in", post(handlers::sign_in::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/verify-email", post(handlers::verify_email::<R>))
        .route("/password/forget", post(handlers::forgot_password::<R>))
        .route(
            "/password/verify-email",
            post(handlers::verify_forgot_password::<R>),
        )
        .route("/password/reset", post(handlers::reset_password::<R>))
        .merge(protected)
        .with_state(state)
}
