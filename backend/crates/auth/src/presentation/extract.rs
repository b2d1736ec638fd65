//! Request Extractors

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use platform::client::ClientInfo;
use serde::de::DeserializeOwned;

use crate::domain::entity::identity::AuthIdentity;
use crate::error::AuthError;
use crate::presentation::dto::Validate;

/// JSON body that deserialized and passed [`Validate`].
///
/// Malformed JSON and rule violations both reject with `AuthError::Validation`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AuthError::invalid_field("body", rejection.body_text()))?;

        let errors = value.validate();
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        Ok(Self(value))
    }
}

/// Path parameters; an unparsable segment rejects as a `path` field error.
#[derive(Debug, Clone)]
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AuthError::invalid_field("path", rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Caller's User-Agent and IP (`X-Forwarded-For` first, else the peer)
#[derive(Debug, Clone)]
pub struct RequestClient(pub ClientInfo);

impl<S> FromRequestParts<S> for RequestClient
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let direct_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        Ok(Self(ClientInfo::from_headers(&parts.headers, direct_ip)))
    }
}

/// Identity bound by the auth middleware.
///
/// Rejects with 401 on routes the middleware does not guard.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub AuthIdentity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthIdentity>()
            .cloned()
            .map(Self)
            .ok_or(AuthError::MissingCredential)
    }
}
