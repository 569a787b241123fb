//! Axum integration for the guard adapter
//!
//! - [`Caller`] extracts the caller identity from `Authorization: Bearer <token>`.
//! - `AuthzError` implements `IntoResponse`, so handlers can return
//!   `Result<_, AuthzError>` and propagate guard denials with `?`.
//!
//! Denials become `403 Forbidden`; failed authentication becomes
//! `401 Unauthorized` with `WWW-Authenticate: Bearer`.

use crate::error::{AuthzError, Result};
use crate::guard::Guard;
use crate::identity::IdentityResolver;
use crate::types::CallerIdentity;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::ops::Deref;
use tracing::error;

/// Application state that can authenticate callers
pub trait ProvidesIdentity: Send + Sync {
    fn identity_resolver(&self) -> &dyn IdentityResolver;

    fn guard(&self) -> &Guard;
}

/// Authenticated caller of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub CallerIdentity);

impl Caller {
    pub fn into_inner(self) -> CallerIdentity {
        self.0
    }
}

impl Deref for Caller {
    type Target = CallerIdentity;

    fn deref(&self) -> &CallerIdentity {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: ProvidesIdentity,
{
    type Rejection = AuthzError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let caller = state
            .guard()
            .authenticate(state.identity_resolver(), token)
            .await?;
        Ok(Caller(caller))
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthzError::Unauthenticated("missing bearer token".to_string()))?
        .to_str()
        .map_err(|_| AuthzError::Unauthenticated("malformed authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthzError::Unauthenticated("malformed authorization header".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthzError::Unauthenticated(format!(
            "unsupported authorization scheme {}",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthzError::Unauthenticated("missing bearer token".to_string()));
    }
    Ok(token)
}

impl AuthzError {
    /// HTTP status this error maps to at the protocol edge
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthzError::AccessDenied => StatusCode::FORBIDDEN,
            AuthzError::Unauthenticated(_)
            | AuthzError::InvalidToken(_)
            | AuthzError::TokenExpired
            | AuthzError::InvalidCredentials
            | AuthzError::UserBanned
            | AuthzError::UserInactive => StatusCode::UNAUTHORIZED,
            AuthzError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AuthzError::AlreadyExists(_) => StatusCode::CONFLICT,
            AuthzError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthzError::InvalidRole(_)
            | AuthzError::Config(_)
            | AuthzError::PasswordHash(_)
            | AuthzError::Metrics(_)
            | AuthzError::Serialization(_)
            | AuthzError::Io(_)
            | AuthzError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status.is_server_error() {
            error!("Unexpected authorization failure: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
