// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction for authenticated routes.
//!
//! Every route except login and bootstrap requires an
//! `Authorization: Bearer <token>` header naming a live session.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use donation_api::{AuthenticatedActor, AuthenticationService};
use donation_persistence::OperatorData;
use tracing::{debug, warn};

use crate::{AppState, HttpError};

/// Extractor for authenticated operators.
///
/// Validates the bearer token against the session table, refreshing its
/// activity timestamp, and yields the actor together with the stored
/// operator row.
///
/// # Errors
///
/// Rejects with HTTP 401 when the header is missing or malformed, the
/// session is unknown or expired, or the operator has been disabled.
pub struct SessionOperator(pub AuthenticatedActor, pub OperatorData);

impl FromRequestParts<AppState> for SessionOperator {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token: &str = bearer_token(&parts.headers)?;

        let mut persistence = state.persistence.lock().await;
        let (actor, operator) = AuthenticationService::validate_session(&mut persistence, token)
            .map_err(|e| {
                warn!(error = %e, "Session validation failed");
                SessionError::InvalidSession(e.to_string())
            })?;
        drop(persistence);

        debug!(
            login_name = %operator.login_name,
            role = %actor.role,
            "Session validated"
        );

        Ok(Self(actor, operator))
    }
}

/// Reads the bearer token from the request headers.
///
/// # Errors
///
/// Returns `MissingAuthorizationHeader` or `InvalidAuthorizationHeader`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, SessionError> {
    let header: &str = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| {
            debug!("Missing Authorization header");
            SessionError::MissingAuthorizationHeader
        })?
        .to_str()
        .map_err(|_| {
            warn!("Invalid Authorization header encoding");
            SessionError::InvalidAuthorizationHeader
        })?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            warn!("Authorization header is not a bearer token");
            SessionError::InvalidAuthorizationHeader
        })
}

/// Session extraction errors, all answered with HTTP 401.
#[derive(Debug)]
pub enum SessionError {
    /// Authorization header is missing.
    MissingAuthorizationHeader,
    /// Authorization header format is invalid.
    InvalidAuthorizationHeader,
    /// Session validation failed.
    InvalidSession(String),
}

impl From<SessionError> for HttpError {
    fn from(err: SessionError) -> Self {
        let message: String = match err {
            SessionError::MissingAuthorizationHeader => {
                String::from("Missing Authorization header")
            }
            SessionError::InvalidAuthorizationHeader => String::from(
                "Invalid Authorization header format. Expected: 'Bearer <token>'",
            ),
            SessionError::InvalidSession(reason) => {
                format!("Session validation failed: {reason}")
            }
        };

        Self {
            status: StatusCode::UNAUTHORIZED,
            message,
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        HttpError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(SessionError::MissingAuthorizationHeader)
        ));
    }

    #[test]
    fn test_other_schemes_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(
            bearer_token(&headers),
            Err(SessionError::InvalidAuthorizationHeader)
        ));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(matches!(
            bearer_token(&headers),
            Err(SessionError::InvalidAuthorizationHeader)
        ));
    }
}
