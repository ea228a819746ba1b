//! Guard rejections rendered as HTTP responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use lectern_auth_core::{AuthError, CookieSettings};
use serde::Serialize;

use crate::cookies::clearing_cookies;

/// JSON error body shared by every Lectern endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Error code and human-readable message
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// An [`AuthError`] on its way out as a response.
///
/// Authentication failures carry `Set-Cookie` headers expiring both session
/// cookies.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct GuardRejection {
    pub error: AuthError,
    clear: Option<[String; 2]>,
}

impl GuardRejection {
    /// Wrap an error, preparing cookie clears if it ends the session
    pub fn new(error: AuthError, cookies: &CookieSettings) -> Self {
        let clear = error.clears_session().then(|| clearing_cookies(cookies));
        Self { error, clear }
    }

    /// Whether the response will expire the session cookies
    pub fn clears_cookies(&self) -> bool {
        self.clear.is_some()
    }
}

/// Message safe to show the caller; infrastructure detail stays in the logs
pub fn public_message(error: &AuthError) -> String {
    match error {
        AuthError::Database(_) | AuthError::Configuration(_) | AuthError::Internal(_) => {
            "internal error".to_string()
        }
        other => other.to_string(),
    }
}

pub(crate) fn render(error: &AuthError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    }
    let body = ErrorBody {
        error: ErrorDetail {
            code: error.error_code(),
            message: public_message(error),
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        let mut response = render(&self.error);
        if let Some(cookies) = self.clear {
            for cookie in cookies {
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_types::DenialReason;

    #[test]
    fn test_authentication_failure_clears_cookies() {
        let rejection = GuardRejection::new(AuthError::TokenExpired, &CookieSettings::default());
        let response = rejection.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cleared: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cleared.len(), 2);
    }

    #[test]
    fn test_authorization_failure_keeps_cookies() {
        let rejection = GuardRejection::new(AuthError::InsufficientRole, &CookieSettings::default());
        assert!(!rejection.clears_cookies());

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_denials_map_to_statuses() {
        let cases = [
            (DenialReason::NotFound, StatusCode::NOT_FOUND),
            (DenialReason::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DenialReason::NoSubscription, StatusCode::FORBIDDEN),
        ];
        for (reason, status) in cases {
            let response = render(&AuthError::Forbidden(reason));
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn test_internal_detail_hidden() {
        let message = public_message(&AuthError::Database("connection refused".to_string()));
        assert_eq!(message, "internal error");
    }
}
