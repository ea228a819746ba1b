//! Error types for the Access API service.

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lectern_auth_core::AuthError;
use lectern_axum::cookies::clearing_cookies;
use lectern_axum::error::{public_message, ErrorBody, ErrorDetail};

use crate::state::AppState;

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Response marker: the session cookies must be expired on the way out
#[derive(Debug, Clone, Copy)]
pub struct EndSession;

impl ApiError {
    fn status_code(&self) -> u16 {
        match self {
            Self::Auth(e) => e.status_code(),
            Self::BadRequest(_) => 400,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.error_code(),
            Self::BadRequest(_) => "BAD_REQUEST",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Auth(e) => public_message(e),
            Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = axum::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        // Log internal errors
        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.error_code(),
                message: self.message(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(&self, Self::Auth(e) if e.clears_session()) {
            response.extensions_mut().insert(EndSession);
        }
        response
    }
}

/// Middleware expiring both session cookies on responses marked [`EndSession`]
pub async fn clear_ended_sessions(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if response.extensions().get::<EndSession>().is_some() {
        for cookie in clearing_cookies(state.cookies()) {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }
    response
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
