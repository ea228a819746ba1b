//! Authentication handlers (register, login, refresh, logout, me, sessions)

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use lectern_auth_core::{AccessClaims, AuthError, IssuedSession};
use lectern_axum::cookies::{clearing_cookies, session_cookies};
use lectern_axum::credential::rotation_credential;
use lectern_axum::RequireAuth;
use lectern_types::{MembershipClaim, Role, SessionInfo, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Minimum accepted password length
const MIN_PASSWORD_LEN: usize = 8;

/// Maximum accepted password length (bounds hashing cost)
const MAX_PASSWORD_LEN: usize = 256;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub memberships: Vec<MembershipClaim>,
}

impl From<&AccessClaims> for UserInfo {
    fn from(claims: &AccessClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            role: claims.role,
            memberships: claims.memberships.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevokedResponse {
    pub revoked: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionInfo>,
}

// ============================================================================
// Helpers
// ============================================================================

fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Cookies plus body for a freshly issued pair
fn issued(state: &AppState, status: StatusCode, session: IssuedSession) -> impl IntoResponse {
    let [access, rotation] = session_cookies(state.cookies(), &session.tokens);
    let body = SessionResponse {
        access_token: session.tokens.access_token,
        token_type: "Bearer",
        expires_in: session.tokens.access_expires_in,
        user: UserInfo::from(&session.claims),
    };
    (
        status,
        AppendHeaders([(header::SET_COOKIE, access), (header::SET_COOKIE, rotation)]),
        Json(body),
    )
}

fn ended(state: &AppState) -> AppendHeaders<[(header::HeaderName, String); 2]> {
    let [access, rotation] = clearing_cookies(state.cookies());
    AppendHeaders([(header::SET_COOKIE, access), (header::SET_COOKIE, rotation)])
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("email is invalid".to_string()));
    }
    validate_password(&req.password)?;

    let session = state.sessions.register(&req.email, &req.password).await?;
    Ok(issued(&state, StatusCode::CREATED, session))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let session = state.sessions.login(&req.email, &req.password).await?;
    Ok(issued(&state, StatusCode::OK, session))
}

/// POST /api/v1/auth/refresh
///
/// Exchange the rotation cookie for a new pair
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let secret =
        rotation_credential(&headers, state.cookies()).ok_or(AuthError::MissingCredential)?;
    let session = state.sessions.rotate(secret).await?;
    Ok(issued(&state, StatusCode::OK, session))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented rotation token and expire both cookies
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(secret) = rotation_credential(&headers, state.cookies()) {
        state.sessions.logout(secret).await?;
    }
    Ok((StatusCode::NO_CONTENT, ended(&state)))
}

/// POST /api/v1/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> ApiResult<impl IntoResponse> {
    let revoked = state.sessions.logout_all(auth.user_id()).await?;
    Ok((ended(&state), Json(RevokedResponse { revoked })))
}

/// POST /api/v1/auth/password
///
/// Change the caller's password; every session ends
pub async fn change_password(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<PasswordChangeRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_password(&req.new_password)?;
    let revoked = state
        .sessions
        .reset_password(auth.user_id(), &req.new_password)
        .await?;
    Ok((ended(&state), Json(RevokedResponse { revoked })))
}

/// GET /api/v1/auth/me
pub async fn me(auth: RequireAuth) -> Json<UserInfo> {
    Json(UserInfo::from(&auth.0))
}

/// GET /api/v1/auth/sessions
pub async fn sessions(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> ApiResult<Json<SessionsResponse>> {
    let sessions = state.sessions.active_sessions(auth.user_id()).await?;
    Ok(Json(SessionsResponse { sessions }))
}
