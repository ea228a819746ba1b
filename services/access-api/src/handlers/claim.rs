//! Institutional claim handler

use axum::extract::State;
use axum::Json;
use lectern_auth_core::ClaimOutcome;
use lectern_axum::RequireAuth;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Longest enrollment code accepted
const MAX_CODE_LEN: usize = 128;

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub enrollment_code: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    #[serde(flatten)]
    pub outcome: ClaimOutcome,
    /// The caller's access token still carries the old membership snapshot
    pub refresh_required: bool,
}

/// POST /api/v1/institutions/claim
pub async fn claim(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(req): Json<ClaimRequest>,
) -> ApiResult<Json<ClaimResponse>> {
    let code = req.enrollment_code.trim();
    if code.is_empty() || code.len() > MAX_CODE_LEN {
        return Err(ApiError::BadRequest("enrollment_code is invalid".to_string()));
    }

    let outcome = state.claims.claim(auth.user_id(), code).await?;
    Ok(Json(ClaimResponse {
        outcome,
        refresh_required: true,
    }))
}
