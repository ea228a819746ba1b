//! Entitlement handlers

use axum::extract::{Path, State};
use axum::Json;
use lectern_auth_core::AuthError;
use lectern_axum::{MaybeAuth, RequireAuth};
use lectern_types::{AccessDecision, CourseId, GrantPath, LessonId};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub granted: bool,
    pub via: GrantPath,
}

/// Granted decisions become a body; denials become their status code
fn respond(decision: AccessDecision) -> ApiResult<Json<AccessResponse>> {
    match decision {
        AccessDecision::Granted { via } => Ok(Json(AccessResponse { granted: true, via })),
        AccessDecision::Denied { reason } => Err(AuthError::Forbidden(reason).into()),
    }
}

/// GET /api/v1/lessons/{lesson_id}/access
pub async fn lesson_access(
    State(state): State<AppState>,
    auth: MaybeAuth,
    Path(lesson_id): Path<LessonId>,
) -> ApiResult<Json<AccessResponse>> {
    let user = auth.as_ref().map(|claims| claims.user_id());
    respond(state.entitlements.can_access_lesson(user, lesson_id).await?)
}

/// GET /api/v1/courses/{course_id}/access
pub async fn course_access(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(course_id): Path<CourseId>,
) -> ApiResult<Json<AccessResponse>> {
    respond(
        state
            .entitlements
            .can_access_course(auth.user_id(), course_id)
            .await?,
    )
}
