//! Administration handlers: roster uploads, course grants, subscriptions
//!
//! Organization routes require the caller to be a verified admin of the
//! organization in the path (platform admins pass). The subscription route
//! requires the platform-admin role. Both checks read only the token snapshot.

use axum::extract::{Path, State};
use axum::Json;
use lectern_auth_core::{require_org_role, require_role, FanoutReport, RosterEntry, RosterIngestReport};
use lectern_axum::RequireAuth;
use lectern_types::{BatchId, CourseId, OrgRole, OrganizationId, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Most rows accepted in one roster upload
const MAX_ROSTER_ROWS: usize = 5_000;

#[derive(Debug, Deserialize)]
pub struct RosterUpload {
    pub rows: Vec<RosterEntry>,
}

#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub course_id: CourseId,
    pub enrollments: FanoutReport,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub course_id: CourseId,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub user_id: UserId,
    pub premium: bool,
    /// `None` when the fan-out could not run; it is safe to retry
    pub enrollments: Option<FanoutReport>,
}

/// POST /api/v1/orgs/{org_id}/roster
pub async fn upload_roster(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(org_id): Path<OrganizationId>,
    Json(upload): Json<RosterUpload>,
) -> ApiResult<Json<RosterIngestReport>> {
    require_org_role(&auth, org_id, &[OrgRole::Admin])?;
    if upload.rows.len() > MAX_ROSTER_ROWS {
        return Err(ApiError::BadRequest(format!(
            "roster uploads are limited to {MAX_ROSTER_ROWS} rows"
        )));
    }

    let report = state.claims.ingest_roster(org_id, &upload.rows).await?;
    Ok(Json(report))
}

/// PUT /api/v1/orgs/{org_id}/courses/{course_id}
pub async fn grant_org_course(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((org_id, course_id)): Path<(OrganizationId, CourseId)>,
) -> ApiResult<Json<GrantResponse>> {
    require_org_role(&auth, org_id, &[OrgRole::Admin])?;
    let enrollments = state.fanout.grant_org_course(org_id, course_id).await?;
    Ok(Json(GrantResponse {
        course_id,
        enrollments,
    }))
}

/// DELETE /api/v1/orgs/{org_id}/courses/{course_id}
pub async fn revoke_org_course(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((org_id, course_id)): Path<(OrganizationId, CourseId)>,
) -> ApiResult<Json<RevokeResponse>> {
    require_org_role(&auth, org_id, &[OrgRole::Admin])?;
    let removed = state.fanout.revoke_org_course(org_id, course_id).await?;
    Ok(Json(RevokeResponse { course_id, removed }))
}

/// PUT /api/v1/orgs/{org_id}/batches/{batch_id}/courses/{course_id}
pub async fn grant_batch_course(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((org_id, batch_id, course_id)): Path<(OrganizationId, BatchId, CourseId)>,
) -> ApiResult<Json<GrantResponse>> {
    require_org_role(&auth, org_id, &[OrgRole::Admin])?;
    let batch_id = state.fanout.batch_in_organization(org_id, batch_id).await?;
    let enrollments = state.fanout.grant_batch_course(batch_id, course_id).await?;
    Ok(Json(GrantResponse {
        course_id,
        enrollments,
    }))
}

/// DELETE /api/v1/orgs/{org_id}/batches/{batch_id}/courses/{course_id}
pub async fn revoke_batch_course(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path((org_id, batch_id, course_id)): Path<(OrganizationId, BatchId, CourseId)>,
) -> ApiResult<Json<RevokeResponse>> {
    require_org_role(&auth, org_id, &[OrgRole::Admin])?;
    let batch_id = state.fanout.batch_in_organization(org_id, batch_id).await?;
    let removed = state.fanout.revoke_batch_course(batch_id, course_id).await?;
    Ok(Json(RevokeResponse { course_id, removed }))
}

/// POST /api/v1/admin/users/{user_id}/subscription
///
/// Called once a payment is confirmed
pub async fn activate_subscription(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(user_id): Path<UserId>,
) -> ApiResult<Json<SubscriptionResponse>> {
    require_role(&auth, &[Role::PlatformAdmin])?;
    let enrollments = state.fanout.activate_subscription(user_id).await?;
    Ok(Json(SubscriptionResponse {
        user_id,
        premium: true,
        enrollments,
    }))
}
