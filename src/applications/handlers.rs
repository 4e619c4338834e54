use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::applications::dto::{AdminApplicationsQuery, ApplyRequest, ReviewRequest};
use crate::applications::repo::{
    self, AdminApplicationRow, Application, ApplicationStatus, APPLICATION_STATUS_NAMES,
};
use crate::applications::services;
use crate::audit::{self, AuditEntry, RequestMeta};
use crate::auth::extractors::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::scholarships::dto::PageParams;
use crate::state::AppState;
use crate::validation::Validator;

pub fn authenticated_routes() -> Router<AppState> {
    Router::new().route("/scholarships/:id/apply", post(apply))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications))
        .route("/applications/:id", put(review_application))
}

#[instrument(skip(state, user, payload))]
pub async fn apply(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    meta: RequestMeta,
    Path(scholarship_id): Path<Uuid>,
    Json(payload): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Application>>), ApiError> {
    let mut v = Validator::new();
    let application_data = match payload.application_data {
        Some(ref data) if data.is_object() => Some(data),
        Some(_) => {
            v.fail("applicationData", "applicationData must be an object");
            None
        }
        None => {
            v.fail("applicationData", "applicationData is required");
            None
        }
    };
    v.finish()?;

    let application =
        services::submit_application(&state.db, scholarship_id, user.id, application_data.unwrap())
            .await?;

    audit::record(
        &state.db,
        AuditEntry::new("application.submit", "applications")
            .actor(user.id)
            .record(application.id)
            .new_values(application.application_data.clone())
            .meta(&meta),
    )
    .await;

    info!(application_id = %application.id, %scholarship_id, user_id = %user.id, "application submitted");
    Ok((StatusCode::CREATED, Json(ApiResponse::data(application))))
}

#[instrument(skip_all)]
pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<AdminApplicationsQuery>,
) -> Result<Json<ApiResponse<Vec<AdminApplicationRow>>>, ApiError> {
    let mut v = Validator::new();
    let status = v.optional_enum::<ApplicationStatus>(
        "status",
        query.status.as_deref(),
        APPLICATION_STATUS_NAMES,
    );
    let page = PageParams::validate(&mut v, query.page, query.limit);
    v.finish()?;

    let rows = repo::list_admin(
        &state.db,
        status,
        query.scholarship_id,
        page.limit,
        page.offset(),
    )
    .await
    .map_err(ApiError::Internal)?;
    Ok(Json(ApiResponse::data(rows)))
}

#[instrument(skip(state, admin, payload))]
pub async fn review_application(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let mut v = Validator::new();
    let status = v.require_enum::<ApplicationStatus>(
        "status",
        payload.status.as_deref(),
        APPLICATION_STATUS_NAMES,
    );
    v.finish()?;
    let status = status.unwrap();

    let old = repo::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    let updated = repo::review(&state.db, id, status, payload.notes.as_deref(), admin.id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    audit::record(
        &state.db,
        AuditEntry::new("application.review", "applications")
            .actor(admin.id)
            .record(id)
            .old_values(serde_json::to_string(&old).unwrap_or_default())
            .new_values(serde_json::to_string(&updated).unwrap_or_default())
            .meta(&meta),
    )
    .await;

    info!(application_id = %id, admin_id = %admin.id, status = ?status, "application reviewed");
    Ok(Json(ApiResponse::data(updated)))
}
