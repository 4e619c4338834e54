use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::audit::{self, AuditEntry, RequestMeta};
use crate::auth::extractors::AdminUser;
use crate::error::ApiError;
use crate::response::{ApiResponse, Pagination};
use crate::scholarships::dto::{
    AdminScholarshipResponse, AdminScholarshipsQuery, CreateScholarshipRequest, CreatedScholarship,
    ListScholarshipsQuery, PageParams, ScholarshipResponse, UpdateScholarshipRequest,
};
use crate::scholarships::repo::{
    self, Category, PublicFilter, ScholarshipStatus, CATEGORY_NAMES, STATUS_NAMES,
};
use crate::state::AppState;
use crate::validation::Validator;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/scholarships", get(list_scholarships))
        .route("/scholarships/:id", get(get_scholarship))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/scholarships",
            get(list_admin_scholarships).post(create_scholarship),
        )
        .route(
            "/scholarships/:id",
            put(update_scholarship).delete(delete_scholarship),
        )
}

#[instrument(skip(state))]
pub async fn list_scholarships(
    State(state): State<AppState>,
    Query(query): Query<ListScholarshipsQuery>,
) -> Result<Json<ApiResponse<Vec<ScholarshipResponse>>>, ApiError> {
    let mut v = Validator::new();
    let category = v.optional_enum::<Category>("category", query.category.as_deref(), CATEGORY_NAMES);
    let page = PageParams::validate(&mut v, query.page, query.limit);
    v.finish()?;

    let filter = PublicFilter {
        category,
        search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        min_amount: query.min_amount.unwrap_or(0.0),
        max_amount: query.max_amount.unwrap_or(999_999.0),
    };

    let scholarships = repo::list_public(&state.db, &filter, page.limit, page.offset())
        .await
        .map_err(ApiError::Internal)?;
    let total = repo::count_public(&state.db, &filter)
        .await
        .map_err(ApiError::Internal)?;

    let data = scholarships.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::page(
        data,
        Pagination::new(page.page, page.limit, total),
    )))
}

#[instrument(skip(state))]
pub async fn get_scholarship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScholarshipResponse>>, ApiError> {
    let scholarship = repo::get_active(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Scholarship"))?;
    Ok(Json(ApiResponse::data(scholarship.into())))
}

#[instrument(skip_all)]
pub async fn list_admin_scholarships(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<AdminScholarshipsQuery>,
) -> Result<Json<ApiResponse<Vec<AdminScholarshipResponse>>>, ApiError> {
    let mut v = Validator::new();
    let status =
        v.optional_enum::<ScholarshipStatus>("status", query.status.as_deref(), STATUS_NAMES);
    let category =
        v.optional_enum::<Category>("category", query.category.as_deref(), CATEGORY_NAMES);
    let page = PageParams::validate(&mut v, query.page, query.limit);
    v.finish()?;

    let rows = repo::list_admin(&state.db, status, category, page.limit, page.offset())
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(ApiResponse::data(
        rows.into_iter().map(Into::into).collect(),
    )))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_scholarship(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Json(payload): Json<CreateScholarshipRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedScholarship>>), ApiError> {
    let new = payload.validate()?;

    let scholarship = repo::create(&state.db, &new, admin.id)
        .await
        .map_err(ApiError::Internal)?;

    audit::record(
        &state.db,
        AuditEntry::new("scholarship.create", "scholarships")
            .actor(admin.id)
            .record(scholarship.id)
            .new_values(serde_json::to_string(&new).unwrap_or_default())
            .meta(&meta),
    )
    .await;

    info!(scholarship_id = %scholarship.id, admin_id = %admin.id, "scholarship created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(CreatedScholarship {
            id: scholarship.id,
        })),
    ))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_scholarship(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateScholarshipRequest>,
) -> Result<Json<ApiResponse<ScholarshipResponse>>, ApiError> {
    let patch = payload.validate()?;

    let old = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Scholarship"))?;

    let updated = repo::update(&state.db, id, &patch)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Scholarship"))?;

    audit::record(
        &state.db,
        AuditEntry::new("scholarship.update", "scholarships")
            .actor(admin.id)
            .record(id)
            .old_values(serde_json::to_string(&old).unwrap_or_default())
            .new_values(serde_json::to_string(&patch).unwrap_or_default())
            .meta(&meta),
    )
    .await;

    info!(scholarship_id = %id, admin_id = %admin.id, "scholarship updated");
    Ok(Json(ApiResponse::data(updated.into())))
}

#[instrument(skip(state, admin))]
pub async fn delete_scholarship(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    meta: RequestMeta,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let old = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Scholarship"))?;

    if !repo::delete(&state.db, id).await.map_err(ApiError::Internal)? {
        return Err(ApiError::not_found("Scholarship"));
    }

    audit::record(
        &state.db,
        AuditEntry::new("scholarship.delete", "scholarships")
            .actor(admin.id)
            .record(id)
            .old_values(serde_json::to_string(&old).unwrap_or_default())
            .meta(&meta),
    )
    .await;

    info!(scholarship_id = %id, admin_id = %admin.id, "scholarship deleted");
    Ok(Json(ApiResponse::message("Scholarship deleted successfully")))
}
