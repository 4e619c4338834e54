use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::admin::repo::{
    self, ApplicationStats, RecentApplication, ScholarshipStats, UserStats,
};
use crate::auth::extractors::AdminUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

/// Four independent read-only summaries; nothing here caches or mutates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub scholarships: ScholarshipStats,
    pub applications: ApplicationStats,
    pub users: UserStats,
    pub recent_applications: Vec<RecentApplication>,
}

#[instrument(skip_all)]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<DashboardResponse>>, ApiError> {
    let scholarships = repo::scholarship_stats(&state.db)
        .await
        .map_err(ApiError::Internal)?;
    let applications = repo::application_stats(&state.db)
        .await
        .map_err(ApiError::Internal)?;
    let users = repo::user_stats(&state.db).await.map_err(ApiError::Internal)?;
    let recent_applications = repo::recent_applications(&state.db, 10)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(ApiResponse::data(DashboardResponse {
        scholarships,
        applications,
        users,
        recent_applications,
    })))
}
