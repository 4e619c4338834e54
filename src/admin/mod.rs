use axum::Router;

use crate::state::AppState;
use crate::{applications, scholarships};

pub mod handlers;
pub mod repo;

/// Back-office surface, mounted under `/admin`. Every handler in here gates
/// on the admin extractor.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::dashboard_routes())
        .merge(scholarships::handlers::admin_routes())
        .merge(applications::handlers::admin_routes())
}
