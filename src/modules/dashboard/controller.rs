use axum::{Json, extract::State};
use schoolyard_core::AppError;
use schoolyard_models::dashboard::DashboardStats;
use tracing::instrument;

use super::service::DashboardService;
use crate::state::AppState;

/// Headcounts, today's attendance, fee totals and the next exams
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(DashboardService::get_stats(&state.db).await?))
}
