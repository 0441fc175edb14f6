use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use schoolyard_core::AppError;
use schoolyard_models::results::{
    CreateResultDto, PaginatedResultsResponse, ResultFilterParams, StudentResult, UpdateResultDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::ResultService;
use crate::metrics::track_export;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::utils::export::{csv_response, to_csv_bytes, write_results_csv};
use crate::validator::ValidatedJson;

/// Record a student's scores for a subject
#[utoipa::path(
    post,
    path = "/api/results",
    request_body = CreateResultDto,
    responses(
        (status = 201, description = "Result recorded with total and grade", body = StudentResult),
        (status = 400, description = "Unknown student, subject or academic year"),
        (status = 403, description = "Forbidden - staff only"),
        (status = 409, description = "Result already exists"),
        (status = 422, description = "Score out of range")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_result(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateResultDto>,
) -> Result<(StatusCode, Json<StudentResult>), AppError> {
    let recorded_by = auth_user.user_id()?;
    let result = ResultService::create_result(&state.db, dto, recorded_by).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    get,
    path = "/api/results",
    params(ResultFilterParams),
    responses(
        (status = 200, description = "Paginated results", body = PaginatedResultsResponse),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_results(
    State(state): State<AppState>,
    Query(filters): Query<ResultFilterParams>,
) -> Result<Json<PaginatedResultsResponse>, AppError> {
    Ok(Json(ResultService::get_results(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/results/export",
    params(ResultFilterParams),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn export_results(
    State(state): State<AppState>,
    Query(filters): Query<ResultFilterParams>,
) -> Result<Response, AppError> {
    let results = ResultService::get_all_results(&state.db, &filters).await?;
    let body = to_csv_bytes(|buf| write_results_csv(buf, &results))?;
    track_export("results");
    Ok(csv_response("results", body))
}

#[utoipa::path(
    get,
    path = "/api/results/{id}",
    params(("id" = Uuid, Path, description = "Result ID")),
    responses(
        (status = 200, description = "Result details", body = StudentResult),
        (status = 404, description = "Result not found")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentResult>, AppError> {
    Ok(Json(ResultService::get_result_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/results/{id}",
    params(("id" = Uuid, Path, description = "Result ID")),
    request_body = UpdateResultDto,
    responses(
        (status = 200, description = "Result updated", body = StudentResult),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Result not found"),
        (status = 422, description = "Score out of range")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_result(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateResultDto>,
) -> Result<Json<StudentResult>, AppError> {
    let recorded_by = auth_user.user_id()?;
    Ok(Json(
        ResultService::update_result(&state.db, id, dto, recorded_by).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/results/{id}",
    params(("id" = Uuid, Path, description = "Result ID")),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Result not found")
    ),
    tag = "Results",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_result(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ResultService::delete_result(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
