use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::exams::{
    CreateExamDto, Exam, ExamFilterParams, PaginatedExamsResponse, UpdateExamDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::ExamService;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/exams",
    request_body = CreateExamDto,
    responses(
        (status = 201, description = "Exam scheduled", body = Exam),
        (status = 400, description = "Unknown subject, classroom, hall or academic year"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_exam(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateExamDto>,
) -> Result<(StatusCode, Json<Exam>), AppError> {
    let exam = ExamService::create_exam(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[utoipa::path(
    get,
    path = "/api/exams",
    params(ExamFilterParams),
    responses(
        (status = 200, description = "Paginated exams", body = PaginatedExamsResponse),
        (status = 400, description = "from is after to"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_exams(
    State(state): State<AppState>,
    Query(filters): Query<ExamFilterParams>,
) -> Result<Json<PaginatedExamsResponse>, AppError> {
    Ok(Json(ExamService::get_exams(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Exam details", body = Exam),
        (status = 404, description = "Exam not found")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_exam(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(ExamService::get_exam_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    request_body = UpdateExamDto,
    responses(
        (status = 200, description = "Exam updated", body = Exam),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Exam not found"),
        (status = 422, description = "end_time not after start_time")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_exam(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateExamDto>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(ExamService::update_exam(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 204, description = "Exam deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Exam not found")
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_exam(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ExamService::delete_exam(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
