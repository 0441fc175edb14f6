use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::classrooms::ClassroomWithStats;
use schoolyard_models::results::AcademicYearQuery;
use schoolyard_models::teachers::{
    CreateTeacherDto, PaginatedTeachersResponse, Teacher, TeacherFilterParams, UpdateTeacherDto,
};
use schoolyard_models::timetables::{TimetableEntry, TimetableFilterParams};
use tracing::instrument;
use uuid::Uuid;

use super::service::TeacherService;
use crate::middleware::role::RequireAdmin;
use crate::modules::classrooms::service::ClassroomService;
use crate::modules::timetables::service::TimetableService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/teachers",
    request_body = CreateTeacherDto,
    responses(
        (status = 201, description = "Teacher created", body = Teacher),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Email or employee number already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_teacher(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateTeacherDto>,
) -> Result<(StatusCode, Json<Teacher>), AppError> {
    let teacher = TeacherService::create_teacher(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

#[utoipa::path(
    get,
    path = "/api/teachers",
    params(TeacherFilterParams),
    responses(
        (status = 200, description = "Paginated teachers", body = PaginatedTeachersResponse),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teachers(
    State(state): State<AppState>,
    Query(filters): Query<TeacherFilterParams>,
) -> Result<Json<PaginatedTeachersResponse>, AppError> {
    Ok(Json(TeacherService::get_teachers(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher details", body = Teacher),
        (status = 404, description = "Teacher not found")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teacher(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Teacher>, AppError> {
    Ok(Json(TeacherService::get_teacher_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    request_body = UpdateTeacherDto,
    responses(
        (status = 200, description = "Teacher updated", body = Teacher),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Teacher not found"),
        (status = 409, description = "Email or employee number already exists")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_teacher(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTeacherDto>,
) -> Result<Json<Teacher>, AppError> {
    Ok(Json(TeacherService::update_teacher(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Teacher not found")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_teacher(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TeacherService::delete_teacher(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}/timetable",
    params(("id" = Uuid, Path, description = "Teacher ID"), AcademicYearQuery),
    responses(
        (status = 200, description = "Periods taught by the teacher", body = Vec<TimetableEntry>),
        (status = 404, description = "Teacher not found")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teacher_timetable(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<Vec<TimetableEntry>>, AppError> {
    TeacherService::get_teacher_by_id(&state.db, id).await?;
    let filters = TimetableFilterParams {
        teacher_id: Some(id),
        academic_year: query.academic_year,
        ..Default::default()
    };
    Ok(Json(TimetableService::get_entries(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}/classrooms",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Classrooms where the teacher is homeroom teacher", body = Vec<ClassroomWithStats>),
        (status = 404, description = "Teacher not found")
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teacher_classrooms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ClassroomWithStats>>, AppError> {
    TeacherService::get_teacher_by_id(&state.db, id).await?;
    Ok(Json(ClassroomService::get_homeroom_classrooms(&state.db, id).await?))
}
