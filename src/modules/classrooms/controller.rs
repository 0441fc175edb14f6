use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::assignments::{AssignmentFilterParams, PaginatedAssignmentsResponse};
use schoolyard_models::classrooms::{
    ClassroomFilterParams, ClassroomWithStats, CreateClassroomDto, PaginatedClassroomsResponse,
    UpdateClassroomDto,
};
use schoolyard_models::exams::{ExamFilterParams, PaginatedExamsResponse};
use schoolyard_models::results::AcademicYearQuery;
use schoolyard_models::students::Student;
use schoolyard_models::timetables::{TimetableEntry, TimetableFilterParams};
use schoolyard_models::{AssignStudentsDto, BulkAssignResponse};
use tracing::instrument;
use uuid::Uuid;

use super::service::ClassroomService;
use crate::middleware::access::ensure_classroom_access;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::assignments::service::AssignmentService;
use crate::modules::exams::service::ExamService;
use crate::modules::timetables::service::TimetableService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/classrooms",
    request_body = CreateClassroomDto,
    responses(
        (status = 201, description = "Classroom created", body = ClassroomWithStats),
        (status = 400, description = "Unknown academic year, hall or teacher"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Duplicate grade and section for the year"),
        (status = 422, description = "Validation error")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_classroom(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateClassroomDto>,
) -> Result<(StatusCode, Json<ClassroomWithStats>), AppError> {
    let classroom = ClassroomService::create_classroom(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(classroom)))
}

#[utoipa::path(
    get,
    path = "/api/classrooms",
    params(ClassroomFilterParams),
    responses(
        (status = 200, description = "Paginated classrooms", body = PaginatedClassroomsResponse),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classrooms(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(filters): Query<ClassroomFilterParams>,
) -> Result<Json<PaginatedClassroomsResponse>, AppError> {
    Ok(Json(ClassroomService::get_classrooms(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/classrooms/{id}",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    responses(
        (status = 200, description = "Classroom details", body = ClassroomWithStats),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Classroom not found")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classroom(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ClassroomWithStats>, AppError> {
    ensure_classroom_access(&state.db, &auth_user, id).await?;
    Ok(Json(ClassroomService::get_classroom_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/classrooms/{id}",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    request_body = UpdateClassroomDto,
    responses(
        (status = 200, description = "Classroom updated", body = ClassroomWithStats),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Classroom not found"),
        (status = 409, description = "Duplicate classroom or capacity below enrolment")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_classroom(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassroomDto>,
) -> Result<Json<ClassroomWithStats>, AppError> {
    Ok(Json(
        ClassroomService::update_classroom(&state.db, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/classrooms/{id}",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    responses(
        (status = 204, description = "Classroom deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Classroom not found"),
        (status = 409, description = "Classroom is still in use")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_classroom(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClassroomService::delete_classroom(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move students into a classroom
#[utoipa::path(
    post,
    path = "/api/classrooms/{id}/students",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    request_body = AssignStudentsDto,
    responses(
        (status = 200, description = "Students assigned", body = BulkAssignResponse),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Classroom not found"),
        (status = 409, description = "Not enough seats left")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn assign_students(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignStudentsDto>,
) -> Result<Json<BulkAssignResponse>, AppError> {
    Ok(Json(
        ClassroomService::assign_students(&state.db, id, dto).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/students",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    responses(
        (status = 200, description = "Students in the classroom", body = Vec<Student>),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Classroom not found")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classroom_students(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Student>>, AppError> {
    Ok(Json(ClassroomService::get_students(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/timetable",
    params(("id" = Uuid, Path, description = "Classroom ID"), AcademicYearQuery),
    responses(
        (status = 200, description = "Weekly timetable", body = Vec<TimetableEntry>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classroom_timetable(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<Vec<TimetableEntry>>, AppError> {
    ensure_classroom_access(&state.db, &auth_user, id).await?;
    let filters = TimetableFilterParams {
        classroom_id: Some(id),
        academic_year: query.academic_year,
        ..Default::default()
    };
    Ok(Json(TimetableService::get_entries(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/exams",
    params(("id" = Uuid, Path, description = "Classroom ID"), ExamFilterParams),
    responses(
        (status = 200, description = "Exams of the classroom", body = PaginatedExamsResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classroom_exams(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<ExamFilterParams>,
) -> Result<Json<PaginatedExamsResponse>, AppError> {
    ensure_classroom_access(&state.db, &auth_user, id).await?;
    filters.classroom_id = Some(id);
    Ok(Json(ExamService::get_exams(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/classrooms/{id}/assignments",
    params(("id" = Uuid, Path, description = "Classroom ID"), AssignmentFilterParams),
    responses(
        (status = 200, description = "Assignments of the classroom", body = PaginatedAssignmentsResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Classrooms",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_classroom_assignments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<AssignmentFilterParams>,
) -> Result<Json<PaginatedAssignmentsResponse>, AppError> {
    ensure_classroom_access(&state.db, &auth_user, id).await?;
    filters.classroom_id = Some(id);
    Ok(Json(
        AssignmentService::get_assignments(&state.db, filters).await?,
    ))
}
