use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use schoolyard_core::AppError;
use schoolyard_models::attendance::{
    AttendanceFilterParams, AttendanceSummary, PaginatedAttendanceResponse,
};
use schoolyard_models::halls::HallAssignment;
use schoolyard_models::payments::{PaginatedPaymentsResponse, PaymentFilterParams};
use schoolyard_models::results::{
    AcademicYearQuery, PaginatedResultsResponse, ResultFilterParams, ResultSummary,
};
use schoolyard_models::students::{
    CreateStudentDto, PaginatedStudentsResponse, Student, StudentFilterParams, UpdateStudentDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::StudentService;
use crate::metrics::track_export;
use crate::middleware::access::ensure_student_access;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::{RequireAdmin, RequireStaff};
use crate::modules::attendance::service::AttendanceService;
use crate::modules::halls::service::HallService;
use crate::modules::payments::service::PaymentService;
use crate::modules::results::service::ResultService;
use crate::state::AppState;
use crate::utils::export::{csv_response, to_csv_bytes, write_students_csv};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Email or admission number already exists, or classroom is full"),
        (status = 422, description = "Validation error")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = StudentService::create_student(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated students", body = PaginatedStudentsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    Ok(Json(StudentService::get_students(&state.db, filters).await?))
}

/// Download the filtered student list as CSV
#[utoipa::path(
    get,
    path = "/api/students/export",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn export_students(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Response, AppError> {
    let students = StudentService::get_all_students(&state.db, &filters).await?;
    let body = to_csv_bytes(|buf| write_students_csv(buf, &students))?;
    track_export("students");
    Ok(csv_response("students", body))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student details", body = Student),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Student>, AppError> {
    ensure_student_access(&state.db, &auth_user, id, true).await?;
    Ok(Json(StudentService::get_student_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Student not found"),
        (status = 409, description = "Email or admission number already exists, or classroom is full"),
        (status = 422, description = "Validation error")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<Student>, AppError> {
    Ok(Json(StudentService::update_student(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    StudentService::delete_student(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/attendance",
    params(("id" = Uuid, Path, description = "Student ID"), AttendanceFilterParams),
    responses(
        (status = 200, description = "The student's attendance records", body = PaginatedAttendanceResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<AttendanceFilterParams>,
) -> Result<Json<PaginatedAttendanceResponse>, AppError> {
    ensure_student_access(&state.db, &auth_user, id, true).await?;
    filters.student_id = Some(id);
    Ok(Json(AttendanceService::get_attendance(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/attendance/summary",
    params(("id" = Uuid, Path, description = "Student ID"), AttendanceFilterParams),
    responses(
        (status = 200, description = "Attendance counts and rate", body = AttendanceSummary),
        (status = 400, description = "from is after to"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_attendance_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<AttendanceFilterParams>,
) -> Result<Json<AttendanceSummary>, AppError> {
    ensure_student_access(&state.db, &auth_user, id, true).await?;
    filters.student_id = Some(id);
    Ok(Json(AttendanceService::get_summary(&state.db, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/results",
    params(("id" = Uuid, Path, description = "Student ID"), ResultFilterParams),
    responses(
        (status = 200, description = "The student's results", body = PaginatedResultsResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_results(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<ResultFilterParams>,
) -> Result<Json<PaginatedResultsResponse>, AppError> {
    ensure_student_access(&state.db, &auth_user, id, true).await?;
    filters.student_id = Some(id);
    Ok(Json(ResultService::get_results(&state.db, filters).await?))
}

/// Per-subject totals, average and overall grade
#[utoipa::path(
    get,
    path = "/api/students/{id}/results/summary",
    params(("id" = Uuid, Path, description = "Student ID"), AcademicYearQuery),
    responses(
        (status = 200, description = "Result summary", body = ResultSummary),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Student not found")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_result_summary(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<AcademicYearQuery>,
) -> Result<Json<ResultSummary>, AppError> {
    ensure_student_access(&state.db, &auth_user, id, true).await?;
    let summary = ResultService::get_student_summary(&state.db, id, query.academic_year).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/payments",
    params(("id" = Uuid, Path, description = "Student ID"), PaymentFilterParams),
    responses(
        (status = 200, description = "The student's payments", body = PaginatedPaymentsResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_payments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    Query(mut filters): Query<PaymentFilterParams>,
) -> Result<Json<PaginatedPaymentsResponse>, AppError> {
    ensure_student_access(&state.db, &auth_user, id, false).await?;
    filters.student_id = Some(id);
    Ok(Json(PaymentService::get_payments(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/hall-assignments",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Exam seats of the student", body = Vec<HallAssignment>),
        (status = 403, description = "Forbidden")
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_student_hall_assignments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HallAssignment>>, AppError> {
    ensure_student_access(&state.db, &auth_user, id, true).await?;
    Ok(Json(HallService::get_student_assignments(&state.db, id).await?))
}
