use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use schoolyard_core::AppError;
use schoolyard_models::attendance::{
    AttendanceFilterParams, AttendanceRecord, AttendanceSummary, MarkAttendanceDto,
    MarkAttendanceResponse, MarkTeacherAttendanceDto, PaginatedAttendanceResponse,
    PaginatedTeacherAttendanceResponse, TeacherAttendanceFilterParams, UpdateAttendanceDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::AttendanceService;
use crate::metrics::track_export;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::utils::export::{csv_response, to_csv_bytes, write_attendance_csv};
use crate::validator::ValidatedJson;

/// Mark a classroom's attendance for one date
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendanceDto,
    responses(
        (status = 200, description = "Attendance recorded", body = MarkAttendanceResponse),
        (status = 403, description = "Forbidden - staff only"),
        (status = 422, description = "Empty records or invalid status")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn mark_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
) -> Result<Json<MarkAttendanceResponse>, AppError> {
    let recorded_by = auth_user.user_id()?;
    let response = AttendanceService::mark_attendance(&state.db, dto, recorded_by).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilterParams),
    responses(
        (status = 200, description = "Paginated attendance records", body = PaginatedAttendanceResponse),
        (status = 400, description = "from is after to"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_attendance(
    State(state): State<AppState>,
    Query(filters): Query<AttendanceFilterParams>,
) -> Result<Json<PaginatedAttendanceResponse>, AppError> {
    Ok(Json(AttendanceService::get_attendance(&state.db, filters).await?))
}

/// Counts per status and the attendance rate for the filtered records
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(AttendanceFilterParams),
    responses(
        (status = 200, description = "Attendance summary", body = AttendanceSummary),
        (status = 400, description = "from is after to"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_attendance_summary(
    State(state): State<AppState>,
    Query(filters): Query<AttendanceFilterParams>,
) -> Result<Json<AttendanceSummary>, AppError> {
    Ok(Json(AttendanceService::get_summary(&state.db, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AttendanceFilterParams),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 400, description = "from is after to"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn export_attendance(
    State(state): State<AppState>,
    Query(filters): Query<AttendanceFilterParams>,
) -> Result<Response, AppError> {
    let records = AttendanceService::get_all_attendance(&state.db, &filters).await?;
    let body = to_csv_bytes(|buf| write_attendance_csv(buf, &records))?;
    track_export("attendance");
    Ok(csv_response("attendance", body))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    request_body = UpdateAttendanceDto,
    responses(
        (status = 200, description = "Record updated", body = AttendanceRecord),
        (status = 403, description = "Forbidden - staff only"),
        (status = 404, description = "Record not found")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAttendanceDto>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let recorded_by = auth_user.user_id()?;
    let record = AttendanceService::update_record(&state.db, id, dto, recorded_by).await?;
    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record ID")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Record not found")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_attendance(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    AttendanceService::delete_record(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/attendance/teachers",
    request_body = MarkTeacherAttendanceDto,
    responses(
        (status = 200, description = "Teacher attendance recorded", body = MarkAttendanceResponse),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn mark_teacher_attendance(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<MarkTeacherAttendanceDto>,
) -> Result<Json<MarkAttendanceResponse>, AppError> {
    let recorded_by = admin.user_id()?;
    let response = AttendanceService::mark_teacher_attendance(&state.db, dto, recorded_by).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/attendance/teachers",
    params(TeacherAttendanceFilterParams),
    responses(
        (status = 200, description = "Paginated teacher attendance", body = PaginatedTeacherAttendanceResponse),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teacher_attendance(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filters): Query<TeacherAttendanceFilterParams>,
) -> Result<Json<PaginatedTeacherAttendanceResponse>, AppError> {
    Ok(Json(
        AttendanceService::get_teacher_attendance(&state.db, filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/attendance/teachers/summary",
    params(TeacherAttendanceFilterParams),
    responses(
        (status = 200, description = "Teacher attendance summary", body = AttendanceSummary),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_teacher_attendance_summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filters): Query<TeacherAttendanceFilterParams>,
) -> Result<Json<AttendanceSummary>, AppError> {
    Ok(Json(
        AttendanceService::get_teacher_summary(&state.db, &filters).await?,
    ))
}
