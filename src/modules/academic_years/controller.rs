use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::academic_years::{AcademicYear, CreateAcademicYearDto};
use tracing::instrument;
use uuid::Uuid;

use super::service::AcademicYearService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/academic-years",
    request_body = CreateAcademicYearDto,
    responses(
        (status = 201, description = "Academic year created", body = AcademicYear),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Academic year already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn create_academic_year(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateAcademicYearDto>,
) -> Result<(StatusCode, Json<AcademicYear>), AppError> {
    let year = AcademicYearService::create(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(year)))
}

#[utoipa::path(
    get,
    path = "/api/academic-years",
    responses(
        (status = 200, description = "All academic years, newest first", body = Vec<AcademicYear>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_academic_years(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<AcademicYear>>, AppError> {
    Ok(Json(AcademicYearService::list(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/current",
    responses(
        (status = 200, description = "Current academic year", body = AcademicYear),
        (status = 404, description = "No academic year is current")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_current_academic_year(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<AcademicYear>, AppError> {
    Ok(Json(AcademicYearService::current(&state.db).await?))
}

#[utoipa::path(
    patch,
    path = "/api/academic-years/{id}/current",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Academic year marked current", body = AcademicYear),
        (status = 404, description = "Academic year not found")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn set_current_academic_year(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicYear>, AppError> {
    Ok(Json(AcademicYearService::set_current(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/academic-years/{id}",
    params(("id" = Uuid, Path, description = "Academic year ID")),
    responses(
        (status = 204, description = "Academic year deleted"),
        (status = 404, description = "Academic year not found"),
        (status = 409, description = "Academic year is still in use")
    ),
    tag = "Academic Years",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_academic_year(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    AcademicYearService::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
