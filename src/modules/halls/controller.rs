use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::BulkAssignResponse;
use schoolyard_models::halls::{
    AssignHallDto, CreateHallDto, Hall, HallAssignment, HallAssignmentFilterParams,
    HallFilterParams, PaginatedHallsResponse, UpdateHallDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::HallService;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/halls",
    request_body = CreateHallDto,
    responses(
        (status = 201, description = "Hall created", body = Hall),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Hall name already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_hall(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateHallDto>,
) -> Result<(StatusCode, Json<Hall>), AppError> {
    let hall = HallService::create_hall(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(hall)))
}

#[utoipa::path(
    get,
    path = "/api/halls",
    params(HallFilterParams),
    responses(
        (status = 200, description = "Paginated halls", body = PaginatedHallsResponse),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_halls(
    State(state): State<AppState>,
    Query(filters): Query<HallFilterParams>,
) -> Result<Json<PaginatedHallsResponse>, AppError> {
    Ok(Json(HallService::get_halls(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/halls/{id}",
    params(("id" = Uuid, Path, description = "Hall ID")),
    responses(
        (status = 200, description = "Hall details", body = Hall),
        (status = 404, description = "Hall not found")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_hall(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hall>, AppError> {
    Ok(Json(HallService::get_hall_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/halls/{id}",
    params(("id" = Uuid, Path, description = "Hall ID")),
    request_body = UpdateHallDto,
    responses(
        (status = 200, description = "Hall updated", body = Hall),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Hall not found"),
        (status = 409, description = "Hall name already exists")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_hall(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateHallDto>,
) -> Result<Json<Hall>, AppError> {
    Ok(Json(HallService::update_hall(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/halls/{id}",
    params(("id" = Uuid, Path, description = "Hall ID")),
    responses(
        (status = 204, description = "Hall deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Hall not found"),
        (status = 409, description = "Hall still has seat assignments")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_hall(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    HallService::delete_hall(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Seat students in the hall for an exam
#[utoipa::path(
    post,
    path = "/api/halls/{id}/assignments",
    params(("id" = Uuid, Path, description = "Hall ID")),
    request_body = AssignHallDto,
    responses(
        (status = 200, description = "Students seated", body = BulkAssignResponse),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Hall not found"),
        (status = 409, description = "Hall capacity exceeded")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn assign_students(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignHallDto>,
) -> Result<Json<BulkAssignResponse>, AppError> {
    Ok(Json(HallService::assign_students(&state.db, id, dto).await?))
}

#[utoipa::path(
    get,
    path = "/api/halls/{id}/assignments",
    params(("id" = Uuid, Path, description = "Hall ID"), HallAssignmentFilterParams),
    responses(
        (status = 200, description = "Seat plan", body = Vec<HallAssignment>),
        (status = 404, description = "Hall not found")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(filters): Query<HallAssignmentFilterParams>,
) -> Result<Json<Vec<HallAssignment>>, AppError> {
    Ok(Json(HallService::get_assignments(&state.db, id, filters).await?))
}

#[utoipa::path(
    delete,
    path = "/api/halls/{id}/assignments/{assignment_id}",
    params(
        ("id" = Uuid, Path, description = "Hall ID"),
        ("assignment_id" = Uuid, Path, description = "Assignment ID")
    ),
    responses(
        (status = 204, description = "Seat released"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Halls",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, assignment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    HallService::delete_assignment(&state.db, id, assignment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
