use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::timetables::{
    CreateTimetableEntryDto, TimetableEntry, TimetableFilterParams, UpdateTimetableEntryDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::TimetableService;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/timetables",
    request_body = CreateTimetableEntryDto,
    responses(
        (status = 201, description = "Entry created", body = TimetableEntry),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Classroom or teacher already booked"),
        (status = 422, description = "Validation error")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_entry(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateTimetableEntryDto>,
) -> Result<(StatusCode, Json<TimetableEntry>), AppError> {
    let entry = TimetableService::create_entry(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    get,
    path = "/api/timetables",
    params(TimetableFilterParams),
    responses(
        (status = 200, description = "Entries ordered by day and start time", body = Vec<TimetableEntry>),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_entries(
    State(state): State<AppState>,
    Query(filters): Query<TimetableFilterParams>,
) -> Result<Json<Vec<TimetableEntry>>, AppError> {
    Ok(Json(TimetableService::get_entries(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/timetables/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 200, description = "Entry details", body = TimetableEntry),
        (status = 404, description = "Entry not found")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimetableEntry>, AppError> {
    Ok(Json(TimetableService::get_entry_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/timetables/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    request_body = UpdateTimetableEntryDto,
    responses(
        (status = 200, description = "Entry updated", body = TimetableEntry),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Classroom or teacher already booked")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_entry(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateTimetableEntryDto>,
) -> Result<Json<TimetableEntry>, AppError> {
    Ok(Json(TimetableService::update_entry(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/timetables/{id}",
    params(("id" = Uuid, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Timetables",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TimetableService::delete_entry(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
