use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::announcements::{
    Announcement, AnnouncementFilterParams, CreateAnnouncementDto,
    PaginatedAnnouncementsResponse, UpdateAnnouncementDto,
};
use tracing::instrument;
use uuid::Uuid;

use super::service::AnnouncementService;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/announcements",
    request_body = CreateAnnouncementDto,
    responses(
        (status = 201, description = "Announcement published", body = Announcement),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_announcement(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateAnnouncementDto>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    let created_by = admin.user_id()?;
    let announcement =
        AnnouncementService::create_announcement(&state.db, dto, created_by).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// Announcements visible to the caller's role
#[utoipa::path(
    get,
    path = "/api/announcements",
    params(AnnouncementFilterParams),
    responses(
        (status = 200, description = "Paginated announcements", body = PaginatedAnnouncementsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_announcements(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<AnnouncementFilterParams>,
) -> Result<Json<PaginatedAnnouncementsResponse>, AppError> {
    Ok(Json(
        AnnouncementService::get_announcements(&state.db, auth_user.role(), filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 200, description = "Announcement", body = Announcement),
        (status = 404, description = "Announcement not found")
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, AppError> {
    Ok(Json(
        AnnouncementService::get_announcement_by_id(&state.db, id, auth_user.role()).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    request_body = UpdateAnnouncementDto,
    responses(
        (status = 200, description = "Announcement updated", body = Announcement),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Announcement not found")
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_announcement(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAnnouncementDto>,
) -> Result<Json<Announcement>, AppError> {
    Ok(Json(
        AnnouncementService::update_announcement(&state.db, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/announcements/{id}",
    params(("id" = Uuid, Path, description = "Announcement ID")),
    responses(
        (status = 204, description = "Announcement deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Announcement not found")
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_announcement(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    AnnouncementService::delete_announcement(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
