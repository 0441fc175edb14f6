use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_core::AppError;
use schoolyard_models::parents::{
    CreateParentDto, PaginatedParentsResponse, Parent, ParentFilterParams, UpdateParentDto,
};
use schoolyard_models::students::Student;
use schoolyard_models::{AssignStudentsDto, BulkAssignResponse};
use tracing::instrument;
use uuid::Uuid;

use super::service::ParentService;
use crate::middleware::access::ensure_parent_access;
use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/parents",
    request_body = CreateParentDto,
    responses(
        (status = 201, description = "Parent created", body = Parent),
        (status = 403, description = "Forbidden - admin only"),
        (status = 409, description = "Email already exists"),
        (status = 422, description = "Validation error")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_parent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateParentDto>,
) -> Result<(StatusCode, Json<Parent>), AppError> {
    let parent = ParentService::create_parent(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(parent)))
}

#[utoipa::path(
    get,
    path = "/api/parents",
    params(ParentFilterParams),
    responses(
        (status = 200, description = "Paginated parents", body = PaginatedParentsResponse),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_parents(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filters): Query<ParentFilterParams>,
) -> Result<Json<PaginatedParentsResponse>, AppError> {
    Ok(Json(ParentService::get_parents(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent ID")),
    responses(
        (status = 200, description = "Parent details", body = Parent),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Parent not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_parent(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Parent>, AppError> {
    ensure_parent_access(&state.db, &auth_user, id).await?;
    Ok(Json(ParentService::get_parent_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent ID")),
    request_body = UpdateParentDto,
    responses(
        (status = 200, description = "Parent updated", body = Parent),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Parent not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_parent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateParentDto>,
) -> Result<Json<Parent>, AppError> {
    Ok(Json(ParentService::update_parent(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/parents/{id}",
    params(("id" = Uuid, Path, description = "Parent ID")),
    responses(
        (status = 204, description = "Parent deleted"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Parent not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_parent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ParentService::delete_parent(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Link students to a parent
#[utoipa::path(
    post,
    path = "/api/parents/{id}/children",
    params(("id" = Uuid, Path, description = "Parent ID")),
    request_body = AssignStudentsDto,
    responses(
        (status = 200, description = "Students linked", body = BulkAssignResponse),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Parent not found"),
        (status = 422, description = "Empty student list")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn assign_children(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignStudentsDto>,
) -> Result<Json<BulkAssignResponse>, AppError> {
    Ok(Json(ParentService::assign_children(&state.db, id, dto).await?))
}

#[utoipa::path(
    get,
    path = "/api/parents/{id}/children",
    params(("id" = Uuid, Path, description = "Parent ID")),
    responses(
        (status = 200, description = "Linked students", body = Vec<Student>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Parent not found")
    ),
    tag = "Parents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_children(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Student>>, AppError> {
    ensure_parent_access(&state.db, &auth_user, id).await?;
    Ok(Json(ParentService::get_children(&state.db, id).await?))
}
