use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use schoolyard_auth::UserRole;
use schoolyard_core::AppError;
use schoolyard_models::assignments::{
    Assignment, AssignmentFilterParams, CreateAssignmentDto, PaginatedAssignmentsResponse,
    UpdateAssignmentDto,
};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::service::AssignmentService;
use crate::middleware::auth::AuthUser;
use crate::modules::teachers::service::TeacherService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// The teacher profile behind a teacher's token.
async fn own_teacher_id(db: &PgPool, auth_user: &AuthUser) -> Result<Uuid, AppError> {
    let user_id = auth_user.user_id()?;
    TeacherService::find_teacher_id_for_user(db, user_id)
        .await?
        .ok_or_else(|| AppError::forbidden("No teacher profile is linked to this account"))
}

/// Teachers may only change assignments they created.
async fn ensure_owner(db: &PgPool, auth_user: &AuthUser, assignment_id: Uuid) -> Result<(), AppError> {
    if auth_user.role() != UserRole::Teacher {
        return Ok(());
    }
    let teacher_id = own_teacher_id(db, auth_user).await?;
    let assignment = AssignmentService::get_assignment_by_id(db, assignment_id).await?;
    if assignment.teacher_id != teacher_id {
        return Err(AppError::forbidden(
            "Access denied. You may only change your own assignments.",
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/assignments",
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 403, description = "Forbidden - staff only"),
        (status = 422, description = "Validation error or missing teacher_id")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    let teacher_id = match auth_user.role() {
        UserRole::Teacher => own_teacher_id(&state.db, &auth_user).await?,
        _ => dto.teacher_id.ok_or_else(|| {
            AppError::unprocessable(anyhow!("teacher_id is required"))
        })?,
    };
    let assignment = AssignmentService::create_assignment(&state.db, dto, teacher_id).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    get,
    path = "/api/assignments",
    params(AssignmentFilterParams),
    responses(
        (status = 200, description = "Paginated assignments", body = PaginatedAssignmentsResponse),
        (status = 400, description = "due_from is after due_to"),
        (status = 403, description = "Forbidden - staff only")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignments(
    State(state): State<AppState>,
    Query(filters): Query<AssignmentFilterParams>,
) -> Result<Json<PaginatedAssignmentsResponse>, AppError> {
    Ok(Json(
        AssignmentService::get_assignments(&state.db, filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment details", body = Assignment),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, AppError> {
    Ok(Json(
        AssignmentService::get_assignment_by_id(&state.db, id).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    request_body = UpdateAssignmentDto,
    responses(
        (status = 200, description = "Assignment updated", body = Assignment),
        (status = 403, description = "Not the owning teacher"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateAssignmentDto>,
) -> Result<Json<Assignment>, AppError> {
    ensure_owner(&state.db, &auth_user, id).await?;
    Ok(Json(
        AssignmentService::update_assignment(&state.db, id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 403, description = "Not the owning teacher"),
        (status = 404, description = "Assignment not found")
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ensure_owner(&state.db, &auth_user, id).await?;
    AssignmentService::delete_assignment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
