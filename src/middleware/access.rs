//! Self-service access checks.
//!
//! Staff routes are guarded by role alone. Students and parents may also read
//! data about themselves (or their children), which needs a lookup.

use schoolyard_auth::UserRole;
use schoolyard_core::AppError;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

fn denied() -> AppError {
    AppError::forbidden("Access denied. You may only view your own records.")
}

/// Allows admins, teachers when `teachers_allowed`, the student themself and
/// the student's parent.
#[instrument(skip(db, auth_user), fields(role = %auth_user.role()))]
pub async fn ensure_student_access(
    db: &PgPool,
    auth_user: &AuthUser,
    student_id: Uuid,
    teachers_allowed: bool,
) -> Result<(), AppError> {
    match auth_user.role() {
        UserRole::Admin => Ok(()),
        UserRole::Teacher if teachers_allowed => Ok(()),
        UserRole::Teacher => Err(denied()),
        UserRole::Student | UserRole::Parent => {
            let user_id = auth_user.user_id()?;
            let allowed = sqlx::query_scalar::<_, bool>(
                r#"SELECT EXISTS(
                       SELECT 1 FROM students s
                       LEFT JOIN parents p ON p.id = s.parent_id
                       WHERE s.id = $1 AND (s.user_id = $2 OR p.user_id = $2)
                   )"#,
            )
            .bind(student_id)
            .bind(user_id)
            .fetch_one(db)
            .await?;

            if allowed { Ok(()) } else { Err(denied()) }
        }
    }
}

/// Allows staff, students of the classroom and parents of a student in it.
#[instrument(skip(db, auth_user), fields(role = %auth_user.role()))]
pub async fn ensure_classroom_access(
    db: &PgPool,
    auth_user: &AuthUser,
    classroom_id: Uuid,
) -> Result<(), AppError> {
    if auth_user.is_staff() {
        return Ok(());
    }

    let user_id = auth_user.user_id()?;
    let allowed = sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(
               SELECT 1 FROM students s
               LEFT JOIN parents p ON p.id = s.parent_id
               WHERE s.classroom_id = $1 AND (s.user_id = $2 OR p.user_id = $2)
           )"#,
    )
    .bind(classroom_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;

    if allowed { Ok(()) } else { Err(denied()) }
}

/// Allows admins and the parent themself.
#[instrument(skip(db, auth_user), fields(role = %auth_user.role()))]
pub async fn ensure_parent_access(
    db: &PgPool,
    auth_user: &AuthUser,
    parent_id: Uuid,
) -> Result<(), AppError> {
    match auth_user.role() {
        UserRole::Admin => Ok(()),
        UserRole::Parent => {
            let user_id = auth_user.user_id()?;
            let allowed = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM parents WHERE id = $1 AND user_id = $2)",
            )
            .bind(parent_id)
            .bind(user_id)
            .fetch_one(db)
            .await?;

            if allowed { Ok(()) } else { Err(denied()) }
        }
        _ => Err(denied()),
    }
}
