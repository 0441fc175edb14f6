use anyhow::Context;
use schoolyard_auth::UserRole;
use schoolyard_core::{AppError, PaginationMeta, hash_password, normalize_email};
use schoolyard_models::parents::{
    CreateParentDto, PaginatedParentsResponse, Parent, ParentFilterParams, UpdateParentDto,
};
use schoolyard_models::students::Student;
use schoolyard_models::{AssignStudentsDto, BulkAssignResponse};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics::track_user_created;
use crate::modules::students::service::STUDENT_SELECT;
use crate::utils::db::{missing_ids, not_found, write_error};

const PARENT_SELECT: &str = r#"SELECT p.id, p.user_id, u.first_name, u.last_name, u.email, u.phone,
       p.occupation, p.address,
       (SELECT COUNT(*) FROM students s WHERE s.parent_id = p.id) AS children_count,
       p.created_at, p.updated_at
FROM parents p
JOIN users u ON u.id = p.user_id"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ParentFilterParams) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct ParentService;

impl ParentService {
    #[instrument(skip(db, dto))]
    pub async fn create_parent(db: &PgPool, dto: CreateParentDto) -> Result<Parent, AppError> {
        let hashed_password = hash_password(&dto.password)?;
        let mut tx = db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (first_name, last_name, email, password, role, phone)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(normalize_email(&dto.email))
        .bind(&hashed_password)
        .bind(UserRole::Parent)
        .bind(&dto.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, &format!("A user with email {} already exists", dto.email)))?;

        let parent_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO parents (user_id, occupation, address) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id)
        .bind(&dto.occupation)
        .bind(&dto.address)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        track_user_created(UserRole::Parent.as_str());
        info!(parent_id = %parent_id, "Parent created");

        Self::get_parent_by_id(db, parent_id).await
    }

    #[instrument(skip(db))]
    pub async fn get_parents(
        db: &PgPool,
        filters: ParentFilterParams,
    ) -> Result<PaginatedParentsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM parents p JOIN users u ON u.id = p.user_id",
        );
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count parents")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(PARENT_SELECT);
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY u.last_name, u.first_name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let parents = qb.build_query_as::<Parent>().fetch_all(db).await?;

        Ok(PaginatedParentsResponse {
            data: parents,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_parent_by_id(db: &PgPool, id: Uuid) -> Result<Parent, AppError> {
        sqlx::query_as::<_, Parent>(&format!("{} WHERE p.id = $1", PARENT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Parent"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_parent(
        db: &PgPool,
        id: Uuid,
        dto: UpdateParentDto,
    ) -> Result<Parent, AppError> {
        let existing = Self::get_parent_by_id(db, id).await?;
        let hashed_password = dto.password.as_deref().map(hash_password).transpose()?;

        let mut tx = db.begin().await?;

        sqlx::query(
            r#"UPDATE users SET
                   first_name = COALESCE($1, first_name),
                   last_name = COALESCE($2, last_name),
                   email = COALESCE($3, email),
                   phone = COALESCE($4, phone),
                   password = COALESCE($5, password)
               WHERE id = $6"#,
        )
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(dto.email.as_deref().map(normalize_email))
        .bind(&dto.phone)
        .bind(&hashed_password)
        .bind(existing.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "A user with this email already exists"))?;

        sqlx::query(
            r#"UPDATE parents SET
                   occupation = COALESCE($1, occupation),
                   address = COALESCE($2, address)
               WHERE id = $3"#,
        )
        .bind(&dto.occupation)
        .bind(&dto.address)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::get_parent_by_id(db, id).await
    }

    /// Deletes the parent's account. Linked students are kept and unlinked.
    #[instrument(skip(db))]
    pub async fn delete_parent(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM users WHERE id = (SELECT user_id FROM parents WHERE id = $1)",
        )
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Parent"));
        }
        Ok(())
    }

    /// Links existing students to the parent. Unknown IDs are reported back.
    #[instrument(skip(db, dto), fields(count = dto.student_ids.len()))]
    pub async fn assign_children(
        db: &PgPool,
        parent_id: Uuid,
        dto: AssignStudentsDto,
    ) -> Result<BulkAssignResponse, AppError> {
        let parent_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM parents WHERE id = $1)")
                .bind(parent_id)
                .fetch_one(db)
                .await?;

        if !parent_exists {
            return Err(not_found("Parent"));
        }

        let assigned = sqlx::query_scalar::<_, Uuid>(
            "UPDATE students SET parent_id = $1 WHERE id = ANY($2) RETURNING id",
        )
        .bind(parent_id)
        .bind(&dto.student_ids)
        .fetch_all(db)
        .await?;

        let failed_ids = missing_ids(&dto.student_ids, &assigned);
        info!(
            assigned = assigned.len(),
            failed = failed_ids.len(),
            "Children linked to parent"
        );

        Ok(BulkAssignResponse {
            assigned_count: assigned.len(),
            failed_ids,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_children(db: &PgPool, parent_id: Uuid) -> Result<Vec<Student>, AppError> {
        Self::get_parent_by_id(db, parent_id).await?;

        let children = sqlx::query_as::<_, Student>(&format!(
            "{} WHERE s.parent_id = $1 ORDER BY u.first_name",
            STUDENT_SELECT
        ))
        .bind(parent_id)
        .fetch_all(db)
        .await?;

        Ok(children)
    }
}
