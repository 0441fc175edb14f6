use anyhow::Context;
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::assignments::{
    Assignment, AssignmentFilterParams, CreateAssignmentDto, PaginatedAssignmentsResponse,
    UpdateAssignmentDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::db::{not_found, write_error};
use crate::validator::check_date_range;

const ASSIGNMENT_SELECT: &str = r#"SELECT a.id, a.title, a.description, a.subject_id,
       sub.name AS subject_name, a.classroom_id, a.teacher_id,
       u.first_name || ' ' || u.last_name AS teacher_name,
       a.due_date, a.max_score, a.academic_year, a.created_at, a.updated_at
FROM assignments a
JOIN subjects sub ON sub.id = a.subject_id
JOIN teachers t ON t.id = a.teacher_id
JOIN users u ON u.id = t.user_id"#;

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &AssignmentFilterParams,
) -> Result<(), AppError> {
    check_date_range(filters.due_from, filters.due_to)?;

    qb.push(" WHERE 1 = 1");
    if let Some(classroom_id) = filters.classroom_id {
        qb.push(" AND a.classroom_id = ").push_bind(classroom_id);
    }
    if let Some(subject_id) = filters.subject_id {
        qb.push(" AND a.subject_id = ").push_bind(subject_id);
    }
    if let Some(academic_year) = &filters.academic_year {
        qb.push(" AND a.academic_year = ")
            .push_bind(academic_year.clone());
    }
    if let Some(due_from) = filters.due_from {
        qb.push(" AND a.due_date >= ").push_bind(due_from);
    }
    if let Some(due_to) = filters.due_to {
        qb.push(" AND a.due_date <= ").push_bind(due_to);
    }
    Ok(())
}

pub struct AssignmentService;

impl AssignmentService {
    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_assignment(
        db: &PgPool,
        dto: CreateAssignmentDto,
        teacher_id: Uuid,
    ) -> Result<Assignment, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO assignments
                   (title, description, subject_id, classroom_id, teacher_id, due_date,
                    max_score, academic_year)
               VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 100), $8)
               RETURNING id"#,
        )
        .bind(dto.title.trim())
        .bind(&dto.description)
        .bind(dto.subject_id)
        .bind(dto.classroom_id)
        .bind(teacher_id)
        .bind(dto.due_date)
        .bind(dto.max_score)
        .bind(&dto.academic_year)
        .fetch_one(db)
        .await
        .map_err(|e| write_error(e, "Assignment already exists"))?;

        info!(assignment_id = %id, "Assignment created");
        Self::get_assignment_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_assignments(
        db: &PgPool,
        filters: AssignmentFilterParams,
    ) -> Result<PaginatedAssignmentsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM assignments a");
        push_filters(&mut count_qb, &filters)?;
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count assignments")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(ASSIGNMENT_SELECT);
        push_filters(&mut qb, &filters)?;
        qb.push(" ORDER BY a.due_date, a.title LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let assignments = qb.build_query_as::<Assignment>().fetch_all(db).await?;

        Ok(PaginatedAssignmentsResponse {
            data: assignments,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_assignment_by_id(db: &PgPool, id: Uuid) -> Result<Assignment, AppError> {
        sqlx::query_as::<_, Assignment>(&format!("{} WHERE a.id = $1", ASSIGNMENT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Assignment"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_assignment(
        db: &PgPool,
        id: Uuid,
        dto: UpdateAssignmentDto,
    ) -> Result<Assignment, AppError> {
        let result = sqlx::query(
            r#"UPDATE assignments SET
                   title = COALESCE($1, title),
                   description = COALESCE($2, description),
                   subject_id = COALESCE($3, subject_id),
                   classroom_id = COALESCE($4, classroom_id),
                   due_date = COALESCE($5, due_date),
                   max_score = COALESCE($6, max_score),
                   academic_year = COALESCE($7, academic_year)
               WHERE id = $8"#,
        )
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.subject_id)
        .bind(dto.classroom_id)
        .bind(dto.due_date)
        .bind(dto.max_score)
        .bind(&dto.academic_year)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| write_error(e, "Assignment already exists"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("Assignment"));
        }
        Self::get_assignment_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_assignment(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Assignment"));
        }
        Ok(())
    }
}
