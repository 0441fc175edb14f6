use anyhow::Context;
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::subjects::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, SubjectFilterParams, UpdateSubjectDto,
    normalize_code,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::db::{delete_error, not_found, write_error};

const SUBJECT_COLUMNS: &str = "id, name, code, description, created_at, updated_at";
const DUPLICATE_SUBJECT: &str = "A subject with this name or code already exists";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &SubjectFilterParams) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.trim());
        qb.push(" WHERE (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct SubjectService;

impl SubjectService {
    #[instrument(skip(db, dto), fields(code = %dto.code))]
    pub async fn create_subject(db: &PgPool, dto: CreateSubjectDto) -> Result<Subject, AppError> {
        let subject = sqlx::query_as::<_, Subject>(&format!(
            "INSERT INTO subjects (name, code, description) VALUES ($1, $2, $3) RETURNING {}",
            SUBJECT_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(normalize_code(&dto.code))
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| write_error(e, DUPLICATE_SUBJECT))?;

        info!(subject_id = %subject.id, "Subject created");
        Ok(subject)
    }

    #[instrument(skip(db))]
    pub async fn get_subjects(
        db: &PgPool,
        filters: SubjectFilterParams,
    ) -> Result<PaginatedSubjectsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM subjects");
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count subjects")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM subjects",
            SUBJECT_COLUMNS
        ));
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let subjects = qb.build_query_as::<Subject>().fetch_all(db).await?;

        Ok(PaginatedSubjectsResponse {
            data: subjects,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_subject_by_id(db: &PgPool, id: Uuid) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {} FROM subjects WHERE id = $1",
            SUBJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found("Subject"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_subject(
        db: &PgPool,
        id: Uuid,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!(
            r#"UPDATE subjects SET
                   name = COALESCE($1, name),
                   code = COALESCE($2, code),
                   description = COALESCE($3, description)
               WHERE id = $4
               RETURNING {}"#,
            SUBJECT_COLUMNS
        ))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.code.as_deref().map(normalize_code))
        .bind(&dto.description)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| write_error(e, DUPLICATE_SUBJECT))?
        .ok_or_else(|| not_found("Subject"))
    }

    /// Fails with 409 while results, exams, timetable entries or assignments
    /// still use the subject.
    #[instrument(skip(db))]
    pub async fn delete_subject(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| delete_error(e, "Subject is still in use"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("Subject"));
        }
        Ok(())
    }
}
