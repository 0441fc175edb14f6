use anyhow::{Context, anyhow};
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::exams::{
    CreateExamDto, Exam, ExamFilterParams, PaginatedExamsResponse, UpdateExamDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::db::{not_found, write_error};
use crate::validator::check_date_range;

const EXAM_SELECT: &str = r#"SELECT e.id, e.title, e.subject_id, sub.name AS subject_name,
       e.classroom_id, e.hall_id, e.academic_year, e.exam_date, e.start_time, e.end_time,
       e.max_score, e.created_at, e.updated_at
FROM exams e
JOIN subjects sub ON sub.id = e.subject_id"#;

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &ExamFilterParams,
) -> Result<(), AppError> {
    check_date_range(filters.from, filters.to)?;

    qb.push(" WHERE 1 = 1");
    if let Some(classroom_id) = filters.classroom_id {
        qb.push(" AND e.classroom_id = ").push_bind(classroom_id);
    }
    if let Some(subject_id) = filters.subject_id {
        qb.push(" AND e.subject_id = ").push_bind(subject_id);
    }
    if let Some(academic_year) = &filters.academic_year {
        qb.push(" AND e.academic_year = ")
            .push_bind(academic_year.clone());
    }
    if let Some(from) = filters.from {
        qb.push(" AND e.exam_date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND e.exam_date <= ").push_bind(to);
    }
    Ok(())
}

pub struct ExamService;

impl ExamService {
    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_exam(db: &PgPool, dto: CreateExamDto) -> Result<Exam, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO exams
                   (title, subject_id, classroom_id, hall_id, academic_year,
                    exam_date, start_time, end_time, max_score)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, 100))
               RETURNING id"#,
        )
        .bind(dto.title.trim())
        .bind(dto.subject_id)
        .bind(dto.classroom_id)
        .bind(dto.hall_id)
        .bind(&dto.academic_year)
        .bind(dto.exam_date)
        .bind(dto.start_time)
        .bind(dto.end_time)
        .bind(dto.max_score)
        .fetch_one(db)
        .await
        .map_err(|e| write_error(e, "Exam already exists"))?;

        info!(exam_id = %id, "Exam scheduled");
        Self::get_exam_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_exams(
        db: &PgPool,
        filters: ExamFilterParams,
    ) -> Result<PaginatedExamsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM exams e");
        push_filters(&mut count_qb, &filters)?;
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count exams")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(EXAM_SELECT);
        push_filters(&mut qb, &filters)?;
        qb.push(" ORDER BY e.exam_date, e.start_time LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let exams = qb.build_query_as::<Exam>().fetch_all(db).await?;

        Ok(PaginatedExamsResponse {
            data: exams,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// The next `limit` exams from today on.
    #[instrument(skip(db))]
    pub async fn get_upcoming(db: &PgPool, limit: i64) -> Result<Vec<Exam>, AppError> {
        let exams = sqlx::query_as::<_, Exam>(&format!(
            "{} WHERE e.exam_date >= CURRENT_DATE ORDER BY e.exam_date, e.start_time LIMIT $1",
            EXAM_SELECT
        ))
        .bind(limit)
        .fetch_all(db)
        .await?;

        Ok(exams)
    }

    #[instrument(skip(db))]
    pub async fn get_exam_by_id(db: &PgPool, id: Uuid) -> Result<Exam, AppError> {
        sqlx::query_as::<_, Exam>(&format!("{} WHERE e.id = $1", EXAM_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Exam"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_exam(db: &PgPool, id: Uuid, dto: UpdateExamDto) -> Result<Exam, AppError> {
        let existing = Self::get_exam_by_id(db, id).await?;

        let start_time = dto.start_time.unwrap_or(existing.start_time);
        let end_time = dto.end_time.unwrap_or(existing.end_time);
        if end_time <= start_time {
            return Err(AppError::unprocessable(anyhow!(
                "end_time must be after start_time"
            )));
        }

        sqlx::query(
            r#"UPDATE exams SET
                   title = COALESCE($1, title),
                   subject_id = COALESCE($2, subject_id),
                   classroom_id = COALESCE($3, classroom_id),
                   hall_id = COALESCE($4, hall_id),
                   academic_year = COALESCE($5, academic_year),
                   exam_date = COALESCE($6, exam_date),
                   start_time = $7,
                   end_time = $8,
                   max_score = COALESCE($9, max_score)
               WHERE id = $10"#,
        )
        .bind(dto.title.as_deref().map(str::trim))
        .bind(dto.subject_id)
        .bind(dto.classroom_id)
        .bind(dto.hall_id)
        .bind(&dto.academic_year)
        .bind(dto.exam_date)
        .bind(start_time)
        .bind(end_time)
        .bind(dto.max_score)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| write_error(e, "Exam already exists"))?;

        Self::get_exam_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_exam(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Exam"));
        }
        Ok(())
    }
}
