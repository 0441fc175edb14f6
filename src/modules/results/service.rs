use anyhow::Context;
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::results::{
    CreateResultDto, PaginatedResultsResponse, ResultFilterParams, ResultSummary, StudentResult,
    UpdateResultDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics::track_result_recorded;
use crate::utils::db::{not_found, write_error};

const RESULT_SELECT: &str = r#"SELECT r.id, r.student_id,
       u.first_name || ' ' || u.last_name AS student_name, s.admission_number,
       r.subject_id, sub.name AS subject_name, sub.code AS subject_code,
       r.academic_year, r.first_test, r.second_test, r.assignment, r.midterm, r.final_exam,
       r.total, r.grade, r.remarks, r.recorded_by, r.created_at, r.updated_at
FROM results r
JOIN students s ON s.id = r.student_id
JOIN users u ON u.id = s.user_id
JOIN subjects sub ON sub.id = r.subject_id"#;

const COUNT_FROM: &str = "SELECT COUNT(*) FROM results r JOIN students s ON s.id = r.student_id";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ResultFilterParams) {
    qb.push(" WHERE 1 = 1");
    if let Some(student_id) = filters.student_id {
        qb.push(" AND r.student_id = ").push_bind(student_id);
    }
    if let Some(subject_id) = filters.subject_id {
        qb.push(" AND r.subject_id = ").push_bind(subject_id);
    }
    if let Some(classroom_id) = filters.classroom_id {
        qb.push(" AND s.classroom_id = ").push_bind(classroom_id);
    }
    if let Some(academic_year) = &filters.academic_year {
        qb.push(" AND r.academic_year = ")
            .push_bind(academic_year.clone());
    }
}

pub struct ResultService;

impl ResultService {
    /// Stores the scores with their computed total and letter grade.
    #[instrument(skip(db, dto), fields(student_id = %dto.student_id, subject_id = %dto.subject_id))]
    pub async fn create_result(
        db: &PgPool,
        dto: CreateResultDto,
        recorded_by: Uuid,
    ) -> Result<StudentResult, AppError> {
        let scores = dto.scores;
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO results
                   (student_id, subject_id, academic_year, first_test, second_test,
                    assignment, midterm, final_exam, total, grade, remarks, recorded_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING id"#,
        )
        .bind(dto.student_id)
        .bind(dto.subject_id)
        .bind(&dto.academic_year)
        .bind(scores.first_test)
        .bind(scores.second_test)
        .bind(scores.assignment)
        .bind(scores.midterm)
        .bind(scores.final_exam)
        .bind(scores.total())
        .bind(scores.grade().as_str())
        .bind(&dto.remarks)
        .bind(recorded_by)
        .fetch_one(db)
        .await
        .map_err(|e| {
            write_error(
                e,
                "A result for this student, subject and academic year already exists",
            )
        })?;

        track_result_recorded();
        info!(result_id = %id, total = scores.total(), "Result recorded");

        Self::get_result_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_results(
        db: &PgPool,
        filters: ResultFilterParams,
    ) -> Result<PaginatedResultsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(COUNT_FROM);
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count results")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(RESULT_SELECT);
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY r.academic_year DESC, u.last_name, sub.name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let results = qb
            .build_query_as::<StudentResult>()
            .fetch_all(db)
            .await
            .context("Failed to fetch results")
            .map_err(AppError::database)?;

        Ok(PaginatedResultsResponse {
            data: results,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Every result matching the filters, for export.
    #[instrument(skip(db))]
    pub async fn get_all_results(
        db: &PgPool,
        filters: &ResultFilterParams,
    ) -> Result<Vec<StudentResult>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(RESULT_SELECT);
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY s.admission_number, sub.name");

        let results = qb.build_query_as::<StudentResult>().fetch_all(db).await?;
        Ok(results)
    }

    #[instrument(skip(db))]
    pub async fn get_result_by_id(db: &PgPool, id: Uuid) -> Result<StudentResult, AppError> {
        sqlx::query_as::<_, StudentResult>(&format!("{} WHERE r.id = $1", RESULT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Result"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_result(
        db: &PgPool,
        id: Uuid,
        dto: UpdateResultDto,
        recorded_by: Uuid,
    ) -> Result<StudentResult, AppError> {
        let scores = dto.scores;
        let result = sqlx::query(
            r#"UPDATE results SET
                   first_test = $1,
                   second_test = $2,
                   assignment = $3,
                   midterm = $4,
                   final_exam = $5,
                   total = $6,
                   grade = $7,
                   remarks = COALESCE($8, remarks),
                   recorded_by = $9
               WHERE id = $10"#,
        )
        .bind(scores.first_test)
        .bind(scores.second_test)
        .bind(scores.assignment)
        .bind(scores.midterm)
        .bind(scores.final_exam)
        .bind(scores.total())
        .bind(scores.grade().as_str())
        .bind(&dto.remarks)
        .bind(recorded_by)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| write_error(e, "Result already exists"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("Result"));
        }
        Self::get_result_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_result(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM results WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Result"));
        }
        Ok(())
    }

    /// Per-subject totals with the average over all subjects.
    #[instrument(skip(db))]
    pub async fn get_student_summary(
        db: &PgPool,
        student_id: Uuid,
        academic_year: Option<String>,
    ) -> Result<ResultSummary, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
                .bind(student_id)
                .fetch_one(db)
                .await?;

        if !exists {
            return Err(not_found("Student"));
        }

        let mut qb = QueryBuilder::<Postgres>::new(RESULT_SELECT);
        qb.push(" WHERE r.student_id = ").push_bind(student_id);
        if let Some(year) = &academic_year {
            qb.push(" AND r.academic_year = ").push_bind(year.clone());
        }
        qb.push(" ORDER BY sub.name");

        let results = qb.build_query_as::<StudentResult>().fetch_all(db).await?;

        Ok(ResultSummary::from_results(
            student_id,
            academic_year,
            &results,
        ))
    }
}
