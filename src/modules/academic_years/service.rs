use schoolyard_core::AppError;
use schoolyard_models::academic_years::{AcademicYear, CreateAcademicYearDto};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::utils::db::{delete_error, not_found, write_error};

const COLUMNS: &str = "id, name, start_date, end_date, is_current, created_at";

pub struct AcademicYearService;

impl AcademicYearService {
    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, dto: CreateAcademicYearDto) -> Result<AcademicYear, AppError> {
        let mut tx = db.begin().await?;

        if dto.is_current {
            sqlx::query("UPDATE academic_years SET is_current = FALSE WHERE is_current")
                .execute(&mut *tx)
                .await?;
        }

        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            r#"INSERT INTO academic_years (name, start_date, end_date, is_current)
               VALUES ($1, $2, $3, $4)
               RETURNING {}"#,
            COLUMNS
        ))
        .bind(&dto.name)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.is_current)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Academic year already exists"))?;

        tx.commit().await?;
        Ok(year)
    }

    #[instrument(skip(db))]
    pub async fn list(db: &PgPool) -> Result<Vec<AcademicYear>, AppError> {
        let years = sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {} FROM academic_years ORDER BY start_date DESC",
            COLUMNS
        ))
        .fetch_all(db)
        .await?;
        Ok(years)
    }

    #[instrument(skip(db))]
    pub async fn current(db: &PgPool) -> Result<AcademicYear, AppError> {
        sqlx::query_as::<_, AcademicYear>(&format!(
            "SELECT {} FROM academic_years WHERE is_current",
            COLUMNS
        ))
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found("Current academic year"))
    }

    /// Clears the previous current year and marks `id` current, atomically.
    #[instrument(skip(db))]
    pub async fn set_current(db: &PgPool, id: Uuid) -> Result<AcademicYear, AppError> {
        let mut tx = db.begin().await?;

        sqlx::query("UPDATE academic_years SET is_current = FALSE WHERE is_current AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let year = sqlx::query_as::<_, AcademicYear>(&format!(
            "UPDATE academic_years SET is_current = TRUE WHERE id = $1 RETURNING {}",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found("Academic year"))?;

        tx.commit().await?;
        info!(academic_year = %year.name, "Current academic year changed");
        Ok(year)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM academic_years WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| delete_error(e, "Academic year is still in use"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("Academic year"));
        }
        Ok(())
    }
}
