use anyhow::anyhow;
use chrono::NaiveTime;
use schoolyard_core::AppError;
use schoolyard_models::timetables::{
    CreateTimetableEntryDto, DayOfWeek, TimetableEntry, TimetableFilterParams,
    UpdateTimetableEntryDto, periods_overlap,
};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::utils::db::{not_found, write_error};

const ENTRY_SELECT: &str = r#"SELECT te.id, te.classroom_id,
       c.grade || ' ' || c.section AS classroom_name,
       te.subject_id, sub.name AS subject_name,
       te.teacher_id, u.first_name || ' ' || u.last_name AS teacher_name,
       te.day_of_week, te.start_time, te.end_time, te.academic_year,
       te.created_at, te.updated_at
FROM timetable_entries te
JOIN classrooms c ON c.id = te.classroom_id
JOIN subjects sub ON sub.id = te.subject_id
JOIN teachers t ON t.id = te.teacher_id
JOIN users u ON u.id = t.user_id"#;

/// The slot an entry wants to occupy.
#[derive(Debug, Clone, Copy)]
struct Period {
    classroom_id: Uuid,
    teacher_id: Uuid,
    day_of_week: DayOfWeek,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

#[derive(Debug, Clone, FromRow)]
struct BookedPeriod {
    classroom_id: Uuid,
    teacher_id: Uuid,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

/// Describes the first booked period that clashes with `period`, if any.
fn find_clash(period: &Period, booked: &[BookedPeriod]) -> Option<String> {
    booked
        .iter()
        .filter(|b| periods_overlap(period.start_time, period.end_time, b.start_time, b.end_time))
        .find_map(|b| {
            let who = if b.classroom_id == period.classroom_id {
                "The classroom"
            } else if b.teacher_id == period.teacher_id {
                "The teacher"
            } else {
                return None;
            };
            Some(format!(
                "{} already has a lesson on {} from {} to {}",
                who,
                period.day_of_week,
                b.start_time.format("%H:%M"),
                b.end_time.format("%H:%M")
            ))
        })
}

async fn ensure_no_clash(
    tx: &mut Transaction<'_, Postgres>,
    period: &Period,
    academic_year: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), AppError> {
    // Bookings of an empty slot serialize on the classroom and teacher rows,
    // locked in that order.
    sqlx::query("SELECT id FROM classrooms WHERE id = $1 FOR NO KEY UPDATE")
        .bind(period.classroom_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("SELECT id FROM teachers WHERE id = $1 FOR NO KEY UPDATE")
        .bind(period.teacher_id)
        .execute(&mut **tx)
        .await?;

    let booked = sqlx::query_as::<_, BookedPeriod>(
        r#"SELECT classroom_id, teacher_id, start_time, end_time
           FROM timetable_entries
           WHERE day_of_week = $1
             AND academic_year = $2
             AND (classroom_id = $3 OR teacher_id = $4)
             AND ($5::uuid IS NULL OR id <> $5)
           FOR UPDATE"#,
    )
    .bind(period.day_of_week)
    .bind(academic_year)
    .bind(period.classroom_id)
    .bind(period.teacher_id)
    .bind(exclude_id)
    .fetch_all(&mut **tx)
    .await?;

    if let Some(message) = find_clash(period, &booked) {
        warn!(%message, "Timetable clash");
        return Err(AppError::conflict(anyhow!(message)));
    }
    Ok(())
}

pub struct TimetableService;

impl TimetableService {
    #[instrument(skip(db, dto), fields(day = %dto.day_of_week))]
    pub async fn create_entry(
        db: &PgPool,
        dto: CreateTimetableEntryDto,
    ) -> Result<TimetableEntry, AppError> {
        let period = Period {
            classroom_id: dto.classroom_id,
            teacher_id: dto.teacher_id,
            day_of_week: dto.day_of_week,
            start_time: dto.start_time,
            end_time: dto.end_time,
        };

        let mut tx = db.begin().await?;
        ensure_no_clash(&mut tx, &period, &dto.academic_year, None).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO timetable_entries
                   (classroom_id, subject_id, teacher_id, day_of_week, start_time, end_time,
                    academic_year)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(dto.classroom_id)
        .bind(dto.subject_id)
        .bind(dto.teacher_id)
        .bind(dto.day_of_week)
        .bind(dto.start_time)
        .bind(dto.end_time)
        .bind(&dto.academic_year)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Timetable entry already exists"))?;

        tx.commit().await?;
        info!(entry_id = %id, "Timetable entry created");

        Self::get_entry_by_id(db, id).await
    }

    /// Ordered by day of week, then start time.
    #[instrument(skip(db))]
    pub async fn get_entries(
        db: &PgPool,
        filters: TimetableFilterParams,
    ) -> Result<Vec<TimetableEntry>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(ENTRY_SELECT);
        qb.push(" WHERE 1 = 1");
        if let Some(classroom_id) = filters.classroom_id {
            qb.push(" AND te.classroom_id = ").push_bind(classroom_id);
        }
        if let Some(teacher_id) = filters.teacher_id {
            qb.push(" AND te.teacher_id = ").push_bind(teacher_id);
        }
        if let Some(day_of_week) = filters.day_of_week {
            qb.push(" AND te.day_of_week = ").push_bind(day_of_week);
        }
        if let Some(academic_year) = filters.academic_year {
            qb.push(" AND te.academic_year = ").push_bind(academic_year);
        }
        qb.push(" ORDER BY te.day_of_week, te.start_time");

        let entries = qb.build_query_as::<TimetableEntry>().fetch_all(db).await?;
        Ok(entries)
    }

    #[instrument(skip(db))]
    pub async fn get_entry_by_id(db: &PgPool, id: Uuid) -> Result<TimetableEntry, AppError> {
        sqlx::query_as::<_, TimetableEntry>(&format!("{} WHERE te.id = $1", ENTRY_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Timetable entry"))
    }

    /// Re-checks the merged entry for clashes, ignoring the entry itself.
    #[instrument(skip(db, dto))]
    pub async fn update_entry(
        db: &PgPool,
        id: Uuid,
        dto: UpdateTimetableEntryDto,
    ) -> Result<TimetableEntry, AppError> {
        let existing = Self::get_entry_by_id(db, id).await?;

        let period = Period {
            classroom_id: dto.classroom_id.unwrap_or(existing.classroom_id),
            teacher_id: dto.teacher_id.unwrap_or(existing.teacher_id),
            day_of_week: dto.day_of_week.unwrap_or(existing.day_of_week),
            start_time: dto.start_time.unwrap_or(existing.start_time),
            end_time: dto.end_time.unwrap_or(existing.end_time),
        };
        if period.end_time <= period.start_time {
            return Err(AppError::unprocessable(anyhow!(
                "end_time must be after start_time"
            )));
        }
        let academic_year = dto
            .academic_year
            .clone()
            .unwrap_or_else(|| existing.academic_year.clone());

        let mut tx = db.begin().await?;
        ensure_no_clash(&mut tx, &period, &academic_year, Some(id)).await?;

        sqlx::query(
            r#"UPDATE timetable_entries SET
                   classroom_id = $1,
                   subject_id = COALESCE($2, subject_id),
                   teacher_id = $3,
                   day_of_week = $4,
                   start_time = $5,
                   end_time = $6,
                   academic_year = $7
               WHERE id = $8"#,
        )
        .bind(period.classroom_id)
        .bind(dto.subject_id)
        .bind(period.teacher_id)
        .bind(period.day_of_week)
        .bind(period.start_time)
        .bind(period.end_time)
        .bind(&academic_year)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Timetable entry already exists"))?;

        tx.commit().await?;

        Self::get_entry_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_entry(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM timetable_entries WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Timetable entry"));
        }
        Ok(())
    }
}
