use std::collections::HashSet;

use anyhow::{Context, anyhow};
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::BulkAssignResponse;
use schoolyard_models::halls::{
    AssignHallDto, CreateHallDto, Hall, HallAssignment, HallAssignmentFilterParams,
    HallFilterParams, PaginatedHallsResponse, UpdateHallDto, next_seats,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::utils::db::{delete_error, missing_ids, not_found, write_error};

const ASSIGNMENT_SELECT: &str = r#"SELECT a.id, a.hall_id, h.name AS hall_name, a.student_id,
       u.first_name || ' ' || u.last_name AS student_name, s.admission_number,
       a.exam_title, a.academic_year, a.seat_number, a.created_at
FROM exam_hall_assignments a
JOIN halls h ON h.id = a.hall_id
JOIN students s ON s.id = a.student_id
JOIN users u ON u.id = s.user_id"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &HallFilterParams) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.trim());
        qb.push(" WHERE (h.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR h.location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct HallService;

impl HallService {
    #[instrument(skip(db, dto), fields(name = %dto.name))]
    pub async fn create_hall(db: &PgPool, dto: CreateHallDto) -> Result<Hall, AppError> {
        let hall = sqlx::query_as::<_, Hall>(
            r#"INSERT INTO halls (name, capacity, location)
               VALUES ($1, $2, $3)
               RETURNING id, name, capacity, location, created_at, updated_at"#,
        )
        .bind(dto.name.trim())
        .bind(dto.capacity)
        .bind(&dto.location)
        .fetch_one(db)
        .await
        .map_err(|e| write_error(e, &format!("Hall {} already exists", dto.name.trim())))?;

        info!(hall_id = %hall.id, "Hall created");
        Ok(hall)
    }

    #[instrument(skip(db))]
    pub async fn get_halls(
        db: &PgPool,
        filters: HallFilterParams,
    ) -> Result<PaginatedHallsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM halls h");
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count halls")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT h.id, h.name, h.capacity, h.location, h.created_at, h.updated_at FROM halls h",
        );
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY h.name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let halls = qb.build_query_as::<Hall>().fetch_all(db).await?;

        Ok(PaginatedHallsResponse {
            data: halls,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_hall_by_id(db: &PgPool, id: Uuid) -> Result<Hall, AppError> {
        sqlx::query_as::<_, Hall>(
            "SELECT id, name, capacity, location, created_at, updated_at FROM halls WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found("Hall"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_hall(db: &PgPool, id: Uuid, dto: UpdateHallDto) -> Result<Hall, AppError> {
        sqlx::query_as::<_, Hall>(
            r#"UPDATE halls SET
                   name = COALESCE($1, name),
                   capacity = COALESCE($2, capacity),
                   location = COALESCE($3, location)
               WHERE id = $4
               RETURNING id, name, capacity, location, created_at, updated_at"#,
        )
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.capacity)
        .bind(&dto.location)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| write_error(e, "A hall with this name already exists"))?
        .ok_or_else(|| not_found("Hall"))
    }

    /// Fails with 409 while students are seated in the hall.
    #[instrument(skip(db))]
    pub async fn delete_hall(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM halls WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| delete_error(e, "Hall still has seat assignments"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("Hall"));
        }
        Ok(())
    }

    /// Seats students for an exam title.
    ///
    /// Unknown students and students already seated for the same title and
    /// year (in any hall) are skipped and reported. When the remaining
    /// students do not fit, nothing is written.
    #[instrument(skip(db, dto), fields(exam_title = %dto.exam_title, count = dto.student_ids.len()))]
    pub async fn assign_students(
        db: &PgPool,
        hall_id: Uuid,
        dto: AssignHallDto,
    ) -> Result<BulkAssignResponse, AppError> {
        let mut tx = db.begin().await?;

        let capacity = sqlx::query_scalar::<_, i32>(
            "SELECT capacity FROM halls WHERE id = $1 FOR UPDATE",
        )
        .bind(hall_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found("Hall"))?;

        let eligible: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT s.id FROM students s
               WHERE s.id = ANY($1)
                 AND NOT EXISTS (
                     SELECT 1 FROM exam_hall_assignments a
                     WHERE a.student_id = s.id AND a.exam_title = $2 AND a.academic_year = $3
                 )"#,
        )
        .bind(&dto.student_ids)
        .bind(&dto.exam_title)
        .bind(&dto.academic_year)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        // Keep request order so seat numbers follow it.
        let mut seen = HashSet::new();
        let to_seat: Vec<Uuid> = dto
            .student_ids
            .iter()
            .copied()
            .filter(|id| eligible.contains(id) && seen.insert(*id))
            .collect();

        let (seated, max_seat) = sqlx::query_as::<_, (i64, i32)>(
            r#"SELECT COUNT(*), COALESCE(MAX(seat_number), 0)
               FROM exam_hall_assignments
               WHERE hall_id = $1 AND exam_title = $2 AND academic_year = $3"#,
        )
        .bind(hall_id)
        .bind(&dto.exam_title)
        .bind(&dto.academic_year)
        .fetch_one(&mut *tx)
        .await?;

        let free = i64::from(capacity) - seated;
        if to_seat.len() as i64 > free {
            warn!(requested = to_seat.len(), free, "Hall assignment exceeds capacity");
            return Err(AppError::conflict(anyhow!(
                "Hall capacity exceeded: {} seats left, {} students to seat",
                free.max(0),
                to_seat.len()
            )));
        }

        let seats = next_seats(max_seat, to_seat.len());
        let assigned = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO exam_hall_assignments
                   (hall_id, student_id, exam_title, academic_year, seat_number)
               SELECT $1, seat.student_id, $2, $3, seat.seat_number
               FROM UNNEST($4::uuid[], $5::int4[]) AS seat(student_id, seat_number)
               RETURNING student_id"#,
        )
        .bind(hall_id)
        .bind(&dto.exam_title)
        .bind(&dto.academic_year)
        .bind(&to_seat)
        .bind(&seats)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| write_error(e, "A seat was taken concurrently, please retry"))?;

        tx.commit().await?;

        let failed_ids = missing_ids(&dto.student_ids, &assigned);
        info!(
            assigned = assigned.len(),
            failed = failed_ids.len(),
            "Students seated in hall"
        );

        Ok(BulkAssignResponse {
            assigned_count: assigned.len(),
            failed_ids,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_assignments(
        db: &PgPool,
        hall_id: Uuid,
        filters: HallAssignmentFilterParams,
    ) -> Result<Vec<HallAssignment>, AppError> {
        Self::get_hall_by_id(db, hall_id).await?;

        let mut qb = QueryBuilder::<Postgres>::new(ASSIGNMENT_SELECT);
        qb.push(" WHERE a.hall_id = ").push_bind(hall_id);
        if let Some(exam_title) = filters.exam_title {
            qb.push(" AND a.exam_title = ").push_bind(exam_title);
        }
        if let Some(academic_year) = filters.academic_year {
            qb.push(" AND a.academic_year = ").push_bind(academic_year);
        }
        qb.push(" ORDER BY a.exam_title, a.seat_number");

        let assignments = qb.build_query_as::<HallAssignment>().fetch_all(db).await?;
        Ok(assignments)
    }

    #[instrument(skip(db))]
    pub async fn get_student_assignments(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<HallAssignment>, AppError> {
        let assignments = sqlx::query_as::<_, HallAssignment>(&format!(
            "{} WHERE a.student_id = $1 ORDER BY a.academic_year DESC, a.exam_title",
            ASSIGNMENT_SELECT
        ))
        .bind(student_id)
        .fetch_all(db)
        .await?;

        Ok(assignments)
    }

    #[instrument(skip(db))]
    pub async fn delete_assignment(
        db: &PgPool,
        hall_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM exam_hall_assignments WHERE id = $1 AND hall_id = $2")
                .bind(assignment_id)
                .bind(hall_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Hall assignment"));
        }
        Ok(())
    }
}
