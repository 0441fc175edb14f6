use anyhow::{Context, anyhow};
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::classrooms::{
    ClassroomFilterParams, ClassroomWithStats, CreateClassroomDto, PaginatedClassroomsResponse,
    UpdateClassroomDto, remaining_seats,
};
use schoolyard_models::students::Student;
use schoolyard_models::{AssignStudentsDto, BulkAssignResponse};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::students::service::STUDENT_SELECT;
use crate::utils::db::{delete_error, missing_ids, not_found, write_error};

const CLASSROOM_SELECT: &str = r#"SELECT c.id, c.grade, c.section, c.academic_year, c.capacity,
       c.hall_id, h.name AS hall_name,
       c.homeroom_teacher_id,
       CASE WHEN u.id IS NULL THEN NULL ELSE u.first_name || ' ' || u.last_name END
           AS homeroom_teacher_name,
       (SELECT COUNT(*) FROM students s WHERE s.classroom_id = c.id) AS student_count,
       c.created_at, c.updated_at
FROM classrooms c
LEFT JOIN halls h ON h.id = c.hall_id
LEFT JOIN teachers t ON t.id = c.homeroom_teacher_id
LEFT JOIN users u ON u.id = t.user_id"#;

const DUPLICATE_CLASSROOM: &str =
    "A classroom with this grade and section already exists for the academic year";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &ClassroomFilterParams) {
    qb.push(" WHERE 1 = 1");
    if let Some(academic_year) = &filters.academic_year {
        qb.push(" AND c.academic_year = ")
            .push_bind(academic_year.clone());
    }
    if let Some(grade) = &filters.grade {
        qb.push(" AND c.grade = ").push_bind(grade.clone());
    }
}

pub struct ClassroomService;

impl ClassroomService {
    #[instrument(skip(db, dto), fields(grade = %dto.grade, section = %dto.section))]
    pub async fn create_classroom(
        db: &PgPool,
        dto: CreateClassroomDto,
    ) -> Result<ClassroomWithStats, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO classrooms
                   (grade, section, academic_year, capacity, hall_id, homeroom_teacher_id)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(dto.grade.trim())
        .bind(dto.section.trim())
        .bind(&dto.academic_year)
        .bind(dto.capacity)
        .bind(dto.hall_id)
        .bind(dto.homeroom_teacher_id)
        .fetch_one(db)
        .await
        .map_err(|e| write_error(e, DUPLICATE_CLASSROOM))?;

        info!(classroom_id = %id, "Classroom created");
        Self::get_classroom_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn get_classrooms(
        db: &PgPool,
        filters: ClassroomFilterParams,
    ) -> Result<PaginatedClassroomsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM classrooms c");
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count classrooms")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(CLASSROOM_SELECT);
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY c.academic_year DESC, c.grade, c.section LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let classrooms = qb
            .build_query_as::<ClassroomWithStats>()
            .fetch_all(db)
            .await
            .context("Failed to fetch classrooms")
            .map_err(AppError::database)?;

        Ok(PaginatedClassroomsResponse {
            data: classrooms,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_classroom_by_id(
        db: &PgPool,
        id: Uuid,
    ) -> Result<ClassroomWithStats, AppError> {
        sqlx::query_as::<_, ClassroomWithStats>(&format!("{} WHERE c.id = $1", CLASSROOM_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Classroom"))
    }

    /// Classrooms where the teacher is the homeroom teacher.
    #[instrument(skip(db))]
    pub async fn get_homeroom_classrooms(
        db: &PgPool,
        teacher_id: Uuid,
    ) -> Result<Vec<ClassroomWithStats>, AppError> {
        let classrooms = sqlx::query_as::<_, ClassroomWithStats>(&format!(
            "{} WHERE c.homeroom_teacher_id = $1 ORDER BY c.academic_year DESC, c.grade, c.section",
            CLASSROOM_SELECT
        ))
        .bind(teacher_id)
        .fetch_all(db)
        .await?;

        Ok(classrooms)
    }

    /// Capacity may not drop below the number of enrolled students.
    #[instrument(skip(db, dto))]
    pub async fn update_classroom(
        db: &PgPool,
        id: Uuid,
        dto: UpdateClassroomDto,
    ) -> Result<ClassroomWithStats, AppError> {
        let existing = Self::get_classroom_by_id(db, id).await?;

        if let Some(capacity) = dto.capacity
            && i64::from(capacity) < existing.student_count
        {
            return Err(AppError::conflict(anyhow!(
                "Capacity {} is below the {} students already enrolled",
                capacity,
                existing.student_count
            )));
        }

        sqlx::query(
            r#"UPDATE classrooms SET
                   grade = COALESCE($1, grade),
                   section = COALESCE($2, section),
                   academic_year = COALESCE($3, academic_year),
                   capacity = COALESCE($4, capacity),
                   hall_id = COALESCE($5, hall_id),
                   homeroom_teacher_id = COALESCE($6, homeroom_teacher_id)
               WHERE id = $7"#,
        )
        .bind(dto.grade.as_deref().map(str::trim))
        .bind(dto.section.as_deref().map(str::trim))
        .bind(&dto.academic_year)
        .bind(dto.capacity)
        .bind(dto.hall_id)
        .bind(dto.homeroom_teacher_id)
        .bind(id)
        .execute(db)
        .await
        .map_err(|e| write_error(e, DUPLICATE_CLASSROOM))?;

        Self::get_classroom_by_id(db, id).await
    }

    /// Students of a deleted classroom stay enrolled in no classroom. Fails
    /// with 409 while attendance, exams, timetable entries or assignments
    /// still refer to it.
    #[instrument(skip(db))]
    pub async fn delete_classroom(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM classrooms WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| delete_error(e, "Classroom is still in use"))?;

        if result.rows_affected() == 0 {
            return Err(not_found("Classroom"));
        }
        info!(classroom_id = %id, "Classroom deleted");
        Ok(())
    }

    /// Moves students into the classroom. Rejected as a whole when the
    /// newcomers do not fit.
    #[instrument(skip(db, dto), fields(count = dto.student_ids.len()))]
    pub async fn assign_students(
        db: &PgPool,
        classroom_id: Uuid,
        dto: AssignStudentsDto,
    ) -> Result<BulkAssignResponse, AppError> {
        let mut tx = db.begin().await?;

        let (capacity, enrolled) = sqlx::query_as::<_, (i32, i64)>(
            r#"SELECT c.capacity, (SELECT COUNT(*) FROM students s WHERE s.classroom_id = c.id)
               FROM classrooms c WHERE c.id = $1 FOR UPDATE"#,
        )
        .bind(classroom_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found("Classroom"))?;

        // Students already in this classroom take no new seat.
        let newcomers: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM students
               WHERE id = ANY($1) AND classroom_id IS DISTINCT FROM $2"#,
        )
        .bind(&dto.student_ids)
        .bind(classroom_id)
        .fetch_one(&mut *tx)
        .await?;

        let seats = remaining_seats(capacity, enrolled);
        if newcomers > seats {
            warn!(newcomers, seats, "Classroom assignment exceeds capacity");
            return Err(AppError::conflict(anyhow!(
                "Classroom is full: {} seats left, {} students requested",
                seats,
                newcomers
            )));
        }

        let assigned = sqlx::query_scalar::<_, Uuid>(
            "UPDATE students SET classroom_id = $1 WHERE id = ANY($2) RETURNING id",
        )
        .bind(classroom_id)
        .bind(&dto.student_ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let failed_ids = missing_ids(&dto.student_ids, &assigned);
        info!(
            assigned = assigned.len(),
            failed = failed_ids.len(),
            "Students assigned to classroom"
        );

        Ok(BulkAssignResponse {
            assigned_count: assigned.len(),
            failed_ids,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_students(db: &PgPool, classroom_id: Uuid) -> Result<Vec<Student>, AppError> {
        Self::get_classroom_by_id(db, classroom_id).await?;

        let students = sqlx::query_as::<_, Student>(&format!(
            "{} WHERE s.classroom_id = $1 ORDER BY u.last_name, u.first_name",
            STUDENT_SELECT
        ))
        .bind(classroom_id)
        .fetch_all(db)
        .await?;

        Ok(students)
    }
}
