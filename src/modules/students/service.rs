use anyhow::{Context, anyhow};
use schoolyard_auth::UserRole;
use schoolyard_core::{AppError, PaginationMeta, hash_password, normalize_email};
use schoolyard_models::students::{
    CreateStudentDto, PaginatedStudentsResponse, Student, StudentFilterParams, UpdateStudentDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics::track_user_created;
use crate::utils::db::{not_found, write_error};

pub(crate) const STUDENT_SELECT: &str = r#"SELECT s.id, s.user_id, u.first_name, u.last_name, u.email, u.phone,
       s.admission_number, s.date_of_birth, s.gender, s.address, s.classroom_id,
       s.parent_id, s.enrolled_on, s.created_at, s.updated_at
FROM students s
JOIN users u ON u.id = s.user_id"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &StudentFilterParams) {
    qb.push(" WHERE 1 = 1");
    if let Some(classroom_id) = filters.classroom_id {
        qb.push(" AND s.classroom_id = ").push_bind(classroom_id);
    }
    if let Some(parent_id) = filters.parent_id {
        qb.push(" AND s.parent_id = ").push_bind(parent_id);
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.admission_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Fails with 409 when `classroom_id` has no free seat for `additional` more
/// students.
pub(crate) async fn ensure_classroom_seats(
    tx: &mut Transaction<'_, Postgres>,
    classroom_id: Uuid,
    additional: i64,
) -> Result<(), AppError> {
    let row = sqlx::query_as::<_, (i32, i64)>(
        r#"SELECT c.capacity, (SELECT COUNT(*) FROM students s WHERE s.classroom_id = c.id)
           FROM classrooms c WHERE c.id = $1 FOR UPDATE"#,
    )
    .bind(classroom_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| not_found("Classroom"))?;

    let (capacity, enrolled) = row;
    if schoolyard_models::classrooms::remaining_seats(capacity, enrolled) < additional {
        return Err(AppError::conflict(anyhow!(
            "Classroom is full (capacity {})",
            capacity
        )));
    }
    Ok(())
}

pub struct StudentService;

impl StudentService {
    #[instrument(skip(db, dto), fields(admission_number = %dto.admission_number))]
    pub async fn create_student(db: &PgPool, dto: CreateStudentDto) -> Result<Student, AppError> {
        let hashed_password = hash_password(&dto.password)?;
        let mut tx = db.begin().await?;

        if let Some(classroom_id) = dto.classroom_id {
            ensure_classroom_seats(&mut tx, classroom_id, 1).await?;
        }

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO users (first_name, last_name, email, password, role, phone)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(normalize_email(&dto.email))
        .bind(&hashed_password)
        .bind(UserRole::Student)
        .bind(&dto.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, &format!("A user with email {} already exists", dto.email)))?;

        let student_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO students
                   (user_id, admission_number, date_of_birth, gender, address,
                    classroom_id, parent_id, enrolled_on)
               VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, CURRENT_DATE))
               RETURNING id"#,
        )
        .bind(user_id)
        .bind(&dto.admission_number)
        .bind(dto.date_of_birth)
        .bind(&dto.gender)
        .bind(&dto.address)
        .bind(dto.classroom_id)
        .bind(dto.parent_id)
        .bind(dto.enrolled_on)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Admission number already exists"))?;

        tx.commit().await?;
        track_user_created(UserRole::Student.as_str());
        info!(student_id = %student_id, "Student created");

        Self::get_student_by_id(db, student_id).await
    }

    #[instrument(skip(db))]
    pub async fn get_students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM students s JOIN users u ON u.id = s.user_id",
        );
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count students")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(STUDENT_SELECT);
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY u.last_name, u.first_name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let students = qb
            .build_query_as::<Student>()
            .fetch_all(db)
            .await
            .context("Failed to fetch students")
            .map_err(AppError::database)?;

        Ok(PaginatedStudentsResponse {
            data: students,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Every student matching the filters, for export.
    #[instrument(skip(db))]
    pub async fn get_all_students(
        db: &PgPool,
        filters: &StudentFilterParams,
    ) -> Result<Vec<Student>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(STUDENT_SELECT);
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY s.admission_number");

        let students = qb.build_query_as::<Student>().fetch_all(db).await?;
        Ok(students)
    }

    #[instrument(skip(db))]
    pub async fn get_student_by_id(db: &PgPool, id: Uuid) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(&format!("{} WHERE s.id = $1", STUDENT_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Student"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_student(
        db: &PgPool,
        id: Uuid,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let existing = Self::get_student_by_id(db, id).await?;
        let hashed_password = dto.password.as_deref().map(hash_password).transpose()?;

        let mut tx = db.begin().await?;

        if let Some(Some(classroom_id)) = dto.classroom_id
            && existing.classroom_id != Some(classroom_id)
        {
            ensure_classroom_seats(&mut tx, classroom_id, 1).await?;
        }

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
            r#"UPDATE students SET
                   admission_number = COALESCE($1, admission_number),
                   date_of_birth = COALESCE($2, date_of_birth),
                   gender = COALESCE($3, gender),
                   address = COALESCE($4, address),
                   classroom_id = CASE WHEN $5 THEN $6 ELSE classroom_id END,
                   parent_id = CASE WHEN $7 THEN $8 ELSE parent_id END,
                   enrolled_on = COALESCE($9, enrolled_on)
               WHERE id = $10"#,
        )
        .bind(&dto.admission_number)
        .bind(dto.date_of_birth)
        .bind(&dto.gender)
        .bind(&dto.address)
        .bind(dto.classroom_id.is_some())
        .bind(dto.classroom_id.flatten())
        .bind(dto.parent_id.is_some())
        .bind(dto.parent_id.flatten())
        .bind(dto.enrolled_on)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Admission number already exists"))?;

        tx.commit().await?;

        Self::get_student_by_id(db, id).await
    }

    /// Deletes the student's account; the student row and its records cascade.
    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM users WHERE id = (SELECT user_id FROM students WHERE id = $1)",
        )
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Student"));
        }

        info!(student_id = %id, "Student deleted");
        Ok(())
    }
}
