use anyhow::Context;
use schoolyard_auth::UserRole;
use schoolyard_core::{AppError, PaginationMeta, hash_password, normalize_email};
use schoolyard_models::teachers::{
    CreateTeacherDto, PaginatedTeachersResponse, Teacher, TeacherFilterParams, UpdateTeacherDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics::track_user_created;
use crate::utils::db::{not_found, write_error};

const TEACHER_SELECT: &str = r#"SELECT t.id, t.user_id, u.first_name, u.last_name, u.email, u.phone,
       t.employee_number, t.specialization, t.qualification, t.hire_date,
       t.created_at, t.updated_at
FROM teachers t
JOIN users u ON u.id = t.user_id"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &TeacherFilterParams) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (u.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR t.employee_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct TeacherService;

impl TeacherService {
    #[instrument(skip(db, dto), fields(employee_number = %dto.employee_number))]
    pub async fn create_teacher(db: &PgPool, dto: CreateTeacherDto) -> Result<Teacher, AppError> {
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
        .bind(UserRole::Teacher)
        .bind(&dto.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, &format!("A user with email {} already exists", dto.email)))?;

        let teacher_id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO teachers (user_id, employee_number, specialization, qualification, hire_date)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(user_id)
        .bind(&dto.employee_number)
        .bind(&dto.specialization)
        .bind(&dto.qualification)
        .bind(dto.hire_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Employee number already exists"))?;

        tx.commit().await?;
        track_user_created(UserRole::Teacher.as_str());
        info!(teacher_id = %teacher_id, "Teacher created");

        Self::get_teacher_by_id(db, teacher_id).await
    }

    #[instrument(skip(db))]
    pub async fn get_teachers(
        db: &PgPool,
        filters: TeacherFilterParams,
    ) -> Result<PaginatedTeachersResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM teachers t JOIN users u ON u.id = t.user_id",
        );
        push_filters(&mut count_qb, &filters);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count teachers")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(TEACHER_SELECT);
        push_filters(&mut qb, &filters);
        qb.push(" ORDER BY u.last_name, u.first_name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let teachers = qb.build_query_as::<Teacher>().fetch_all(db).await?;

        Ok(PaginatedTeachersResponse {
            data: teachers,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_teacher_by_id(db: &PgPool, id: Uuid) -> Result<Teacher, AppError> {
        sqlx::query_as::<_, Teacher>(&format!("{} WHERE t.id = $1", TEACHER_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Teacher"))
    }

    /// The teacher row belonging to a user account, if any.
    #[instrument(skip(db))]
    pub async fn find_teacher_id_for_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM teachers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(id)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_teacher(
        db: &PgPool,
        id: Uuid,
        dto: UpdateTeacherDto,
    ) -> Result<Teacher, AppError> {
        let existing = Self::get_teacher_by_id(db, id).await?;
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
            r#"UPDATE teachers SET
                   employee_number = COALESCE($1, employee_number),
                   specialization = COALESCE($2, specialization),
                   qualification = COALESCE($3, qualification),
                   hire_date = COALESCE($4, hire_date)
               WHERE id = $5"#,
        )
        .bind(&dto.employee_number)
        .bind(&dto.specialization)
        .bind(&dto.qualification)
        .bind(dto.hire_date)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "Employee number already exists"))?;

        tx.commit().await?;

        Self::get_teacher_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_teacher(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM users WHERE id = (SELECT user_id FROM teachers WHERE id = $1)",
        )
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Teacher"));
        }

        info!(teacher_id = %id, "Teacher deleted");
        Ok(())
    }
}
