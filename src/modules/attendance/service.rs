use std::collections::HashSet;

use anyhow::Context;
use schoolyard_core::{AppError, PaginationMeta};
use schoolyard_models::attendance::{
    AttendanceFilterParams, AttendanceRecord, AttendanceStatus, AttendanceSummary,
    MarkAttendanceDto, MarkAttendanceResponse, MarkTeacherAttendanceDto,
    PaginatedAttendanceResponse, PaginatedTeacherAttendanceResponse, TeacherAttendanceFilterParams,
    TeacherAttendanceRecord, UpdateAttendanceDto,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics::track_attendance_marked;
use crate::utils::db::{not_found, write_error};
use crate::validator::check_date_range;

const RECORD_SELECT: &str = r#"SELECT a.id, a.student_id,
       u.first_name || ' ' || u.last_name AS student_name, s.admission_number,
       a.classroom_id, a.date, a.status, a.remarks, a.academic_year, a.recorded_by,
       a.created_at, a.updated_at
FROM attendance a
JOIN students s ON s.id = a.student_id
JOIN users u ON u.id = s.user_id"#;

const TEACHER_RECORD_SELECT: &str = r#"SELECT ta.id, ta.teacher_id,
       u.first_name || ' ' || u.last_name AS teacher_name, t.employee_number,
       ta.date, ta.status, ta.remarks, ta.academic_year, ta.recorded_by,
       ta.created_at, ta.updated_at
FROM teacher_attendance ta
JOIN teachers t ON t.id = ta.teacher_id
JOIN users u ON u.id = t.user_id"#;

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &AttendanceFilterParams,
) -> Result<(), AppError> {
    check_date_range(filters.from, filters.to)?;

    qb.push(" WHERE 1 = 1");
    if let Some(student_id) = filters.student_id {
        qb.push(" AND a.student_id = ").push_bind(student_id);
    }
    if let Some(classroom_id) = filters.classroom_id {
        qb.push(" AND a.classroom_id = ").push_bind(classroom_id);
    }
    if let Some(status) = filters.status {
        qb.push(" AND a.status = ").push_bind(status);
    }
    if let Some(academic_year) = &filters.academic_year {
        qb.push(" AND a.academic_year = ")
            .push_bind(academic_year.clone());
    }
    if let Some(from) = filters.from {
        qb.push(" AND a.date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND a.date <= ").push_bind(to);
    }
    Ok(())
}

fn push_teacher_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    filters: &TeacherAttendanceFilterParams,
) -> Result<(), AppError> {
    check_date_range(filters.from, filters.to)?;

    qb.push(" WHERE 1 = 1");
    if let Some(teacher_id) = filters.teacher_id {
        qb.push(" AND ta.teacher_id = ").push_bind(teacher_id);
    }
    if let Some(status) = filters.status {
        qb.push(" AND ta.status = ").push_bind(status);
    }
    if let Some(academic_year) = &filters.academic_year {
        qb.push(" AND ta.academic_year = ")
            .push_bind(academic_year.clone());
    }
    if let Some(from) = filters.from {
        qb.push(" AND ta.date >= ").push_bind(from);
    }
    if let Some(to) = filters.to {
        qb.push(" AND ta.date <= ").push_bind(to);
    }
    Ok(())
}

pub struct AttendanceService;

impl AttendanceService {
    /// Upserts one record per student for the date. Students outside the
    /// classroom are reported in `failed_ids`.
    #[instrument(skip(db, dto), fields(classroom_id = %dto.classroom_id, date = %dto.date))]
    pub async fn mark_attendance(
        db: &PgPool,
        dto: MarkAttendanceDto,
        recorded_by: Uuid,
    ) -> Result<MarkAttendanceResponse, AppError> {
        let requested: Vec<Uuid> = dto.records.iter().map(|r| r.student_id).collect();

        let mut tx = db.begin().await?;

        let members: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM students WHERE id = ANY($1) AND classroom_id = $2",
        )
        .bind(&requested)
        .bind(dto.classroom_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let mut recorded_count = 0;
        let mut failed_ids = Vec::new();

        for record in &dto.records {
            if !members.contains(&record.student_id) {
                if !failed_ids.contains(&record.student_id) {
                    failed_ids.push(record.student_id);
                }
                continue;
            }

            sqlx::query(
                r#"INSERT INTO attendance
                       (student_id, classroom_id, date, status, remarks, academic_year, recorded_by)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   ON CONFLICT (student_id, date) DO UPDATE SET
                       classroom_id = EXCLUDED.classroom_id,
                       status = EXCLUDED.status,
                       remarks = EXCLUDED.remarks,
                       academic_year = EXCLUDED.academic_year,
                       recorded_by = EXCLUDED.recorded_by"#,
            )
            .bind(record.student_id)
            .bind(dto.classroom_id)
            .bind(dto.date)
            .bind(record.status)
            .bind(&record.remarks)
            .bind(&dto.academic_year)
            .bind(recorded_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Attendance already recorded"))?;

            recorded_count += 1;
        }

        tx.commit().await?;

        track_attendance_marked("student", recorded_count);
        info!(recorded_count, failed = failed_ids.len(), "Attendance marked");

        Ok(MarkAttendanceResponse {
            recorded_count,
            failed_ids,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_attendance(
        db: &PgPool,
        filters: AttendanceFilterParams,
    ) -> Result<PaginatedAttendanceResponse, AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM attendance a");
        push_filters(&mut count_qb, &filters)?;
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count attendance records")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(RECORD_SELECT);
        push_filters(&mut qb, &filters)?;
        qb.push(" ORDER BY a.date DESC, u.last_name, u.first_name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let records = qb
            .build_query_as::<AttendanceRecord>()
            .fetch_all(db)
            .await
            .context("Failed to fetch attendance records")
            .map_err(AppError::database)?;

        Ok(PaginatedAttendanceResponse {
            data: records,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Every record matching the filters, for export.
    #[instrument(skip(db))]
    pub async fn get_all_attendance(
        db: &PgPool,
        filters: &AttendanceFilterParams,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(RECORD_SELECT);
        push_filters(&mut qb, filters)?;
        qb.push(" ORDER BY a.date, s.admission_number");

        let records = qb.build_query_as::<AttendanceRecord>().fetch_all(db).await?;
        Ok(records)
    }

    #[instrument(skip(db))]
    pub async fn get_summary(
        db: &PgPool,
        filters: &AttendanceFilterParams,
    ) -> Result<AttendanceSummary, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT a.status, COUNT(*) FROM attendance a");
        push_filters(&mut qb, filters)?;
        qb.push(" GROUP BY a.status");

        let counts = qb
            .build_query_as::<(AttendanceStatus, i64)>()
            .fetch_all(db)
            .await
            .context("Failed to summarize attendance")
            .map_err(AppError::database)?;

        Ok(AttendanceSummary::from_counts(counts))
    }

    #[instrument(skip(db))]
    pub async fn get_record_by_id(db: &PgPool, id: Uuid) -> Result<AttendanceRecord, AppError> {
        sqlx::query_as::<_, AttendanceRecord>(&format!("{} WHERE a.id = $1", RECORD_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| not_found("Attendance record"))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_record(
        db: &PgPool,
        id: Uuid,
        dto: UpdateAttendanceDto,
        recorded_by: Uuid,
    ) -> Result<AttendanceRecord, AppError> {
        let result = sqlx::query(
            r#"UPDATE attendance SET
                   status = COALESCE($1, status),
                   remarks = CASE WHEN $2 THEN $3 ELSE remarks END,
                   recorded_by = $4
               WHERE id = $5"#,
        )
        .bind(dto.status)
        .bind(dto.remarks.is_some())
        .bind(dto.remarks.flatten())
        .bind(recorded_by)
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Attendance record"));
        }
        Self::get_record_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete_record(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Attendance record"));
        }
        Ok(())
    }

    /// Same upsert rules as for students; unknown teachers are reported.
    #[instrument(skip(db, dto), fields(date = %dto.date))]
    pub async fn mark_teacher_attendance(
        db: &PgPool,
        dto: MarkTeacherAttendanceDto,
        recorded_by: Uuid,
    ) -> Result<MarkAttendanceResponse, AppError> {
        let requested: Vec<Uuid> = dto.records.iter().map(|r| r.teacher_id).collect();

        let mut tx = db.begin().await?;

        let known: HashSet<Uuid> =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM teachers WHERE id = ANY($1)")
                .bind(&requested)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        let mut recorded_count = 0;
        let mut failed_ids = Vec::new();

        for record in &dto.records {
            if !known.contains(&record.teacher_id) {
                if !failed_ids.contains(&record.teacher_id) {
                    failed_ids.push(record.teacher_id);
                }
                continue;
            }

            sqlx::query(
                r#"INSERT INTO teacher_attendance
                       (teacher_id, date, status, remarks, academic_year, recorded_by)
                   VALUES ($1, $2, $3, $4, $5, $6)
                   ON CONFLICT (teacher_id, date) DO UPDATE SET
                       status = EXCLUDED.status,
                       remarks = EXCLUDED.remarks,
                       academic_year = EXCLUDED.academic_year,
                       recorded_by = EXCLUDED.recorded_by"#,
            )
            .bind(record.teacher_id)
            .bind(dto.date)
            .bind(record.status)
            .bind(&record.remarks)
            .bind(&dto.academic_year)
            .bind(recorded_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, "Attendance already recorded"))?;

            recorded_count += 1;
        }

        tx.commit().await?;

        track_attendance_marked("teacher", recorded_count);
        info!(recorded_count, failed = failed_ids.len(), "Teacher attendance marked");

        Ok(MarkAttendanceResponse {
            recorded_count,
            failed_ids,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_teacher_attendance(
        db: &PgPool,
        filters: TeacherAttendanceFilterParams,
    ) -> Result<PaginatedTeacherAttendanceResponse, AppError> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM teacher_attendance ta");
        push_teacher_filters(&mut count_qb, &filters)?;
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(db)
            .await
            .context("Failed to count teacher attendance")
            .map_err(AppError::database)?;

        let mut qb = QueryBuilder::<Postgres>::new(TEACHER_RECORD_SELECT);
        push_teacher_filters(&mut qb, &filters)?;
        qb.push(" ORDER BY ta.date DESC, u.last_name LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let records = qb
            .build_query_as::<TeacherAttendanceRecord>()
            .fetch_all(db)
            .await?;

        Ok(PaginatedTeacherAttendanceResponse {
            data: records,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_teacher_summary(
        db: &PgPool,
        filters: &TeacherAttendanceFilterParams,
    ) -> Result<AttendanceSummary, AppError> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT ta.status, COUNT(*) FROM teacher_attendance ta");
        push_teacher_filters(&mut qb, filters)?;
        qb.push(" GROUP BY ta.status");

        let counts = qb
            .build_query_as::<(AttendanceStatus, i64)>()
            .fetch_all(db)
            .await?;

        Ok(AttendanceSummary::from_counts(counts))
    }
}
