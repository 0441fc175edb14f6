//! Batched inserts, all inside the caller's transaction.

use schoolyard_auth::UserRole;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::models::{
    ClassroomSeed, ParentSeed, SeedConfig, StudentSeed, TeacherSeed, UserSeed, year_bounds,
};

type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

// Postgres allows 65535 bind parameters per statement
const BATCH_SIZE: usize = 1000;

const SUBJECTS: &[(&str, &str)] = &[
    ("Mathematics", "MTH"),
    ("English Language", "ENG"),
    ("Physics", "PHY"),
    ("Chemistry", "CHM"),
    ("Biology", "BIO"),
    ("History", "HIS"),
];

/// `($1, $2, ...), ($n+1, ...)` for `rows` rows of `columns` parameters.
fn placeholders(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|row| {
            let params: Vec<String> = (1..=columns)
                .map(|col| format!("${}", row * columns + col))
                .collect();
            format!("({})", params.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn ensure_academic_year(
    tx: &mut Transaction<'_, Postgres>,
    academic_year: &str,
) -> SeedResult<()> {
    let (start_date, end_date) = year_bounds(academic_year)
        .ok_or_else(|| format!("Invalid academic year {}", academic_year))?;

    sqlx::query(
        "INSERT INTO academic_years (name, start_date, end_date, is_current)
         VALUES ($1, $2, $3, NOT EXISTS (SELECT 1 FROM academic_years WHERE is_current))
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(academic_year)
    .bind(start_date)
    .bind(end_date)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Inserts the standard subjects that are missing; returns how many exist.
pub async fn ensure_subjects(tx: &mut Transaction<'_, Postgres>) -> SeedResult<i64> {
    let query = format!(
        "INSERT INTO subjects (name, code) VALUES {} ON CONFLICT DO NOTHING",
        placeholders(SUBJECTS.len(), 2)
    );
    let mut q = sqlx::query(&query);
    for (name, code) in SUBJECTS {
        q = q.bind(*name).bind(*code);
    }
    q.execute(&mut **tx).await?;

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subjects")
        .fetch_one(&mut **tx)
        .await?;
    Ok(count)
}

async fn insert_users(
    tx: &mut Transaction<'_, Postgres>,
    users: &[&UserSeed],
    role: UserRole,
) -> SeedResult<Vec<Uuid>> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "INSERT INTO users (first_name, last_name, email, password, role, phone) VALUES {} RETURNING id",
        placeholders(users.len(), 6)
    );

    let mut q = sqlx::query_scalar::<_, Uuid>(&query);
    for user in users {
        q = q
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(role)
            .bind(&user.phone);
    }

    Ok(q.fetch_all(&mut **tx).await?)
}

pub async fn insert_teachers(
    tx: &mut Transaction<'_, Postgres>,
    teachers: &[TeacherSeed],
) -> SeedResult<Vec<Uuid>> {
    let mut all_ids = Vec::with_capacity(teachers.len());

    for chunk in teachers.chunks(BATCH_SIZE) {
        let users: Vec<&UserSeed> = chunk.iter().map(|t| &t.user).collect();
        let user_ids = insert_users(tx, &users, UserRole::Teacher).await?;

        let query = format!(
            "INSERT INTO teachers (user_id, employee_number, specialization, hire_date) VALUES {} RETURNING id",
            placeholders(chunk.len(), 4)
        );
        let mut q = sqlx::query_scalar::<_, Uuid>(&query);
        for (user_id, teacher) in user_ids.iter().zip(chunk) {
            q = q
                .bind(user_id)
                .bind(&teacher.employee_number)
                .bind(&teacher.specialization)
                .bind(teacher.hire_date);
        }
        all_ids.extend(q.fetch_all(&mut **tx).await?);
    }

    Ok(all_ids)
}

/// Homeroom teachers are assigned round-robin. Re-seeding a year grows the
/// existing classrooms instead of failing on the unique key.
pub async fn insert_classrooms(
    tx: &mut Transaction<'_, Postgres>,
    classrooms: &[ClassroomSeed],
    teacher_ids: &[Uuid],
    config: &SeedConfig,
) -> SeedResult<Vec<Uuid>> {
    if classrooms.is_empty() {
        return Ok(Vec::new());
    }

    let query = format!(
        "INSERT INTO classrooms (grade, section, academic_year, capacity, homeroom_teacher_id)
         VALUES {}
         ON CONFLICT (grade, section, academic_year)
         DO UPDATE SET capacity = classrooms.capacity + EXCLUDED.capacity
         RETURNING id",
        placeholders(classrooms.len(), 5)
    );
    let mut q = sqlx::query_scalar::<_, Uuid>(&query);
    for (idx, classroom) in classrooms.iter().enumerate() {
        let homeroom = (!teacher_ids.is_empty()).then(|| teacher_ids[idx % teacher_ids.len()]);
        q = q
            .bind(&classroom.grade)
            .bind(&classroom.section)
            .bind(&config.academic_year)
            .bind(classroom.capacity)
            .bind(homeroom);
    }

    Ok(q.fetch_all(&mut **tx).await?)
}

pub async fn insert_parents(
    tx: &mut Transaction<'_, Postgres>,
    parents: &[ParentSeed],
) -> SeedResult<Vec<Uuid>> {
    let mut all_ids = Vec::with_capacity(parents.len());

    for chunk in parents.chunks(BATCH_SIZE) {
        let users: Vec<&UserSeed> = chunk.iter().map(|p| &p.user).collect();
        let user_ids = insert_users(tx, &users, UserRole::Parent).await?;

        let query = format!(
            "INSERT INTO parents (user_id, occupation, address) VALUES {} RETURNING id",
            placeholders(chunk.len(), 3)
        );
        let mut q = sqlx::query_scalar::<_, Uuid>(&query);
        for (user_id, parent) in user_ids.iter().zip(chunk) {
            q = q
                .bind(user_id)
                .bind(&parent.occupation)
                .bind(&parent.address);
        }
        all_ids.extend(q.fetch_all(&mut **tx).await?);
    }

    Ok(all_ids)
}

pub async fn insert_students(
    tx: &mut Transaction<'_, Postgres>,
    students: &[StudentSeed],
    classroom_ids: &[Uuid],
    parent_ids: &[Uuid],
) -> SeedResult<usize> {
    let mut inserted = 0;

    for chunk in students.chunks(BATCH_SIZE) {
        let users: Vec<&UserSeed> = chunk.iter().map(|s| &s.user).collect();
        let user_ids = insert_users(tx, &users, UserRole::Student).await?;

        let query = format!(
            "INSERT INTO students (user_id, admission_number, date_of_birth, gender, classroom_id, parent_id) VALUES {}",
            placeholders(chunk.len(), 6)
        );
        let mut q = sqlx::query(&query);
        for (user_id, student) in user_ids.iter().zip(chunk) {
            q = q
                .bind(user_id)
                .bind(&student.admission_number)
                .bind(student.date_of_birth)
                .bind(student.gender)
                .bind(classroom_ids.get(student.classroom_idx).copied())
                .bind(parent_ids.get(student.parent_idx).copied());
        }
        inserted += q.execute(&mut **tx).await?.rows_affected() as usize;
    }

    Ok(inserted)
}
