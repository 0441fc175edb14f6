//! Fake data for development databases.
//!
//! Rows are generated in parallel with `rayon` and inserted with multi-value
//! `INSERT` statements inside a single transaction, so a failed run leaves
//! nothing behind. Seeded accounts use `@example.com` addresses and share one
//! password, [`SEED_PASSWORD`].

mod generate;
mod insert;
pub mod models;

use sqlx::PgPool;
use std::time::Instant;

pub use models::SeedConfig;

/// Password of every seeded account.
pub const SEED_PASSWORD: &str = "password123";

/// Low bcrypt cost keeps seeding fast; never used for real accounts.
const SEED_BCRYPT_COST: u32 = 4;

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    config.validate()?;

    println!("🌱 Starting database seeding...");
    println!("   - Academic year: {}", config.academic_year);
    println!(
        "   - {} teachers, {} classrooms, {} students",
        config.teachers, config.classrooms, config.students
    );

    println!("\n🔧 Generating fake data in parallel...");
    let gen_start = Instant::now();
    let password_hash = bcrypt::hash(SEED_PASSWORD, SEED_BCRYPT_COST)?;
    let batch = generate::generate_batch(&config, &password_hash);
    println!(
        "   ✓ Generated {} teachers, {} parents and {} students in {:?}",
        batch.teachers.len(),
        batch.parents.len(),
        batch.students.len(),
        gen_start.elapsed()
    );

    let mut tx = db.begin().await?;

    insert::ensure_academic_year(&mut tx, &config.academic_year).await?;
    let subjects = insert::ensure_subjects(&mut tx).await?;
    println!("   ✓ Academic year and {} subjects ready", subjects);

    let teacher_ids = insert::insert_teachers(&mut tx, &batch.teachers).await?;
    println!("   ✓ Inserted {} teachers", teacher_ids.len());

    let classroom_ids =
        insert::insert_classrooms(&mut tx, &batch.classrooms, &teacher_ids, &config).await?;
    println!("   ✓ Inserted {} classrooms", classroom_ids.len());

    let parent_ids = insert::insert_parents(&mut tx, &batch.parents).await?;
    println!("   ✓ Inserted {} parents", parent_ids.len());

    let student_count =
        insert::insert_students(&mut tx, &batch.students, &classroom_ids, &parent_ids).await?;
    println!("   ✓ Inserted {} students", student_count);

    tx.commit().await?;

    println!(
        "\n✅ Seeding completed in {:?} (password for all accounts: {})",
        start_time.elapsed(),
        SEED_PASSWORD
    );
    Ok(())
}

/// Deletes everything except admin accounts.
pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;
    let mut deleted = 0;
    for statement in [
        "DELETE FROM announcements",
        "DELETE FROM users WHERE role <> 'admin'",
        "DELETE FROM exams",
        "DELETE FROM classrooms",
        "DELETE FROM halls",
        "DELETE FROM subjects",
        "DELETE FROM academic_years",
    ] {
        deleted += sqlx::query(statement)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;

    println!(
        "   ✓ Deleted {} rows in {:?} (admins kept)",
        deleted,
        start_time.elapsed()
    );
    Ok(())
}
