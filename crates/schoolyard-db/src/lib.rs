//! # Schoolyard DB
//!
//! PostgreSQL pool initialization and schema migrations.
//!
//! ```ignore
//! use schoolyard_config::DatabaseConfig;
//!
//! let pool = schoolyard_db::init_db_pool(&DatabaseConfig::from_env()).await?;
//! schoolyard_db::run_migrations(&pool).await?;
//! ```

use schoolyard_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;

/// Migrations embedded from the workspace `migrations/` directory.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Connects a pool using the configured URL and size.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
