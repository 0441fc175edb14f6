//! Maps constraint violations to client errors.

use std::collections::HashSet;

use anyhow::anyhow;
use schoolyard_core::AppError;
use uuid::Uuid;

/// For inserts and updates: unique violations become 409 with `conflict`,
/// foreign key and check violations become 400.
pub fn write_error(err: sqlx::Error, conflict: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::conflict(anyhow!("{}", conflict));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::bad_request(anyhow!("Referenced record does not exist"));
        }
        if db_err.is_check_violation() {
            return AppError::bad_request(anyhow!("Value out of allowed range"));
        }
    }
    AppError::from(err)
}

/// For deletes: a foreign key violation means the row is still referenced.
pub fn delete_error(err: sqlx::Error, in_use: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_foreign_key_violation()
    {
        return AppError::conflict(anyhow!("{}", in_use));
    }
    AppError::from(err)
}

pub fn not_found(entity: &str) -> AppError {
    AppError::not_found(anyhow!("{} not found", entity))
}

/// IDs from `requested` that are not in `done`, first occurrence only.
pub fn missing_ids(requested: &[Uuid], done: &[Uuid]) -> Vec<Uuid> {
    let done: HashSet<&Uuid> = done.iter().collect();
    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|id| !done.contains(id) && seen.insert(**id))
        .copied()
        .collect()
}
