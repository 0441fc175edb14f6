//! Academic year models.
//!
//! Academic years are keyed by name (`2024-2025`); attendance, results,
//! payments and classrooms refer to them by that name.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validate_academic_year;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicYear {
    pub id: Uuid,
    /// e.g. `2024-2025`
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// At most one year is current
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_year_dates"))]
pub struct CreateAcademicYearDto {
    #[validate(custom(function = "validate_academic_year"))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Mark the new year as current right away
    #[serde(default)]
    pub is_current: bool,
}

fn validate_year_dates(dto: &CreateAcademicYearDto) -> Result<(), ValidationError> {
    if dto.end_date <= dto.start_date {
        return Err(ValidationError::new("end_date")
            .with_message("end_date must be after start_date".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(name: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> CreateAcademicYearDto {
        CreateAcademicYearDto {
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            is_current: false,
        }
    }

    #[test]
    fn test_valid_year() {
        assert!(dto("2024-2025", (2024, 9, 2), (2025, 7, 18)).validate().is_ok());
    }

    #[test]
    fn test_invalid_name() {
        assert!(dto("2024-2026", (2024, 9, 2), (2025, 7, 18)).validate().is_err());
        assert!(dto("Year 1", (2024, 9, 2), (2025, 7, 18)).validate().is_err());
    }

    #[test]
    fn test_end_before_start() {
        assert!(dto("2024-2025", (2025, 7, 18), (2024, 9, 2)).validate().is_err());
        assert!(dto("2024-2025", (2024, 9, 2), (2024, 9, 2)).validate().is_err());
    }
}
