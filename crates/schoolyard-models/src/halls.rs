//! Exam halls and seat assignments.

use chrono::{DateTime, Utc};
use schoolyard_core::query::deserialize_optional_string;
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validate_academic_year;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Hall {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateHallDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: i32,
    #[validate(length(max = 255))]
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateHallDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<i32>,
    #[validate(length(max = 255))]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HallFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedHallsResponse {
    pub data: Vec<Hall>,
    pub meta: PaginationMeta,
}

/// A student's seat in a hall for one exam title.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HallAssignment {
    pub id: Uuid,
    pub hall_id: Uuid,
    pub hall_name: String,
    pub student_id: Uuid,
    pub student_name: String,
    pub admission_number: String,
    pub exam_title: String,
    pub academic_year: String,
    pub seat_number: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignHallDto {
    #[validate(length(min = 1, max = 200))]
    pub exam_title: String,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
    #[validate(length(min = 1, message = "student_ids must not be empty"))]
    pub student_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HallAssignmentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub exam_title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
}

/// Seat numbers handed out after the current highest seat.
pub fn next_seats(current_max: i32, count: usize) -> Vec<i32> {
    (1..=count as i32).map(|n| current_max + n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_hall_dto_validation() {
        let dto = CreateHallDto {
            name: "Main Hall".to_string(),
            capacity: 120,
            location: Some("Block A".to_string()),
        };
        assert!(dto.validate().is_ok());

        let dto = CreateHallDto { capacity: 0, ..dto };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_assign_hall_dto_validation() {
        let dto = AssignHallDto {
            exam_title: "First Term Examination".to_string(),
            academic_year: "2024-2025".to_string(),
            student_ids: vec![Uuid::new_v4()],
        };
        assert!(dto.validate().is_ok());

        let empty = AssignHallDto {
            student_ids: vec![],
            ..dto
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_next_seats_continue_numbering() {
        assert_eq!(next_seats(0, 3), vec![1, 2, 3]);
        assert_eq!(next_seats(17, 2), vec![18, 19]);
        assert!(next_seats(5, 0).is_empty());
    }
}
