//! Classroom models and DTOs.
//!
//! A classroom is a grade + section for one academic year. The combination is
//! unique, and `capacity` caps the number of enrolled students.

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
pub struct Classroom {
    pub id: Uuid,
    /// e.g. `JSS1`, `Grade 5`
    pub grade: String,
    /// e.g. `A`
    pub section: String,
    pub academic_year: String,
    pub capacity: i32,
    pub hall_id: Option<Uuid>,
    pub homeroom_teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassroomWithStats {
    pub id: Uuid,
    pub grade: String,
    pub section: String,
    pub academic_year: String,
    pub capacity: i32,
    pub hall_id: Option<Uuid>,
    pub hall_name: Option<String>,
    pub homeroom_teacher_id: Option<Uuid>,
    pub homeroom_teacher_name: Option<String>,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClassroomDto {
    #[validate(length(min = 1, max = 20))]
    pub grade: String,
    #[validate(length(min = 1, max = 20))]
    pub section: String,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: i32,
    pub hall_id: Option<Uuid>,
    pub homeroom_teacher_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassroomDto {
    #[validate(length(min = 1, max = 20))]
    pub grade: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub section: Option<String>,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: Option<String>,
    #[validate(range(min = 1, message = "capacity must be at least 1"))]
    pub capacity: Option<i32>,
    pub hall_id: Option<Uuid>,
    pub homeroom_teacher_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassroomFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub grade: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedClassroomsResponse {
    pub data: Vec<ClassroomWithStats>,
    pub meta: PaginationMeta,
}

/// Seats left before the classroom is full.
pub fn remaining_seats(capacity: i32, enrolled: i64) -> i64 {
    (i64::from(capacity) - enrolled).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto() -> CreateClassroomDto {
        CreateClassroomDto {
            grade: "JSS1".to_string(),
            section: "A".to_string(),
            academic_year: "2024-2025".to_string(),
            capacity: 30,
            hall_id: None,
            homeroom_teacher_id: None,
        }
    }

    #[test]
    fn test_create_classroom_dto_validation() {
        assert!(create_dto().validate().is_ok());

        let zero = CreateClassroomDto {
            capacity: 0,
            ..create_dto()
        };
        assert!(zero.validate().is_err());

        let bad_year = CreateClassroomDto {
            academic_year: "2024".to_string(),
            ..create_dto()
        };
        assert!(bad_year.validate().is_err());

        let no_section = CreateClassroomDto {
            section: String::new(),
            ..create_dto()
        };
        assert!(no_section.validate().is_err());
    }

    #[test]
    fn test_update_classroom_dto_validation() {
        assert!(UpdateClassroomDto::default().validate().is_ok());

        let dto = UpdateClassroomDto {
            academic_year: Some("2024-2027".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateClassroomDto {
            capacity: Some(-1),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_remaining_seats() {
        assert_eq!(remaining_seats(30, 28), 2);
        assert_eq!(remaining_seats(30, 30), 0);
        assert_eq!(remaining_seats(30, 35), 0);
    }
}
