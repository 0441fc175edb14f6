//! Homework assignments set by teachers for a classroom.

use chrono::{DateTime, NaiveDate, Utc};
use schoolyard_core::query::{
    deserialize_optional_date, deserialize_optional_string, deserialize_optional_uuid,
};
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validate_academic_year;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub classroom_id: Uuid,
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub due_date: NaiveDate,
    pub max_score: i32,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Uuid,
    pub classroom_id: Uuid,
    /// Required for admins; teachers always create their own
    pub teacher_id: Option<Uuid>,
    pub due_date: NaiveDate,
    #[validate(range(min = 1, max = 1000))]
    pub max_score: Option<i32>,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAssignmentDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject_id: Option<Uuid>,
    pub classroom_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 1000))]
    pub max_score: Option<i32>,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub classroom_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub due_from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub due_to: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedAssignmentsResponse {
    pub data: Vec<Assignment>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assignment_dto_validation() {
        let dto = CreateAssignmentDto {
            title: "Fractions worksheet".to_string(),
            description: Some("Exercises 1-20".to_string()),
            subject_id: Uuid::new_v4(),
            classroom_id: Uuid::new_v4(),
            teacher_id: None,
            due_date: NaiveDate::from_ymd_opt(2024, 10, 11).unwrap(),
            max_score: Some(20),
            academic_year: "2024-2025".to_string(),
        };
        assert!(dto.validate().is_ok());

        let dto = CreateAssignmentDto {
            max_score: Some(0),
            ..dto
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_filter_params_due_range() {
        let params: AssignmentFilterParams =
            serde_json::from_str(r#"{"due_from":"2024-10-01","due_to":"2024-10-31","limit":"10"}"#)
                .unwrap();
        assert_eq!(params.due_from, NaiveDate::from_ymd_opt(2024, 10, 1));
        assert_eq!(params.due_to, NaiveDate::from_ymd_opt(2024, 10, 31));
        assert_eq!(params.pagination.limit(), 10);
    }
}
