//! Teacher domain models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use schoolyard_core::query::deserialize_optional_string;
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Teacher {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employee_number: String,
    pub specialization: Option<String>,
    pub qualification: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeacherDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub employee_number: String,
    #[validate(length(max = 100))]
    pub specialization: Option<String>,
    #[validate(length(max = 100))]
    pub qualification: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTeacherDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub employee_number: Option<String>,
    #[validate(length(max = 100))]
    pub specialization: Option<String>,
    #[validate(length(max = 100))]
    pub qualification: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherFilterParams {
    /// Matches name, email or employee number
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedTeachersResponse {
    pub data: Vec<Teacher>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_teacher_dto_validation() {
        let dto = CreateTeacherDto {
            first_name: "Ngozi".to_string(),
            last_name: "Eze".to_string(),
            email: "ngozi@school.test".to_string(),
            password: "password123".to_string(),
            phone: Some("+2348000000000".to_string()),
            employee_number: "EMP-042".to_string(),
            specialization: Some("Mathematics".to_string()),
            qualification: Some("B.Sc".to_string()),
            hire_date: NaiveDate::from_ymd_opt(2019, 1, 7),
        };
        assert!(dto.validate().is_ok());

        let dto = CreateTeacherDto {
            employee_number: String::new(),
            ..dto
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_teacher_dto_validation() {
        assert!(UpdateTeacherDto::default().validate().is_ok());

        let dto = UpdateTeacherDto {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
