//! Student domain models and DTOs.
//!
//! A student is a `users` row with role `student` plus a `students` row holding
//! enrolment details. Both are created and removed together.

use chrono::{DateTime, NaiveDate, Utc};
use schoolyard_core::query::{
    deserialize_nullable, deserialize_optional_string, deserialize_optional_uuid,
};
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// A student joined with their user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub admission_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub classroom_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub enrolled_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStudentDto {
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
    pub admission_number: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    pub address: Option<String>,
    pub classroom_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    /// Defaults to today
    pub enrolled_on: Option<NaiveDate>,
}

/// Partial update. Absent fields keep their value; `null` for `classroom_id`
/// or `parent_id` unlinks the student.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Resets the student's password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub admission_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub classroom_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
    pub enrolled_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub classroom_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub parent_id: Option<Uuid>,
    /// Matches first name, last name, email or admission number
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<Student>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto() -> CreateStudentDto {
        CreateStudentDto {
            first_name: "Chidi".to_string(),
            last_name: "Okafor".to_string(),
            email: "chidi@school.test".to_string(),
            password: "password123".to_string(),
            phone: None,
            admission_number: "ADM-0001".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2012, 3, 14),
            gender: Some("male".to_string()),
            address: None,
            classroom_id: None,
            parent_id: None,
            enrolled_on: None,
        }
    }

    #[test]
    fn test_create_student_dto_validation() {
        assert!(create_dto().validate().is_ok());
    }

    #[test]
    fn test_create_student_dto_invalid_fields() {
        let mut dto = create_dto();
        dto.email = "not-an-email".to_string();
        assert!(dto.validate().is_err());

        let mut dto = create_dto();
        dto.password = "short".to_string();
        assert!(dto.validate().is_err());

        let mut dto = create_dto();
        dto.admission_number = String::new();
        assert!(dto.validate().is_err());

        let mut dto = create_dto();
        dto.first_name = "x".repeat(101);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_student_dto_partial() {
        assert!(UpdateStudentDto::default().validate().is_ok());

        let dto = UpdateStudentDto {
            password: Some("1234".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_student_dto_null_unlinks() {
        let dto: UpdateStudentDto =
            serde_json::from_str(r#"{"classroom_id":null,"first_name":"Ada"}"#).unwrap();
        assert_eq!(dto.classroom_id, Some(None));
        assert_eq!(dto.parent_id, None);
    }

    #[test]
    fn test_filter_params_from_query_values() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"classroom_id":"{}","parent_id":"","search":"oka","page":"2","limit":"5"}}"#,
            id
        );
        let params: StudentFilterParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params.classroom_id, Some(id));
        assert_eq!(params.parent_id, None);
        assert_eq!(params.search.as_deref(), Some("oka"));
        assert_eq!(params.pagination.offset(), 5);
    }
}
