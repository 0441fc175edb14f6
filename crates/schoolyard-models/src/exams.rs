//! Exam models and DTOs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use schoolyard_core::query::{
    deserialize_optional_date, deserialize_optional_string, deserialize_optional_uuid,
};
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validate_academic_year;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub classroom_id: Uuid,
    pub hall_id: Option<Uuid>,
    pub academic_year: String,
    pub exam_date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "11:00:00")]
    pub end_time: NaiveTime,
    pub max_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_exam_times"))]
pub struct CreateExamDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub subject_id: Uuid,
    pub classroom_id: Uuid,
    pub hall_id: Option<Uuid>,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
    pub exam_date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "11:00:00")]
    pub end_time: NaiveTime,
    #[validate(range(min = 1, max = 1000))]
    pub max_score: Option<i32>,
}

fn validate_exam_times(dto: &CreateExamDto) -> Result<(), ValidationError> {
    if dto.end_time <= dto.start_time {
        return Err(ValidationError::new("end_time")
            .with_message("end_time must be after start_time".into()));
    }
    Ok(())
}

/// Partial update. Times are re-checked against the stored values.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateExamDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub subject_id: Option<Uuid>,
    pub classroom_id: Option<Uuid>,
    pub hall_id: Option<Uuid>,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: Option<String>,
    pub exam_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    #[validate(range(min = 1, max = 1000))]
    pub max_score: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExamFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub classroom_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
    /// Earliest exam date (inclusive)
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    /// Latest exam date (inclusive)
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedExamsResponse {
    pub data: Vec<Exam>,
    pub meta: PaginationMeta,
}
