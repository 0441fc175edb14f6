//! Types and rules shared by several resources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Result of linking a batch of students to a parent, classroom or hall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkAssignResponse {
    pub assigned_count: usize,
    /// IDs that were skipped (unknown, already assigned, or not eligible)
    pub failed_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignStudentsDto {
    #[validate(length(min = 1, message = "student_ids must not be empty"))]
    pub student_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Checks an academic year name of the form `2024-2025`.
///
/// Both halves are four-digit years and the second is the first plus one.
pub fn validate_academic_year(name: &str) -> Result<(), ValidationError> {
    let invalid = || {
        ValidationError::new("academic_year")
            .with_message("academic year must look like 2024-2025".into())
    };

    let (first, second) = name.split_once('-').ok_or_else(invalid)?;
    if first.len() != 4 || second.len() != 4 {
        return Err(invalid());
    }
    if !first.bytes().chain(second.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let first: u32 = first.parse().map_err(|_| invalid())?;
    let second: u32 = second.parse().map_err(|_| invalid())?;
    if second != first + 1 {
        return Err(ValidationError::new("academic_year")
            .with_message("academic year must span two consecutive years".into()));
    }

    Ok(())
}

/// `from` must not be after `to` when both are present.
pub fn date_range_is_valid(from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    match (from, to) {
        (Some(from), Some(to)) => from <= to,
        _ => true,
    }
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
