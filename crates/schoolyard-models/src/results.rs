//! Results (grades) and the grading rules.
//!
//! A result holds five score components whose maxima add up to 100:
//!
//! | component     | max |
//! |---------------|-----|
//! | `first_test`  | 10  |
//! | `second_test` | 10  |
//! | `assignment`  | 10  |
//! | `midterm`     | 20  |
//! | `final_exam`  | 50  |
//!
//! The total is their sum and the letter grade follows fixed thresholds
//! (A >= 90, B >= 80, C >= 70, D >= 60, E >= 50, F otherwise).

use std::fmt;

use chrono::{DateTime, Utc};
use schoolyard_core::query::{deserialize_optional_string, deserialize_optional_uuid};
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{round2, validate_academic_year};

pub const FIRST_TEST_MAX: f64 = 10.0;
pub const SECOND_TEST_MAX: f64 = 10.0;
pub const ASSIGNMENT_MAX: f64 = 10.0;
pub const MIDTERM_MAX: f64 = 20.0;
pub const FINAL_EXAM_MAX: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::A,
            s if s >= 80.0 => Grade::B,
            s if s >= 70.0 => Grade::C,
            s if s >= 60.0 => Grade::D,
            s if s >= 50.0 => Grade::E,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five graded components of a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Scores {
    #[validate(range(min = 0.0, max = 10.0, message = "first_test must be between 0 and 10"))]
    pub first_test: f64,
    #[validate(range(min = 0.0, max = 10.0, message = "second_test must be between 0 and 10"))]
    pub second_test: f64,
    #[validate(range(min = 0.0, max = 10.0, message = "assignment must be between 0 and 10"))]
    pub assignment: f64,
    #[validate(range(min = 0.0, max = 20.0, message = "midterm must be between 0 and 20"))]
    pub midterm: f64,
    #[validate(range(min = 0.0, max = 50.0, message = "final_exam must be between 0 and 50"))]
    pub final_exam: f64,
}

impl Scores {
    pub fn total(&self) -> f64 {
        round2(
            self.first_test + self.second_test + self.assignment + self.midterm + self.final_exam,
        )
    }

    pub fn grade(&self) -> Grade {
        Grade::from_score(self.total())
    }
}

/// A stored result with student and subject details.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentResult {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub admission_number: String,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub subject_code: String,
    pub academic_year: String,
    pub first_test: f64,
    pub second_test: f64,
    pub assignment: f64,
    pub midterm: f64,
    pub final_exam: f64,
    pub total: f64,
    pub grade: String,
    pub remarks: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateResultDto {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
    #[validate(nested)]
    pub scores: Scores,
    #[validate(length(max = 255))]
    pub remarks: Option<String>,
}

/// Replaces the scores of an existing result. Total and grade are recomputed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateResultDto {
    #[validate(nested)]
    pub scores: Scores,
    #[validate(length(max = 255))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    /// Students currently enrolled in this classroom
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub classroom_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResultsResponse {
    pub data: Vec<StudentResult>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AcademicYearQuery {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubjectScore {
    pub subject_id: Uuid,
    pub subject_name: String,
    pub total: f64,
    pub grade: String,
}

/// A student's results across subjects with the average and its grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResultSummary {
    pub student_id: Uuid,
    pub academic_year: Option<String>,
    pub subjects: Vec<SubjectScore>,
    pub subject_count: usize,
    pub grand_total: f64,
    pub average: f64,
    pub grade: Grade,
}

impl ResultSummary {
    pub fn from_results(
        student_id: Uuid,
        academic_year: Option<String>,
        results: &[StudentResult],
    ) -> Self {
        let subjects: Vec<SubjectScore> = results
            .iter()
            .map(|r| SubjectScore {
                subject_id: r.subject_id,
                subject_name: r.subject_name.clone(),
                total: r.total,
                grade: r.grade.clone(),
            })
            .collect();

        let subject_count = subjects.len();
        let grand_total = round2(subjects.iter().map(|s| s.total).sum());
        let average = if subject_count == 0 {
            0.0
        } else {
            round2(grand_total / subject_count as f64)
        };

        Self {
            student_id,
            academic_year,
            subjects,
            subject_count,
            grand_total,
            average,
            grade: Grade::from_score(average),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(first: f64, second: f64, assignment: f64, midterm: f64, final_exam: f64) -> Scores {
        Scores {
            first_test: first,
            second_test: second,
            assignment,
            midterm,
            final_exam,
        }
    }

    #[test]
    fn test_maxima_sum_to_one_hundred() {
        let max = scores(
            FIRST_TEST_MAX,
            SECOND_TEST_MAX,
            ASSIGNMENT_MAX,
            MIDTERM_MAX,
            FINAL_EXAM_MAX,
        );
        assert_eq!(max.total(), 100.0);
        assert!(max.validate().is_ok());
        assert_eq!(max.grade(), Grade::A);
    }

    #[test]
    fn test_total_is_rounded() {
        let s = scores(7.5, 8.25, 9.1, 15.333, 40.0);
        assert_eq!(s.total(), 80.18);
        assert_eq!(s.grade(), Grade::B);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.99), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(69.5), Grade::D);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(50.0), Grade::E);
        assert_eq!(Grade::from_score(49.99), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn test_component_bounds() {
        assert!(scores(10.5, 0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(scores(0.0, 0.0, 0.0, 21.0, 0.0).validate().is_err());
        assert!(scores(0.0, 0.0, 0.0, 0.0, 50.1).validate().is_err());
        assert!(scores(-1.0, 0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(scores(0.0, 0.0, 0.0, 0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_create_result_validates_nested_scores() {
        let dto = CreateResultDto {
            student_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            academic_year: "2024-2025".to_string(),
            scores: scores(10.0, 10.0, 10.0, 25.0, 50.0),
            remarks: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.errors().contains_key("scores"));
    }

    fn result(subject: &str, total: f64) -> StudentResult {
        StudentResult {
            id: Uuid::new_v4(),
            student_id: Uuid::nil(),
            student_name: "Ada Obi".to_string(),
            admission_number: "ADM-1".to_string(),
            subject_id: Uuid::new_v4(),
            subject_name: subject.to_string(),
            subject_code: subject.to_uppercase(),
            academic_year: "2024-2025".to_string(),
            first_test: 0.0,
            second_test: 0.0,
            assignment: 0.0,
            midterm: 0.0,
            final_exam: total,
            total,
            grade: Grade::from_score(total).to_string(),
            remarks: None,
            recorded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_average_and_grade() {
        let results = vec![
            result("Mathematics", 92.0),
            result("English", 71.0),
            result("Physics", 68.5),
        ];
        let summary =
            ResultSummary::from_results(Uuid::nil(), Some("2024-2025".to_string()), &results);

        assert_eq!(summary.subject_count, 3);
        assert_eq!(summary.grand_total, 231.5);
        assert_eq!(summary.average, 77.17);
        assert_eq!(summary.grade, Grade::C);
        assert_eq!(summary.subjects[0].grade, "A");
    }

    #[test]
    fn test_summary_without_results() {
        let summary = ResultSummary::from_results(Uuid::nil(), None, &[]);
        assert_eq!(summary.subject_count, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.grade, Grade::F);
    }
}
