//! Attendance models, filters and statistics.
//!
//! One record exists per student per date. Marking the same student twice on
//! one date updates the existing record.
//!
//! The attendance rate counts `late` as attended and leaves `day_off` out of
//! the denominator:
//!
//! ```text
//! rate = 100 * (present + late) / (total - day_off)
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use schoolyard_core::query::{
    deserialize_nullable, deserialize_optional_date, deserialize_optional_parsed,
    deserialize_optional_string, deserialize_optional_uuid,
};
use schoolyard_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{round2, validate_academic_year};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "attendance_status", rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
    DayOff,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
        AttendanceStatus::DayOff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
            AttendanceStatus::DayOff => "day_off",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid attendance status: {}", s))
    }
}

/// A student attendance record with the student's name attached.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub admission_number: String,
    pub classroom_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub academic_year: String,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AttendanceEntryDto {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 255))]
    pub remarks: Option<String>,
}

/// Marks a whole classroom for one date.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkAttendanceDto {
    pub classroom_id: Uuid,
    pub date: NaiveDate,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
    #[validate(length(min = 1, message = "records must not be empty"), nested)]
    pub records: Vec<AttendanceEntryDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MarkAttendanceResponse {
    pub recorded_count: usize,
    /// Students (or teachers) that could not be marked
    pub failed_ids: Vec<Uuid>,
}

/// `"remarks": null` clears the remarks; an absent field keeps them.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAttendanceDto {
    pub status: Option<AttendanceStatus>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 255))]
    pub remarks: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub classroom_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_parsed")]
    pub status: Option<AttendanceStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
    /// First date (inclusive)
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    /// Last date (inclusive)
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedAttendanceResponse {
    pub data: Vec<AttendanceRecord>,
    pub meta: PaginationMeta,
}

/// Counts per status plus the attendance rate (percent, two decimals).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    pub day_off: i64,
    pub attendance_rate: f64,
}

impl AttendanceSummary {
    /// Builds a summary from `(status, count)` pairs as returned by a
    /// `GROUP BY status` query. Repeated statuses are added up.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (AttendanceStatus, i64)>,
    {
        let mut summary = Self::default();
        for (status, count) in counts {
            let count = count.max(0);
            summary.total += count;
            match status {
                AttendanceStatus::Present => summary.present += count,
                AttendanceStatus::Absent => summary.absent += count,
                AttendanceStatus::Late => summary.late += count,
                AttendanceStatus::Excused => summary.excused += count,
                AttendanceStatus::DayOff => summary.day_off += count,
            }
        }
        summary.attendance_rate = attendance_rate(&summary);
        summary
    }

    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = AttendanceStatus>,
    {
        Self::from_counts(statuses.into_iter().map(|s| (s, 1)))
    }
}

fn attendance_rate(summary: &AttendanceSummary) -> f64 {
    let countable = summary.total - summary.day_off;
    if countable <= 0 {
        return 0.0;
    }
    round2(100.0 * (summary.present + summary.late) as f64 / countable as f64)
}

// Teacher attendance

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TeacherAttendanceRecord {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub employee_number: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub academic_year: String,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TeacherAttendanceEntryDto {
    pub teacher_id: Uuid,
    pub status: AttendanceStatus,
    #[validate(length(max = 255))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MarkTeacherAttendanceDto {
    pub date: NaiveDate,
    #[validate(custom(function = "validate_academic_year"))]
    pub academic_year: String,
    #[validate(length(min = 1, message = "records must not be empty"), nested)]
    pub records: Vec<TeacherAttendanceEntryDto>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherAttendanceFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_parsed")]
    pub status: Option<AttendanceStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedTeacherAttendanceResponse {
    pub data: Vec<TeacherAttendanceRecord>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttendanceStatus::*;

    #[test]
    fn test_status_names_round_trip() {
        for status in AttendanceStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
            assert_eq!(status.as_str().parse::<AttendanceStatus>(), Ok(status));
        }
        assert!("on_leave".parse::<AttendanceStatus>().is_err());
        assert!("Present".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_summary_counts_and_rate() {
        let summary = AttendanceSummary::from_statuses([
            Present, Present, Present, Late, Absent, Excused, DayOff,
        ]);
        assert_eq!(summary.total, 7);
        assert_eq!(summary.present, 3);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.absent, 1);
        assert_eq!(summary.excused, 1);
        assert_eq!(summary.day_off, 1);
        // (3 + 1) / (7 - 1)
        assert_eq!(summary.attendance_rate, 66.67);
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        let summary = AttendanceSummary::from_statuses(Vec::new());
        assert_eq!(summary, AttendanceSummary::default());
        assert_eq!(summary.attendance_rate, 0.0);
    }

    #[test]
    fn test_only_days_off_gives_zero_rate() {
        let summary = AttendanceSummary::from_statuses([DayOff, DayOff]);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.attendance_rate, 0.0);
    }

    #[test]
    fn test_perfect_attendance() {
        let summary = AttendanceSummary::from_counts([(Present, 18), (Late, 2), (DayOff, 3)]);
        assert_eq!(summary.total, 23);
        assert_eq!(summary.attendance_rate, 100.0);
    }

    #[test]
    fn test_from_counts_merges_duplicates() {
        let summary = AttendanceSummary::from_counts([(Absent, 2), (Absent, 3), (Present, 5)]);
        assert_eq!(summary.absent, 5);
        assert_eq!(summary.attendance_rate, 50.0);
    }

    fn mark_dto(records: Vec<AttendanceEntryDto>) -> MarkAttendanceDto {
        MarkAttendanceDto {
            classroom_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            academic_year: "2024-2025".to_string(),
            records,
        }
    }

    #[test]
    fn test_mark_attendance_requires_records() {
        assert!(mark_dto(vec![]).validate().is_err());

        let dto = mark_dto(vec![AttendanceEntryDto {
            student_id: Uuid::new_v4(),
            status: Present,
            remarks: None,
        }]);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_mark_attendance_validates_nested_remarks() {
        let dto = mark_dto(vec![AttendanceEntryDto {
            student_id: Uuid::new_v4(),
            status: Late,
            remarks: Some("x".repeat(256)),
        }]);
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_mark_teacher_attendance_validates_records() {
        let mut dto = MarkTeacherAttendanceDto {
            date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            academic_year: "2024-2025".to_string(),
            records: vec![],
        };
        assert!(dto.validate().is_err());

        dto.records.push(TeacherAttendanceEntryDto {
            teacher_id: Uuid::new_v4(),
            status: DayOff,
            remarks: Some("x".repeat(256)),
        });
        assert!(dto.validate().is_err());

        dto.records[0].remarks = None;
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_attendance_remarks_can_be_cleared() {
        let dto: UpdateAttendanceDto = serde_json::from_str(r#"{"remarks":null}"#).unwrap();
        assert_eq!(dto.remarks, Some(None));
        assert!(dto.validate().is_ok());

        let dto: UpdateAttendanceDto = serde_json::from_str(r#"{"status":"late"}"#).unwrap();
        assert_eq!(dto.remarks, None);

        let dto = UpdateAttendanceDto {
            remarks: Some(Some("x".repeat(256))),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_unknown_status_is_rejected_in_body() {
        let json = format!(r#"{{"student_id":"{}","status":"sick"}}"#, Uuid::new_v4());
        assert!(serde_json::from_str::<AttendanceEntryDto>(&json).is_err());
    }

    #[test]
    fn test_filter_params_parse_status() {
        let params: AttendanceFilterParams =
            serde_json::from_str(r#"{"status":"day_off","from":"2024-09-01","to":"2024-09-30"}"#)
                .unwrap();
        assert_eq!(params.status, Some(DayOff));
        assert_eq!(params.from, NaiveDate::from_ymd_opt(2024, 9, 1));

        let bad: Result<AttendanceFilterParams, _> =
            serde_json::from_str(r#"{"status":"holiday"}"#);
        assert!(bad.is_err());
    }
}
