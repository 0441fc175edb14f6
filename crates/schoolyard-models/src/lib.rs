//! # Schoolyard Models
//!
//! Domain models, DTOs and the pure domain rules of the Schoolyard API.
//!
//! - [`auth`]: users, login and profile types
//! - [`academic_years`], [`classrooms`], [`halls`], [`subjects`]: school structure
//! - [`students`], [`teachers`], [`parents`]: people
//! - [`attendance`]: attendance records and statistics
//! - [`results`]: score components, totals and letter grades
//! - [`payments`]: fee payments with derived status
//! - [`exams`], [`timetables`], [`assignments`], [`announcements`]: scheduling
//! - [`dashboard`]: admin overview
//!
//! ```ignore
//! use schoolyard_models::attendance::{AttendanceStatus, AttendanceSummary};
//! use schoolyard_models::results::{Grade, Scores};
//!
//! let summary = AttendanceSummary::from_statuses([AttendanceStatus::Present]);
//! assert_eq!(summary.attendance_rate, 100.0);
//! assert_eq!(Grade::from_score(72.5), Grade::C);
//! ```

pub mod academic_years;
pub mod announcements;
pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod classrooms;
pub mod common;
pub mod dashboard;
pub mod exams;
pub mod halls;
pub mod parents;
pub mod payments;
pub mod results;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod timetables;

pub use common::{AssignStudentsDto, BulkAssignResponse, MessageResponse};
