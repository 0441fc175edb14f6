//! Admin dashboard figures.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::attendance::AttendanceSummary;
use crate::exams::Exam;
use crate::payments::PaymentSummary;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub students: i64,
    pub teachers: i64,
    pub parents: i64,
    pub classrooms: i64,
    /// Student attendance marked for today
    pub attendance_today: AttendanceSummary,
    pub payments: PaymentSummary,
    /// Next exams from today, soonest first
    pub upcoming_exams: Vec<Exam>,
}
