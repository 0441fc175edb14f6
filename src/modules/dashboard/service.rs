use chrono::Utc;
use schoolyard_core::AppError;
use schoolyard_models::attendance::AttendanceFilterParams;
use schoolyard_models::dashboard::DashboardStats;
use schoolyard_models::payments::PaymentFilterParams;
use sqlx::PgPool;
use tracing::instrument;

use crate::modules::attendance::service::AttendanceService;
use crate::modules::exams::service::ExamService;
use crate::modules::payments::service::PaymentService;

const UPCOMING_EXAMS: i64 = 5;

async fn count(db: &PgPool, table: &'static str) -> Result<i64, AppError> {
    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db)
        .await?;
    Ok(total)
}

pub struct DashboardService;

impl DashboardService {
    /// The figures are independent, so they are fetched concurrently.
    #[instrument(skip(db))]
    pub async fn get_stats(db: &PgPool) -> Result<DashboardStats, AppError> {
        let today = Utc::now().date_naive();
        let attendance_filters = AttendanceFilterParams {
            from: Some(today),
            to: Some(today),
            ..Default::default()
        };
        let payment_filters = PaymentFilterParams::default();

        let (students, teachers, parents, classrooms, attendance_today, payments, upcoming_exams) =
            tokio::try_join!(
                count(db, "students"),
                count(db, "teachers"),
                count(db, "parents"),
                count(db, "classrooms"),
                AttendanceService::get_summary(db, &attendance_filters),
                PaymentService::get_summary(db, &payment_filters),
                ExamService::get_upcoming(db, UPCOMING_EXAMS),
            )?;

        Ok(DashboardStats {
            students,
            teachers,
            parents,
            classrooms,
            attendance_today,
            payments,
            upcoming_exams,
        })
    }
}
