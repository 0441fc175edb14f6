use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_student, delete_student, export_students, get_student, get_student_attendance,
    get_student_attendance_summary, get_student_hall_assignments, get_student_payments,
    get_student_result_summary, get_student_results, get_students, update_student,
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_student).get(get_students))
        .route("/export", get(export_students))
        .route(
            "/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/{id}/attendance", get(get_student_attendance))
        .route(
            "/{id}/attendance/summary",
            get(get_student_attendance_summary),
        )
        .route("/{id}/results", get(get_student_results))
        .route("/{id}/results/summary", get(get_student_result_summary))
        .route("/{id}/payments", get(get_student_payments))
        .route("/{id}/hall-assignments", get(get_student_hall_assignments))
}
