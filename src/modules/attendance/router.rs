use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    delete_attendance, export_attendance, get_attendance, get_attendance_summary,
    get_teacher_attendance, get_teacher_attendance_summary, mark_attendance,
    mark_teacher_attendance, update_attendance,
};

/// Mounted behind `require_staff`.
pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(mark_attendance).get(get_attendance))
        .route("/summary", get(get_attendance_summary))
        .route("/export", get(export_attendance))
        .route(
            "/teachers",
            post(mark_teacher_attendance).get(get_teacher_attendance),
        )
        .route("/teachers/summary", get(get_teacher_attendance_summary))
        .route("/{id}", put(update_attendance).delete(delete_attendance))
}
