use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_teacher, delete_teacher, get_teacher, get_teacher_classrooms, get_teacher_timetable,
    get_teachers, update_teacher,
};

/// Mounted behind `require_staff`; writes also require an admin.
pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_teacher).get(get_teachers))
        .route(
            "/{id}",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
        .route("/{id}/timetable", get(get_teacher_timetable))
        .route("/{id}/classrooms", get(get_teacher_classrooms))
}
