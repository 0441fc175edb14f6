use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    assign_students, create_classroom, delete_classroom, get_classroom,
    get_classroom_assignments, get_classroom_exams, get_classroom_students,
    get_classroom_timetable, get_classrooms, update_classroom,
};

pub fn init_classrooms_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_classroom).get(get_classrooms))
        .route(
            "/{id}",
            get(get_classroom)
                .put(update_classroom)
                .delete(delete_classroom),
        )
        .route(
            "/{id}/students",
            post(assign_students).get(get_classroom_students),
        )
        .route("/{id}/timetable", get(get_classroom_timetable))
        .route("/{id}/exams", get(get_classroom_exams))
        .route("/{id}/assignments", get(get_classroom_assignments))
}
