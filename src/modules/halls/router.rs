use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{
    assign_students, create_hall, delete_assignment, delete_hall, get_assignments, get_hall,
    get_halls, update_hall,
};

/// Mounted behind `require_staff`; writes also require an admin.
pub fn init_halls_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_hall).get(get_halls))
        .route("/{id}", get(get_hall).put(update_hall).delete(delete_hall))
        .route("/{id}/assignments", post(assign_students).get(get_assignments))
        .route(
            "/{id}/assignments/{assignment_id}",
            delete(delete_assignment),
        )
}
