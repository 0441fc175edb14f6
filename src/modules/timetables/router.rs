use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_entry, delete_entry, get_entries, get_entry, update_entry};

/// Mounted behind `require_staff`; writes also require an admin.
pub fn init_timetables_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_entry).get(get_entries))
        .route(
            "/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}
