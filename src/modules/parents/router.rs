use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    assign_children, create_parent, delete_parent, get_children, get_parent, get_parents,
    update_parent,
};

pub fn init_parents_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_parent).get(get_parents))
        .route(
            "/{id}",
            get(get_parent).put(update_parent).delete(delete_parent),
        )
        .route("/{id}/children", post(assign_children).get(get_children))
}
