use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_result, delete_result, export_results, get_result, get_results, update_result,
};

/// Mounted behind `require_staff`.
pub fn init_results_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_result).get(get_results))
        .route("/export", get(export_results))
        .route(
            "/{id}",
            get(get_result).put(update_result).delete(delete_result),
        )
}
