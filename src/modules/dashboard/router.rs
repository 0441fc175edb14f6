use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::get_dashboard;

/// Mounted behind `require_admin`.
pub fn init_dashboard_router() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}
