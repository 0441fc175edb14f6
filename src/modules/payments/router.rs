use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_payment, delete_payment, export_payments, get_payment, get_payment_summary,
    get_payments, record_payment, update_payment,
};

/// Mounted behind `require_admin`.
pub fn init_payments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment).get(get_payments))
        .route("/summary", get(get_payment_summary))
        .route("/export", get(export_payments))
        .route(
            "/{id}",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
        .route("/{id}/record", post(record_payment))
}
