use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::rate_limit::rate_limit_auth;
use crate::state::AppState;

use super::controller::{change_password, get_me, login_user, refresh_token};

/// Credential endpoints sit behind the stricter auth bucket.
pub fn init_auth_router(state: AppState) -> Router<AppState> {
    let credentials = Router::new()
        .route("/login", post(login_user))
        .route("/refresh", post(refresh_token))
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_auth));

    Router::new().route("/me", get(get_me)).merge(credentials)
}
