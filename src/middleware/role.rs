//! Role-based authorization for axum.
//!
//! Two ways to guard a route:
//! 1. Layer-based middleware ([`require_admin`], [`require_staff`]) for whole
//!    route groups
//! 2. Extractors ([`RequireAdmin`], [`RequireStaff`]) for single handlers

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use schoolyard_auth::UserRole;
use schoolyard_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Rejects the request unless the caller holds one of `allowed_roles`.
///
/// ```rust,ignore
/// let routes = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(state.clone(), |state, req, next| {
///         require_roles(state, req, next, &[UserRole::Admin])
///     }));
/// ```
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    check_any_role(&auth_user, allowed_roles)?;

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Admin-only route groups.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &[UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Route groups open to admins and teachers.
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, &[UserRole::Admin, UserRole::Teacher]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Extractor for admin-only handlers.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if !auth_user.is_admin() {
            return Err(AppError::forbidden(
                "Access denied. Administrator privileges required.",
            ));
        }

        Ok(RequireAdmin(auth_user))
    }
}

/// Extractor for handlers open to admins and teachers.
#[derive(Debug, Clone)]
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if !auth_user.is_staff() {
            return Err(AppError::forbidden(
                "Access denied. Teacher privileges required.",
            ));
        }

        Ok(RequireStaff(auth_user))
    }
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[UserRole]) -> Result<(), AppError> {
    let user_role = auth_user.role();

    if !allowed_roles.contains(&user_role) {
        let required = allowed_roles
            .iter()
            .map(UserRole::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AppError::forbidden(format!(
            "Access denied. Required roles: {}, but user has role: {}",
            required, user_role
        )));
    }

    Ok(())
}
