use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use schoolyard_auth::{Claims, UserRole, verify_token};
use schoolyard_core::AppError;
use uuid::Uuid;

use crate::state::AppState;

/// Extractor that validates the bearer JWT and provides the caller's claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Get the user ID as UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == UserRole::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.0.role.is_staff()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(sub: &str, role: UserRole) -> AuthUser {
        AuthUser(Claims {
            sub: sub.to_string(),
            email: "user@school.test".to_string(),
            role,
            exp: 9999999999,
            iat: 1234567890,
        })
    }

    #[test]
    fn test_user_id() {
        let id = Uuid::new_v4();
        let user = auth_user(&id.to_string(), UserRole::Teacher);
        assert_eq!(user.user_id().unwrap(), id);
        assert_eq!(user.email(), "user@school.test");
    }

    #[test]
    fn test_user_id_rejects_garbage_subject() {
        let user = auth_user("not-a-uuid", UserRole::Student);
        assert_eq!(user.user_id().unwrap_err().status.as_u16(), 401);
    }

    #[test]
    fn test_role_helpers() {
        let id = Uuid::new_v4().to_string();
        assert!(auth_user(&id, UserRole::Admin).is_admin());
        assert!(auth_user(&id, UserRole::Admin).is_staff());
        assert!(!auth_user(&id, UserRole::Teacher).is_admin());
        assert!(auth_user(&id, UserRole::Teacher).is_staff());
        assert!(!auth_user(&id, UserRole::Parent).is_staff());
        assert_eq!(auth_user(&id, UserRole::Parent).role(), UserRole::Parent);
    }
}
