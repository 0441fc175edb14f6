//! JWT claim structures.
//!
//! - [`Claims`]: access token claims
//! - [`RefreshTokenClaims`]: refresh token claims
//!
//! The two shapes are disjoint (`role` vs `jti`), so one kind of token never
//! decodes as the other.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::roles::UserRole;

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Refresh token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique token id so two refresh tokens issued in the same second differ
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip_through_json() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            email: "teacher@example.com".to_string(),
            role: UserRole::Teacher,
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""role":"teacher""#));

        let back: Claims = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back.role, UserRole::Teacher);
        assert_eq!(back.sub, "user-id-123");
    }

    #[test]
    fn test_refresh_claims_do_not_parse_as_access_claims() {
        let json = r#"{"sub":"u","email":"e@x.com","exp":1,"iat":1,"jti":"abc"}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
        assert!(serde_json::from_str::<RefreshTokenClaims>(json).is_ok());
    }
}
