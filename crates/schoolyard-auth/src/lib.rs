//! # Schoolyard Auth
//!
//! Authentication types and JWT utilities.
//!
//! - [`roles`]: the four user roles and their capabilities
//! - [`claims`]: access and refresh token claims
//! - [`jwt`]: token creation and verification
//!
//! Access tokens carry the user's role so route guards can decide without a
//! database round-trip. Refresh tokens carry only the identity and a unique id.
//!
//! ```ignore
//! use schoolyard_auth::{UserRole, create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "teacher@school.test", UserRole::Teacher, &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.role, UserRole::Teacher);
//! ```

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
pub use roles::UserRole;
