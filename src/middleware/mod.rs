//! Middleware and extractors for cross-cutting request concerns.
//!
//! - [`auth`]: `AuthUser` bearer token extractor
//! - [`role`]: role guards as layers and extractors
//! - [`access`]: student/parent self-service checks
//! - [`rate_limit`]: per-IP token buckets
//!
//! # Authentication flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `AuthUser` validates the JWT and exposes its claims (including the role)
//! 3. Role guards reject callers outside the allowed roles with 403
//! 4. Handlers for self-service reads call an `ensure_*_access` check
//!
//! ```ignore
//! use crate::middleware::role::RequireAdmin;
//!
//! async fn delete_student(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
//!     // Only admins reach this point
//! }
//! ```

pub mod access;
pub mod auth;
pub mod rate_limit;
pub mod role;
