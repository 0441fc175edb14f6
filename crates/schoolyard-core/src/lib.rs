//! # Schoolyard Core
//!
//! Core types, errors, and utilities for the Schoolyard API.
//!
//! - [`email`]: Email normalization
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination parameters and response metadata
//! - [`password`]: bcrypt password hashing and verification
//! - [`query`]: Query-string friendly deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use schoolyard_core::{AppError, PaginationParams, hash_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Student not found"));
//! let hash = hash_password("secure_password")?;
//! let limit = PaginationParams::default().limit();
//! ```

pub mod email;
pub mod errors;
pub mod pagination;
pub mod password;
pub mod query;

pub use email::normalize_email;
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
