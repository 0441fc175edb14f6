//! # Schoolyard Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`server`]: listen address and metrics port
//! - [`database`]: PostgreSQL connection settings
//! - [`jwt`]: JWT signing secret and token lifetimes
//! - [`cors`]: allowed front-end origins
//! - [`rate_limit`]: token bucket settings for the API
//!
//! ```ignore
//! use schoolyard_config::{JwtConfig, ServerConfig};
//!
//! let server = ServerConfig::from_env();
//! let jwt = JwtConfig::from_env();
//! ```

pub mod cors;
pub mod database;
pub mod jwt;
pub mod rate_limit;
pub mod server;

mod env;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
