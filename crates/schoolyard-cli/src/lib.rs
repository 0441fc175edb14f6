//! # Schoolyard CLI
//!
//! Administrative tasks that run outside the HTTP API: creating the first
//! admin account and filling a development database with fake data.
//!
//! ```ignore
//! use schoolyard_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new("2024-2025").with_students(120);
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
