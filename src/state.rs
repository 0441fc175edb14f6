use schoolyard_config::{CorsConfig, DatabaseConfig, JwtConfig, RateLimitConfig};
use sqlx::PgPool;

use crate::middleware::rate_limit::RateLimiters;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub rate_limiters: RateLimiters,
}

impl AppState {
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        rate_limit_config: RateLimitConfig,
    ) -> Self {
        let rate_limiters = RateLimiters::new(&rate_limit_config);
        Self {
            db,
            jwt_config,
            cors_config,
            rate_limit_config,
            rate_limiters,
        }
    }
}

/// Connects the pool and reads every config section from the environment.
pub async fn init_app_state() -> Result<AppState, sqlx::Error> {
    let db = schoolyard_db::init_db_pool(&DatabaseConfig::from_env()).await?;

    Ok(AppState::new(
        db,
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        RateLimitConfig::from_env(),
    ))
}
