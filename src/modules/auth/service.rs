use anyhow::anyhow;
use schoolyard_auth::{
    UserRole, create_access_token, create_refresh_token, verify_refresh_token,
};
use schoolyard_config::JwtConfig;
use schoolyard_core::{AppError, hash_password, normalize_email, verify_password};
use schoolyard_models::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, User, UserProfile,
};
use sqlx::PgPool;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::metrics::{track_login_failure, track_login_success};
use crate::utils::db::not_found;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password, role, phone, is_active, created_at, updated_at";

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(dto.email.trim())
        .fetch_optional(db)
        .await?;

        let Some(user) = user else {
            track_login_failure("unknown_email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(&dto.password, &user.password)? {
            track_login_failure("wrong_password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        if !user.is_active {
            warn!(user_id = %user.id, "Login attempt on inactive account");
            track_login_failure("inactive");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let response = Self::issue_tokens(db, &user, jwt_config).await?;
        track_login_success(user.role.as_str());
        Ok(response)
    }

    #[instrument(skip(db, refresh_token, jwt_config))]
    pub async fn refresh_tokens(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthorized("Invalid or expired refresh token"))?;

        // The account may have been disabled since the token was issued
        let user = Self::find_user(db, user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::unauthorized("Invalid or expired refresh token"))?;

        Self::issue_tokens(db, &user, jwt_config).await
    }

    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, user_id: Uuid) -> Result<UserProfile, AppError> {
        sqlx::query_as::<_, UserProfile>(
            r#"SELECT u.id, u.first_name, u.last_name, u.email, u.role, u.phone,
                      COALESCE(s.id, t.id, p.id) AS profile_id
               FROM users u
               LEFT JOIN students s ON s.user_id = u.id
               LEFT JOIN teachers t ON t.user_id = u.id
               LEFT JOIN parents p ON p.user_id = u.id
               WHERE u.id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| not_found("User"))
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: Uuid,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let user = Self::find_user(db, user_id)
            .await?
            .ok_or_else(|| not_found("User"))?;

        if !verify_password(&dto.current_password, &user.password)? {
            return Err(AppError::unauthorized("Current password is incorrect"));
        }

        if dto.current_password == dto.new_password {
            return Err(AppError::bad_request(anyhow!(
                "New password must differ from the current password"
            )));
        }

        let hashed = hash_password(&dto.new_password)?;
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(&hashed)
            .bind(user_id)
            .execute(db)
            .await?;

        Ok(())
    }

    async fn find_user(db: &PgPool, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    async fn issue_tokens(
        db: &PgPool,
        user: &User,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let access_token = create_access_token(user.id, &user.email, user.role, jwt_config)?;
        let refresh_token = create_refresh_token(user.id, &user.email, jwt_config)?;
        let profile = Self::get_profile(db, user.id).await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: profile,
        })
    }

    /// Creates an active admin account. Used by the CLI and tests.
    #[instrument(skip(db, password))]
    pub async fn create_admin(
        db: &PgPool,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let hashed = hash_password(password)?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO users (first_name, last_name, email, password, role)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(normalize_email(email))
        .bind(&hashed)
        .bind(UserRole::Admin)
        .fetch_one(db)
        .await
        .map_err(|e| crate::utils::db::write_error(e, "Email already exists"))?;

        Ok(user)
    }
}
