use chrono::Utc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db;
use crate::dto::{AuthResponse, LoginDto, RegisterDto, SessionResponse, TokenResponse, UserResponse};
use crate::errors::ApiError;
use crate::models::{User, UserRole};
use crate::service::auth::{jwt, AuthUser};
use crate::service::crypto;
use crate::PGPool;

pub async fn register(
    dto: RegisterDto,
    config: &AppConfig,
    pool: &PGPool,
) -> Result<AuthResponse, ApiError> {
    if db::user::email_taken(&dto.email, pool).await? {
        return Err(ApiError::EmailTaken);
    }
    let password_hash = crypto::hash_password(&dto.password)?;
    let user = User {
        id: Uuid::new_v4(),
        first_name: dto.first_name,
        last_name: dto.last_name,
        email: dto.email,
        password_hash,
        pfp: config.default_pfp.clone(),
        role: UserRole::User,
        created_at: Utc::now(),
    };
    db::user::create(&user, pool).await?;
    issue_session(&user, config)
}

pub async fn login(dto: LoginDto, config: &AppConfig, pool: &PGPool) -> Result<AuthResponse, ApiError> {
    // One generic error for unknown email and wrong password alike.
    let user = db::user::get_by_email(&dto.email, pool)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    if !crypto::verify_password(&dto.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }
    issue_session(&user, config)
}

fn issue_session(user: &User, config: &AppConfig) -> Result<AuthResponse, ApiError> {
    let (access_token, expires_at) =
        jwt::create_token(user.id, &config.jwt_secret, jwt::TOKEN_TTL_SECS)?;
    Ok(AuthResponse {
        user: UserResponse::from(user),
        token: TokenResponse {
            access_token,
            expires_at,
        },
    })
}

pub async fn session(auth: &AuthUser, pool: &PGPool) -> Result<SessionResponse, ApiError> {
    let user = db::user::get_by_id(auth.id, pool)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(SessionResponse {
        user: UserResponse::from(&user),
    })
}

pub async fn list(pool: &PGPool) -> Result<Vec<UserResponse>, ApiError> {
    let users = db::user::get_all(pool).await?;
    Ok(users.iter().map(UserResponse::from).collect())
}

pub async fn retrieve(id: Uuid, pool: &PGPool) -> Result<UserResponse, ApiError> {
    let user = db::user::get_by_id(id, pool)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(UserResponse::from(&user))
}
