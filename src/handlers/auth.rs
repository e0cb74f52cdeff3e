use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::db::user_repository::UserRepository;
use crate::error::ApiError;
use crate::handlers::users::UserResponse;
use crate::models::user::User;
use crate::utils::auth::{create_jwt, hash_password, verify_password};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

pub(crate) fn validate_credentials(
    username: &str,
    password: &str,
    email: &str,
) -> Result<(), ApiError> {
    if username.len() < 3 {
        return Err(ApiError::BadRequest(
            "Username must be at least 3 characters".to_string(),
        ));
    }
    if password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already taken"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "Authentication"
)]
pub async fn register(
    users: web::Data<UserRepository>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    info!(username = %payload.username, "registration attempt");

    validate_credentials(&payload.username, &payload.password, &payload.email)?;

    let password_hash = hash_password(&payload.password).map_err(|err| {
        error!(error = %err, "failed to hash password");
        ApiError::Internal
    })?;

    let user = User {
        username: payload.username.clone(),
        password_hash,
        email: payload.email.clone(),
        birthday: payload.birthday,
        favorite_movies: Vec::new(),
    };

    let created = users.create(user).await?;
    info!(username = %created.username, "user registered");

    Ok(HttpResponse::Created().json(UserResponse::from(created)))
}

/// Log in and receive a bearer token
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "Authentication"
)]
pub async fn login(
    users: web::Data<UserRepository>,
    config: web::Data<AppConfig>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and Password are required".to_string(),
        ));
    }

    info!(username = %payload.username, "login attempt");

    // same response for unknown username and wrong password
    let user = users.get(&payload.username).await?.ok_or_else(|| {
        warn!(username = %payload.username, "login failed: unknown username");
        ApiError::Unauthorized("Invalid credentials")
    })?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(username = %payload.username, "login failed: password mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = create_jwt(&user.username, &config.jwt_secret, config.token_ttl_hours)
        .map_err(|err| {
            error!(error = %err, "failed to issue token");
            ApiError::Internal
        })?;

    info!(username = %user.username, "login succeeded");

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: user.into(),
    }))
}
