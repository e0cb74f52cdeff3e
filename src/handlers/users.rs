use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::db::user_repository::UserRepository;
use crate::error::ApiError;
use crate::handlers::auth::validate_credentials;
use crate::models::user::{Claims, User};
use crate::utils::auth::hash_password;

/// What a user looks like on the wire. The password hash never appears in
/// a response.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    pub favorite_movies: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            username: user.username,
            email: user.email,
            birthday: user.birthday,
            favorite_movies: user.favorite_movies,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub birthday: Option<NaiveDate>,
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn list(users: web::Data<UserRepository>) -> Result<HttpResponse, ApiError> {
    let body: Vec<UserResponse> = users.all().await?.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Fetch a single user by username
#[utoipa::path(
    get,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such user")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get(
    users: web::Data<UserRepository>,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = users
        .get(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{username} was not found")))?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Replace a user's profile fields. The favorites list is untouched; the
/// new password is hashed before it is persisted.
#[utoipa::path(
    put,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such user"),
        (status = 409, description = "New username already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update(
    users: web::Data<UserRepository>,
    claims: web::ReqData<Claims>,
    username: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    validate_credentials(&payload.username, &payload.password, &payload.email)?;

    let password_hash = hash_password(&payload.password).map_err(|err| {
        error!(error = %err, "failed to hash password");
        ApiError::Internal
    })?;

    let updated = User {
        username: payload.username.clone(),
        password_hash,
        email: payload.email.clone(),
        birthday: payload.birthday,
        favorite_movies: Vec::new(), // replaced by the stored list
    };

    let user = users
        .replace(&username, updated)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{username} was not found")))?;

    info!(username = %username, updated_by = %claims.sub, "profile updated");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Add a movie to a user's favorites. Appends unconditionally, so adding
/// the same identifier twice leaves two entries.
#[utoipa::path(
    post,
    path = "/user/{username}/movies/{movie_id}",
    params(
        ("username" = String, Path, description = "Account username"),
        ("movie_id" = String, Path, description = "Movie identifier")
    ),
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such user")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn add_favorite(
    users: web::Data<UserRepository>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (username, movie_id) = path.into_inner();

    let user = users
        .add_favorite(&username, &movie_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{username} was not found")))?;

    info!(username = %username, movie_id = %movie_id, updated_by = %claims.sub, "favorite added");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Remove every occurrence of a movie from a user's favorites. Removing
/// an identifier that was never present succeeds and changes nothing.
#[utoipa::path(
    delete,
    path = "/users/{username}/movies/{movie_id}",
    params(
        ("username" = String, Path, description = "Account username"),
        ("movie_id" = String, Path, description = "Movie identifier")
    ),
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such user")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn remove_favorite(
    users: web::Data<UserRepository>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (username, movie_id) = path.into_inner();

    let user = users
        .remove_favorite(&username, &movie_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{username} was not found")))?;

    info!(username = %username, movie_id = %movie_id, updated_by = %claims.sub, "favorite removed");
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Delete a user account
#[utoipa::path(
    delete,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Account username")),
    responses(
        (status = 200, description = "Deletion confirmation"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such user")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete(
    users: web::Data<UserRepository>,
    claims: web::ReqData<Claims>,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !users.delete(&username).await? {
        return Err(ApiError::NotFound(format!("{username} was not found")));
    }

    info!(username = %username, deleted_by = %claims.sub, "account deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("{username} has been deleted.")
    })))
}
