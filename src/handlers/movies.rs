use actix_web::{web, HttpResponse};

use crate::db::movie_repository::MovieRepository;
use crate::error::ApiError;
use crate::models::movie::Movie;

/// List the whole catalog
#[utoipa::path(
    get,
    path = "/movies",
    responses(
        (status = 200, description = "All movies", body = Vec<Movie>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn list(movies: web::Data<MovieRepository>) -> Result<HttpResponse, ApiError> {
    let all = movies.all().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// Look up a single movie by exact title. A miss is a normal outcome and
/// answers 200 with a null body.
#[utoipa::path(
    get,
    path = "/movies/{title}",
    params(("title" = String, Path, description = "Exact movie title")),
    responses(
        (status = 200, description = "The movie, or null when no title matches", body = Movie),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn get_by_title(
    movies: web::Data<MovieRepository>,
    title: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let movie = movies.find_by_title(&title).await?;
    Ok(HttpResponse::Ok().json(movie))
}

/// Genre details, taken from the first movie carrying the genre
#[utoipa::path(
    get,
    path = "/movies/genre/{genre_name}",
    params(("genre_name" = String, Path, description = "Exact genre name")),
    responses(
        (status = 200, description = "The genre, or null when no movie matches", body = crate::models::movie::Genre),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn get_genre(
    movies: web::Data<MovieRepository>,
    genre_name: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let genre = movies.find_by_genre(&genre_name).await?.map(|m| m.genre);
    Ok(HttpResponse::Ok().json(genre))
}

/// Director details, taken from the first movie carrying the director
#[utoipa::path(
    get,
    path = "/movies/directors/{director_name}",
    params(("director_name" = String, Path, description = "Exact director name")),
    responses(
        (status = 200, description = "The director, or null when no movie matches", body = crate::models::movie::Director),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn get_director(
    movies: web::Data<MovieRepository>,
    director_name: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let director = movies
        .find_by_director(&director_name)
        .await?
        .map(|m| m.director);
    Ok(HttpResponse::Ok().json(director))
}
