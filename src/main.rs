mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod utils;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use std::fs;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::AppConfig;
use db::movie_repository::MovieRepository;
use db::user_repository::UserRepository;
use db::Database;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::welcome,
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::movies::list,
        handlers::movies::get_by_title,
        handlers::movies::get_genre,
        handlers::movies::get_director,
        handlers::users::list,
        handlers::users::get,
        handlers::users::update,
        handlers::users::add_favorite,
        handlers::users::remove_favorite,
        handlers::users::delete,
    ),
    components(
        schemas(
            handlers::health::HealthResponse,
            handlers::health::HealthChecks,
            handlers::auth::RegisterRequest,
            handlers::auth::LoginRequest,
            handlers::auth::AuthResponse,
            handlers::users::UserResponse,
            handlers::users::UpdateUserRequest,
            models::movie::Movie,
            models::movie::Genre,
            models::movie::Director,
        )
    ),
    tags(
        (name = "General", description = "Welcome and health endpoints"),
        (name = "Authentication", description = "Registration and login"),
        (name = "Movies", description = "Movie catalog queries"),
        (name = "Users", description = "User profiles and favorites")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token obtained from POST /login"))
                        .build(),
                ),
            );
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(true)
        .json()
        .init();

    let config = AppConfig::from_env();

    let database = Database::open(&config.db_path).expect("failed to open database");
    info!(db_path = %config.db_path, "database opened");

    seed_movies(&config, &database).await;

    let bind_address = config.bind_address();
    info!(bind_address = %bind_address, "starting myFlix API server");
    info!(
        swagger_url = %format!("http://{bind_address}/swagger-ui/"),
        "API documentation available"
    );

    let app_config = web::Data::new(config);
    let app_database = web::Data::new(database.clone());

    HttpServer::new(move || {
        let users = UserRepository::new(database.clone());
        let movies = MovieRepository::new(database.clone());

        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(app_config.clone())
            .app_data(app_database.clone())
            .app_data(web::Data::new(users))
            .app_data(web::Data::new(movies))
            .wrap(TracingLogger::default())
            .wrap(cors)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .configure(handlers::routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}

/// Imports the `MOVIE_SEED` file when the movie collection is empty. The
/// catalog has no write routes, so this is how a fresh deployment gets
/// its movies.
async fn seed_movies(config: &AppConfig, database: &Database) {
    let Some(path) = config.movie_seed.as_deref() else {
        return;
    };

    let movies = MovieRepository::new(database.clone());
    match movies.count().await {
        Ok(0) => {}
        Ok(existing) => {
            info!(existing, "movie collection already populated, skipping seed");
            return;
        }
        Err(err) => {
            warn!(error = %err, "could not inspect movie collection, skipping seed");
            return;
        }
    }

    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, path, "failed to read movie seed file");
            return;
        }
    };

    match movies.import_json(&json).await {
        Ok(count) => info!(count, path, "seeded movie collection"),
        Err(err) => warn!(error = %err, path, "failed to seed movie collection"),
    }
}
