pub mod auth;
pub mod health;
pub mod movies;
pub mod users;

use actix_web::{guard, web};

use crate::middleware::{auth::JwtAuth, rate_limit::RateLimit};

/// Wires the API surface. App-level middleware (request tracing, CORS)
/// and the OpenAPI UI are attached by the caller.
///
/// `POST /users` is public while `GET /users` requires a token, so the
/// registration resource carries a method guard and everything behind
/// authentication hangs off scopes wrapped with [`JwtAuth`].
pub fn routes(cfg: &mut web::ServiceConfig) {
    let throttle = RateLimit::per_minute(5);

    cfg.route("/", web::get().to(health::welcome))
        .route("/health", web::get().to(health::health))
        .service(
            web::resource("/users")
                .guard(guard::Post())
                .wrap(throttle.clone())
                .route(web::post().to(auth::register)),
        )
        .service(
            web::resource("/login")
                .wrap(throttle)
                .route(web::post().to(auth::login)),
        )
        .service(
            web::scope("/movies")
                .wrap(JwtAuth)
                .route("/genre/{genre_name}", web::get().to(movies::get_genre))
                .route(
                    "/directors/{director_name}",
                    web::get().to(movies::get_director),
                )
                .route("/{title}", web::get().to(movies::get_by_title))
                .route("", web::get().to(movies::list)),
        )
        // the add-favorite route lives under the singular /user prefix
        .service(
            web::scope("/user")
                .wrap(JwtAuth)
                .route(
                    "/{username}/movies/{movie_id}",
                    web::post().to(users::add_favorite),
                ),
        )
        .service(
            web::scope("/users")
                .wrap(JwtAuth)
                .route(
                    "/{username}/movies/{movie_id}",
                    web::delete().to(users::remove_favorite),
                )
                .route("/{username}", web::get().to(users::get))
                .route("/{username}", web::put().to(users::update))
                .route("/{username}", web::delete().to(users::delete))
                .route("", web::get().to(users::list)),
        );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use crate::config::AppConfig;
    use crate::db::movie_repository::MovieRepository;
    use crate::db::user_repository::UserRepository;
    use crate::db::Database;
    use crate::models::movie::{Director, Genre, Movie};

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            db_path: String::new(),
            jwt_secret: "e2e-test-secret".to_string(),
            token_ttl_hours: 1,
            movie_seed: None,
        }
    }

    fn sample_movie() -> Movie {
        Movie {
            id: String::new(),
            title: "Pulp Fiction".to_string(),
            description: "Interwoven stories of Los Angeles crime.".to_string(),
            genre: Genre {
                name: "Crime".to_string(),
                description: "Crime fiction".to_string(),
            },
            director: Director {
                name: "Quentin Tarantino".to_string(),
                bio: "American filmmaker".to_string(),
                birth: Some(1963),
                death: None,
            },
            image_url: "https://example.com/pulp-fiction.jpg".to_string(),
            featured: true,
        }
    }

    macro_rules! test_app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_config()))
                    .app_data(web::Data::new($db.clone()))
                    .app_data(web::Data::new(UserRepository::new($db.clone())))
                    .app_data(web::Data::new(MovieRepository::new($db.clone())))
                    .configure(super::routes),
            )
            .await
        };
    }

    /// Registers a user and returns a valid bearer token for them.
    macro_rules! obtain_token {
        ($app:expr, $username:expr, $password:expr) => {{
            let req = test::TestRequest::post()
                .uri("/users")
                .set_json(json!({
                    "Username": $username,
                    "Password": $password,
                    "Email": format!("{}@example.com", $username),
                }))
                .to_request();
            let resp = test::call_service(&$app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);

            let req = test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "Username": $username, "Password": $password }))
                .to_request();
            let body: Value = test::call_and_read_body_json(&$app, req).await;
            body["token"]
                .as_str()
                .expect("login returns a token")
                .to_string()
        }};
    }

    #[actix_web::test]
    async fn welcome_is_public() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("myFlix"));
    }

    #[actix_web::test]
    async fn protected_routes_reject_missing_and_bad_tokens() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let req = test::TestRequest::get().uri("/movies").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/users")
            .insert_header(("Authorization", "Bearer not-a-real-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn register_login_and_fetch_own_profile() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let token = obtain_token!(app, "alice", "p1-very-secret");

        let req = test::TestRequest::get()
            .uri("/users/alice")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["Username"], "alice");
        assert_eq!(body["Email"], "alice@example.com");
        assert_eq!(body["FavoriteMovies"], json!([]));
        // the hash never leaves the server, in any spelling
        assert!(body.get("Password").is_none());
        assert!(body.get("PasswordHash").is_none());

        // and what is stored is a hash, not the plaintext
        let stored = UserRepository::new(db.clone())
            .get("alice")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "p1-very-secret");
    }

    #[actix_web::test]
    async fn duplicate_registration_conflicts() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let payload = json!({
            "Username": "alice",
            "Password": "p1-very-secret",
            "Email": "a@x.com",
        });

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&payload)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(&payload)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CONFLICT
        );
    }

    #[actix_web::test]
    async fn short_usernames_and_passwords_are_rejected() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "Username": "al",
                "Password": "p1-very-secret",
                "Email": "a@x.com",
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "Username": "alice",
                "Password": "short",
                "Email": "a@x.com",
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthorized() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "Username": "alice",
                "Password": "p1-very-secret",
                "Email": "a@x.com",
            }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "Username": "alice", "Password": "wrong-password" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn movie_queries_return_documents_and_sub_objects() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);
        MovieRepository::new(db.clone())
            .insert(sample_movie())
            .await
            .unwrap();

        let token = obtain_token!(app, "alice", "p1-very-secret");
        let bearer = ("Authorization", format!("Bearer {token}"));

        let req = test::TestRequest::get()
            .uri("/movies")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["Title"], "Pulp Fiction");

        let req = test::TestRequest::get()
            .uri("/movies/Pulp%20Fiction")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["Genre"]["Name"], "Crime");
        assert_eq!(body["ImageURL"], "https://example.com/pulp-fiction.jpg");

        let req = test::TestRequest::get()
            .uri("/movies/genre/Crime")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["Name"], "Crime");

        let req = test::TestRequest::get()
            .uri("/movies/directors/Quentin%20Tarantino")
            .insert_header(bearer)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["Birth"], 1963);
    }

    #[actix_web::test]
    async fn missing_movie_is_null_not_an_error() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let token = obtain_token!(app, "alice", "p1-very-secret");

        let req = test::TestRequest::get()
            .uri("/movies/No%20Such%20Film")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, web::Bytes::from_static(b"null"));
    }

    #[actix_web::test]
    async fn favorites_follow_the_push_pull_policy() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let token = obtain_token!(app, "alice", "p1-very-secret");
        let bearer = ("Authorization", format!("Bearer {token}"));

        // add the same movie twice - both appends succeed
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/user/alice/movies/m1")
                .insert_header(bearer.clone())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/users/alice")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["FavoriteMovies"], json!(["m1", "m1"]));

        // one remove strips every occurrence
        let req = test::TestRequest::delete()
            .uri("/users/alice/movies/m1")
            .insert_header(bearer.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["FavoriteMovies"], json!([]));

        // removing an identifier that was never there is a no-op success
        let req = test::TestRequest::delete()
            .uri("/users/alice/movies/mystery")
            .insert_header(bearer)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn update_rehashes_the_password() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let token = obtain_token!(app, "alice", "p1-very-secret");

        let req = test::TestRequest::put()
            .uri("/users/alice")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(json!({
                "Username": "alice",
                "Password": "p2-even-more-secret",
                "Email": "alice@new.example.com",
                "Birthday": "1990-05-17",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["Email"], "alice@new.example.com");
        assert_eq!(body["Birthday"], "1990-05-17");

        // the new password is live, and stored hashed
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "Username": "alice", "Password": "p2-even-more-secret" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let stored = UserRepository::new(db.clone())
            .get("alice")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "p2-even-more-secret");
    }

    #[actix_web::test]
    async fn operations_on_missing_users_are_not_found() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let token = obtain_token!(app, "alice", "p1-very-secret");
        let bearer = ("Authorization", format!("Bearer {token}"));

        let req = test::TestRequest::get()
            .uri("/users/ghost")
            .insert_header(bearer.clone())
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::delete()
            .uri("/users/ghost")
            .insert_header(bearer.clone())
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );

        let req = test::TestRequest::post()
            .uri("/user/ghost/movies/m1")
            .insert_header(bearer)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn deleting_a_user_confirms_and_then_404s() {
        let db = Database::temporary().unwrap();
        let app = test_app!(db);

        let token = obtain_token!(app, "alice", "p1-very-secret");
        let bearer = ("Authorization", format!("Bearer {token}"));

        let req = test::TestRequest::delete()
            .uri("/users/alice")
            .insert_header(bearer.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["message"].as_str().unwrap().contains("alice"));

        // the token still verifies (identity is not re-checked), but the
        // record is gone
        let req = test::TestRequest::get()
            .uri("/users/alice")
            .insert_header(bearer)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }
}
