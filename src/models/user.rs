use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered account. `password_hash` is an argon2 PHC string; the
/// plaintext password exists only inside the registration and login
/// handlers, and the hash is stripped from every API response.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub birthday: Option<NaiveDate>,
    pub favorite_movies: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Username
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
}
