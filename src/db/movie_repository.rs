use crate::db::{Database, StoreError};
use crate::models::movie::{Director, Genre, Movie};
use bincode::{Decode, Encode};
use sled::Tree;
use tracing::info;
use uuid::Uuid;

const MOVIES_TREE: &str = "movies";

#[derive(Debug, Clone, Encode, Decode)]
struct StoredMovie {
    id: String,
    title: String,
    description: String,
    genre: StoredGenre,
    director: StoredDirector,
    image_url: String,
    featured: bool,
}

#[derive(Debug, Clone, Encode, Decode)]
struct StoredGenre {
    name: String,
    description: String,
}

#[derive(Debug, Clone, Encode, Decode)]
struct StoredDirector {
    name: String,
    bio: String,
    birth: Option<i32>,
    death: Option<i32>,
}

impl From<Movie> for StoredMovie {
    fn from(movie: Movie) -> Self {
        StoredMovie {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            genre: StoredGenre {
                name: movie.genre.name,
                description: movie.genre.description,
            },
            director: StoredDirector {
                name: movie.director.name,
                bio: movie.director.bio,
                birth: movie.director.birth,
                death: movie.director.death,
            },
            image_url: movie.image_url,
            featured: movie.featured,
        }
    }
}

impl From<StoredMovie> for Movie {
    fn from(stored: StoredMovie) -> Self {
        Movie {
            id: stored.id,
            title: stored.title,
            description: stored.description,
            genre: Genre {
                name: stored.genre.name,
                description: stored.genre.description,
            },
            director: Director {
                name: stored.director.name,
                bio: stored.director.bio,
                birth: stored.director.birth,
                death: stored.director.death,
            },
            image_url: stored.image_url,
            featured: stored.featured,
        }
    }
}

/// Movie collection, keyed by generated identifier. Read-only through the
/// API; writes happen via the seed path and tests. Title, genre and
/// director lookups are exact-match scans over the collection.
#[derive(Clone)]
pub struct MovieRepository {
    db: Database,
}

impl MovieRepository {
    pub fn new(db: Database) -> Self {
        MovieRepository { db }
    }

    fn tree(&self) -> Result<Tree, StoreError> {
        Ok(self.db.db.open_tree(MOVIES_TREE)?)
    }

    /// Generates an identifier when the movie carries none.
    pub async fn insert(&self, mut movie: Movie) -> Result<Movie, StoreError> {
        if movie.id.is_empty() {
            movie.id = Uuid::new_v4().to_string();
        }
        let tree = self.tree()?;
        let stored = StoredMovie::from(movie.clone());
        let encoded = bincode::encode_to_vec(&stored, bincode::config::standard())?;
        tree.insert(movie.id.as_bytes(), encoded)?;
        Ok(movie)
    }

    pub async fn all(&self) -> Result<Vec<Movie>, StoreError> {
        let tree = self.tree()?;
        let mut movies = Vec::new();
        for entry in tree.iter() {
            let (_, raw) = entry?;
            let (stored, _): (StoredMovie, usize) =
                bincode::decode_from_slice(&raw, bincode::config::standard())?;
            movies.push(Movie::from(stored));
        }
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(movies)
    }

    pub async fn find_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        self.find(|movie| movie.title == title)
    }

    pub async fn find_by_genre(&self, genre_name: &str) -> Result<Option<Movie>, StoreError> {
        self.find(|movie| movie.genre.name == genre_name)
    }

    pub async fn find_by_director(
        &self,
        director_name: &str,
    ) -> Result<Option<Movie>, StoreError> {
        self.find(|movie| movie.director.name == director_name)
    }

    fn find(&self, matches: impl Fn(&StoredMovie) -> bool) -> Result<Option<Movie>, StoreError> {
        let tree = self.tree()?;
        for entry in tree.iter() {
            let (_, raw) = entry?;
            let (stored, _): (StoredMovie, usize) =
                bincode::decode_from_slice(&raw, bincode::config::standard())?;
            if matches(&stored) {
                return Ok(Some(stored.into()));
            }
        }
        Ok(None)
    }

    pub async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.tree()?.len())
    }

    /// Seed path: parses a JSON array of movies and inserts each one.
    pub async fn import_json(&self, json: &str) -> Result<usize, StoreError> {
        let movies: Vec<Movie> = serde_json::from_str(json)?;
        let count = movies.len();
        for movie in movies {
            self.insert(movie).await?;
        }
        info!(count, "imported movies");
        Ok(count)
    }
}
