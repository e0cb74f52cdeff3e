pub mod movie_repository;
pub mod user_repository;

use std::path::Path;
use thiserror::Error;

/// Handle to the embedded document store. `sled::Db` is internally
/// reference-counted, so clones share the same store.
#[derive(Clone)]
pub struct Database {
    pub db: sled::Db,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Database { db })
    }

    /// Store backed by a scratch directory that is removed on drop.
    /// Used by the test suites.
    pub fn temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Database { db })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username '{0}' already exists")]
    UsernameTaken(String),

    #[error("storage failure: {0}")]
    Storage(#[from] sled::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("corrupt record: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("invalid movie seed data: {0}")]
    Seed(#[from] serde_json::Error),
}
