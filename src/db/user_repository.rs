use crate::db::{Database, StoreError};
use crate::models::user::User;
use bincode::{Decode, Encode};
use chrono::NaiveDate;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::Tree;
use tracing::info;

const USERS_TREE: &str = "users";
const DATE_FMT: &str = "%Y-%m-%d";

/// On-disk mirror of [`User`]. Dates are kept as ISO strings because the
/// bincode derives only cover plain data types.
#[derive(Debug, Clone, Encode, Decode)]
struct StoredUser {
    username: String,
    password_hash: String,
    email: String,
    birthday: Option<String>,
    favorite_movies: Vec<String>,
}

impl From<User> for StoredUser {
    fn from(user: User) -> Self {
        StoredUser {
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            birthday: user.birthday.map(|d| d.format(DATE_FMT).to_string()),
            favorite_movies: user.favorite_movies,
        }
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        User {
            username: stored.username,
            password_hash: stored.password_hash,
            email: stored.email,
            birthday: stored
                .birthday
                .and_then(|s| NaiveDate::parse_from_str(&s, DATE_FMT).ok()),
            favorite_movies: stored.favorite_movies,
        }
    }
}

/// User collection, keyed by username. Every lookup in the API surface is
/// by username, so the username doubles as the document key and uniqueness
/// falls out of a plain insert-if-absent.
#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        UserRepository { db }
    }

    fn tree(&self) -> Result<Tree, StoreError> {
        Ok(self.db.db.open_tree(USERS_TREE)?)
    }

    /// Atomic insert-if-absent. Two concurrent registrations for the same
    /// username race on the compare-and-swap and exactly one wins.
    pub async fn create(&self, user: User) -> Result<User, StoreError> {
        let tree = self.tree()?;
        let stored = StoredUser::from(user.clone());
        let encoded = bincode::encode_to_vec(&stored, bincode::config::standard())?;

        let swap = tree.compare_and_swap(
            user.username.as_bytes(),
            None as Option<&[u8]>,
            Some(encoded),
        )?;
        if swap.is_err() {
            return Err(StoreError::UsernameTaken(user.username));
        }

        info!(username = %user.username, "user created");
        Ok(user)
    }

    pub async fn get(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tree = self.tree()?;
        match tree.get(username.as_bytes())? {
            Some(raw) => {
                let (stored, _): (StoredUser, usize) =
                    bincode::decode_from_slice(&raw, bincode::config::standard())?;
                Ok(Some(stored.into()))
            }
            None => Ok(None),
        }
    }

    pub async fn all(&self) -> Result<Vec<User>, StoreError> {
        let tree = self.tree()?;
        let mut users = Vec::new();
        for entry in tree.iter() {
            let (_, raw) = entry?;
            let (stored, _): (StoredUser, usize) =
                bincode::decode_from_slice(&raw, bincode::config::standard())?;
            users.push(stored.into());
        }
        Ok(users)
    }

    /// Full-field replacement of the record at `username`. The favorites
    /// list is carried over from the existing record. When the new field
    /// set renames the user, the record moves to the new key in the same
    /// transaction and collides with 'username taken' if the key exists.
    /// Returns `None` when no record matched.
    pub async fn replace(
        &self,
        username: &str,
        updated: User,
    ) -> Result<Option<User>, StoreError> {
        let tree = self.tree()?;
        let result = tree.transaction(
            |tx| -> ConflictableTransactionResult<Option<StoredUser>, StoreError> {
                let Some(raw) = tx.get(username.as_bytes())? else {
                    return Ok(None);
                };
                let (current, _): (StoredUser, usize) =
                    bincode::decode_from_slice(&raw, bincode::config::standard())
                        .map_err(|e| abort(e.into()))?;

                let mut stored = StoredUser::from(updated.clone());
                stored.favorite_movies = current.favorite_movies;

                if stored.username != username {
                    if tx.get(stored.username.as_bytes())?.is_some() {
                        return Err(abort(StoreError::UsernameTaken(stored.username.clone())));
                    }
                    tx.remove(username.as_bytes())?;
                }

                let encoded = bincode::encode_to_vec(&stored, bincode::config::standard())
                    .map_err(|e| abort(e.into()))?;
                tx.insert(stored.username.clone().into_bytes(), encoded)?;
                Ok(Some(stored))
            },
        );

        let replaced = unpack(result)?;
        if let Some(stored) = &replaced {
            info!(username = %username, new_username = %stored.username, "user updated");
        }
        Ok(replaced.map(User::from))
    }

    /// Appends unconditionally; adding the same identifier twice leaves two
    /// entries. Returns `None` when no record matched.
    pub async fn add_favorite(
        &self,
        username: &str,
        movie_id: &str,
    ) -> Result<Option<User>, StoreError> {
        self.mutate(username, |stored| {
            stored.favorite_movies.push(movie_id.to_string());
        })
    }

    /// Removes every occurrence of the identifier. Removing an identifier
    /// that was never present is a no-op, not an error. Returns `None` when
    /// no record matched.
    pub async fn remove_favorite(
        &self,
        username: &str,
        movie_id: &str,
    ) -> Result<Option<User>, StoreError> {
        self.mutate(username, |stored| {
            stored.favorite_movies.retain(|id| id != movie_id);
        })
    }

    /// Single-document read-modify-write inside a store transaction.
    fn mutate(
        &self,
        username: &str,
        apply: impl Fn(&mut StoredUser),
    ) -> Result<Option<User>, StoreError> {
        let tree = self.tree()?;
        let result = tree.transaction(
            |tx| -> ConflictableTransactionResult<Option<StoredUser>, StoreError> {
                let Some(raw) = tx.get(username.as_bytes())? else {
                    return Ok(None);
                };
                let (mut stored, _): (StoredUser, usize) =
                    bincode::decode_from_slice(&raw, bincode::config::standard())
                        .map_err(|e| abort(e.into()))?;

                apply(&mut stored);

                let encoded = bincode::encode_to_vec(&stored, bincode::config::standard())
                    .map_err(|e| abort(e.into()))?;
                tx.insert(username.as_bytes(), encoded)?;
                Ok(Some(stored))
            },
        );
        Ok(unpack(result)?.map(User::from))
    }

    /// Returns whether a record was actually removed.
    pub async fn delete(&self, username: &str) -> Result<bool, StoreError> {
        let tree = self.tree()?;
        let removed = tree.remove(username.as_bytes())?.is_some();
        if removed {
            info!(username = %username, "user deleted");
        }
        Ok(removed)
    }
}

fn abort(err: StoreError) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(err)
}

fn unpack<T>(result: Result<T, TransactionError<StoreError>>) -> Result<T, StoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(err)) => Err(err),
        Err(TransactionError::Storage(err)) => Err(StoreError::Storage(err)),
    }
}
