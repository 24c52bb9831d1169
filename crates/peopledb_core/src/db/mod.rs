//! SQLite session bootstrap and bootstrap schema.
//!
//! # Responsibility
//! - Open and configure the SQLite session a repository borrows.
//! - Create the `PERSON` / `ADDRESSES` schema before any repository runs.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Sessions are owned by the caller; this module never opens transactions
//!   on behalf of repository operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage-level failure raised by SQLite or by session bootstrap.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The database file was written by a newer build.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
