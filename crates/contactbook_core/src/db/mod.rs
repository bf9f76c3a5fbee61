//! Contact store bootstrap: connection setup and schema versioning.
//!
//! # Responsibility
//! - Hand out SQLite connections that already carry the `contacts` schema.
//! - Refuse store files written by a newer build.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Repositories only see connections that went through `open_db*`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the contact store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a statement or could not open the file.
    Sqlite(rusqlite::Error),
    /// The store file was migrated by a newer build than this one.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "contact store error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "contact store schema v{db_version} was written by a newer build; this build reads up to v{latest_supported}"
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
