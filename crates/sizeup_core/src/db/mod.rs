//! SQLite bootstrap for the session store.
//!
//! # Responsibility
//! - Hand out connections that are configured, migrated and checked against
//!   the layout `SqliteSessionStore` binds to.
//!
//! # Invariants
//! - A connection returned by `open_db*` never holds a schema newer than this
//!   build, and its `sessions` table has every column the store names.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or preparing a session database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// A table exists but lacks columns the store reads or writes.
    MissingColumns {
        table: &'static str,
        columns: Vec<&'static str>,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "session database is at schema {found}, this build understands up to {supported}"
            ),
            Self::MissingColumns { table, columns } => {
                write!(f, "table `{table}` is missing columns: {}", columns.join(", "))
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::MissingColumns { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
