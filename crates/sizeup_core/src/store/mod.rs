//! Session store contracts and adapters.
//!
//! # Responsibility
//! - Define the document-store port the services talk to.
//! - Provide in-memory and SQLite adapters with change subscriptions.
//!
//! # Invariants
//! - Writes replace the whole document; the last writer wins.
//! - Every successful create/write/delete is pushed to current subscribers
//!   of that session id.
//! - Store errors are propagated unchanged; adapters never retry.

use crate::db::DbError;
use crate::model::session::{Session, SessionId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;
pub mod watch;

pub use memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;
pub use watch::{SessionEvent, Subscription, WatchRegistry};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure.
#[derive(Debug)]
pub enum StoreError {
    NotFound(SessionId),
    AlreadyExists(SessionId),
    Db(DbError),
    /// Persisted document could not be decoded or encoded.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "session not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "session already exists: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid session document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Document store holding one document per session id.
pub trait SessionStore {
    /// Stores a new document keyed by `session.id`.
    ///
    /// Fails with `AlreadyExists` instead of overwriting.
    fn create(&self, session: &Session) -> StoreResult<()>;

    /// Reads the current document, or `NotFound`.
    fn read(&self, id: &str) -> StoreResult<Session>;

    /// Replaces the whole document keyed by `session.id`.
    fn write(&self, session: &Session) -> StoreResult<()>;

    /// Removes a document and notifies subscribers with `Deleted`.
    fn delete(&self, id: &str) -> StoreResult<()>;

    /// Registers for changes on one document.
    ///
    /// The first event is the current state (`Changed`, or `Deleted` when the
    /// document is missing). Dropping the returned handle unsubscribes.
    fn subscribe(&self, id: &str) -> StoreResult<Subscription>;
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn create(&self, session: &Session) -> StoreResult<()> {
        (**self).create(session)
    }

    fn read(&self, id: &str) -> StoreResult<Session> {
        (**self).read(id)
    }

    fn write(&self, session: &Session) -> StoreResult<()> {
        (**self).write(session)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        (**self).delete(id)
    }

    fn subscribe(&self, id: &str) -> StoreResult<Subscription> {
        (**self).subscribe(id)
    }
}
