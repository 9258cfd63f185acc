//! SQLite-backed session store.
//!
//! # Responsibility
//! - Persist session documents as JSON text keyed by session id.
//! - Push changes made through this store to in-process subscribers.
//!
//! # Invariants
//! - Read paths reject malformed documents instead of masking them.
//! - A stored document's `id` always equals its row key.

use crate::model::session::Session;
use crate::store::watch::{SessionEvent, Subscription, WatchRegistry};
use crate::store::{SessionStore, StoreError, StoreResult};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};

/// Session store over one migrated SQLite connection.
pub struct SqliteSessionStore<'conn> {
    conn: &'conn Connection,
    watchers: WatchRegistry,
}

impl<'conn> SqliteSessionStore<'conn> {
    /// Wraps a connection returned by `db::open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            watchers: WatchRegistry::new(),
        }
    }

    pub fn watchers(&self) -> &WatchRegistry {
        &self.watchers
    }

    /// Lists stored session ids, newest first.
    pub fn list_ids(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM sessions ORDER BY created_at DESC, id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn load(&self, id: &str) -> StoreResult<Option<Session>> {
        let document = self
            .conn
            .query_row(
                "SELECT document FROM sessions WHERE id = ?1;",
                [id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        document
            .map(|text| decode_document(id, &text))
            .transpose()
    }
}

impl SessionStore for SqliteSessionStore<'_> {
    fn create(&self, session: &Session) -> StoreResult<()> {
        let document = serde_json::to_string(session)?;
        let inserted = self.conn.execute(
            "INSERT INTO sessions (id, document, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO NOTHING;",
            params![session.id.as_str(), document, session.created_at],
        )?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(session.id.clone()));
        }

        debug!(
            "event=store_create module=store backend=sqlite status=ok participants={}",
            session.participants.len()
        );
        self.watchers
            .publish(&session.id, &SessionEvent::Changed(session.clone()));
        Ok(())
    }

    fn read(&self, id: &str) -> StoreResult<Session> {
        self.load(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn write(&self, session: &Session) -> StoreResult<()> {
        let document = serde_json::to_string(session)?;
        let changed = self.conn.execute(
            "UPDATE sessions
             SET
                document = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![document, session.id.as_str()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(session.id.clone()));
        }

        self.watchers
            .publish(&session.id, &SessionEvent::Changed(session.clone()));
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        self.watchers.publish(id, &SessionEvent::Deleted);
        Ok(())
    }

    fn subscribe(&self, id: &str) -> StoreResult<Subscription> {
        let initial = match self.load(id) {
            Ok(Some(session)) => SessionEvent::Changed(session),
            Ok(None) => SessionEvent::Deleted,
            // Snapshot failures reach the subscriber as an event, the way a
            // listener error callback would.
            Err(err) => {
                warn!("event=session_watch module=store backend=sqlite status=error error={err}");
                SessionEvent::Failed(err.to_string())
            }
        };
        Ok(self.watchers.subscribe(id, initial))
    }
}

fn decode_document(id: &str, text: &str) -> StoreResult<Session> {
    let mut session: Session = serde_json::from_str(text)
        .map_err(|err| StoreError::InvalidData(format!("sessions.document for `{id}`: {err}")))?;

    if session.id.is_empty() {
        session.id = id.to_string();
    } else if session.id != id {
        return Err(StoreError::InvalidData(format!(
            "document id `{}` does not match row key `{id}`",
            session.id
        )));
    }

    Ok(session)
}
