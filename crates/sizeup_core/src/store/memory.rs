//! In-memory session store.
//!
//! Stands in for the managed document backend: documents live in a map,
//! changes fan out through a `WatchRegistry`.
//!
//! Every mutation publishes while still holding the document lock, and
//! `subscribe` snapshots under the same lock, so each subscriber sees
//! changes in store order and its last event matches the stored document.

use crate::model::session::{Session, SessionId};
use crate::store::watch::{SessionEvent, Subscription, WatchRegistry};
use crate::store::{SessionStore, StoreError, StoreResult};
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe map-backed store.
#[derive(Default)]
pub struct InMemorySessionStore {
    documents: Mutex<BTreeMap<SessionId, Session>>,
    watchers: WatchRegistry,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }

    /// Subscriber table, exposed so callers can inspect live subscriptions.
    pub fn watchers(&self) -> &WatchRegistry {
        &self.watchers
    }

    fn documents(&self) -> MutexGuard<'_, BTreeMap<SessionId, Session>> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, session: &Session) -> StoreResult<()> {
        let mut documents = self.documents();
        if documents.contains_key(&session.id) {
            return Err(StoreError::AlreadyExists(session.id.clone()));
        }
        documents.insert(session.id.clone(), session.clone());
        self.watchers
            .publish(&session.id, &SessionEvent::Changed(session.clone()));
        debug!(
            "event=store_create module=store backend=memory status=ok participants={}",
            session.participants.len()
        );
        Ok(())
    }

    fn read(&self, id: &str) -> StoreResult<Session> {
        self.documents()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn write(&self, session: &Session) -> StoreResult<()> {
        let mut documents = self.documents();
        let Some(slot) = documents.get_mut(&session.id) else {
            return Err(StoreError::NotFound(session.id.clone()));
        };
        *slot = session.clone();
        self.watchers
            .publish(&session.id, &SessionEvent::Changed(session.clone()));
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut documents = self.documents();
        if documents.remove(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.watchers.publish(id, &SessionEvent::Deleted);
        Ok(())
    }

    fn subscribe(&self, id: &str) -> StoreResult<Subscription> {
        let documents = self.documents();
        let initial = documents
            .get(id)
            .cloned()
            .map_or(SessionEvent::Deleted, SessionEvent::Changed);
        Ok(self.watchers.subscribe(id, initial))
    }
}
