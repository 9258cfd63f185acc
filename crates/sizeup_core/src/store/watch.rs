//! Change fan-out for session subscriptions.
//!
//! # Responsibility
//! - Track channel senders per session id.
//! - Hand subscribers a disposable receiver handle.
//!
//! # Invariants
//! - A subscriber sees the initial snapshot before any later change.
//! - Dropping a `Subscription` removes its sender; disconnected senders are
//!   pruned on the next publish.

use crate::model::session::{Session, SessionId};
use log::debug;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// One push notification for a watched session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Full document after a create or write.
    Changed(Session),
    /// Document no longer exists.
    Deleted,
    /// Store could not produce a snapshot.
    Failed(String),
}

struct Watcher {
    token: u64,
    sender: Sender<SessionEvent>,
}

#[derive(Default)]
struct WatchTable {
    next_token: u64,
    watchers: BTreeMap<SessionId, Vec<Watcher>>,
}

/// Shared subscriber table used by store adapters.
#[derive(Clone, Default)]
pub struct WatchRegistry {
    table: Arc<Mutex<WatchTable>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and queues `initial` as its first event.
    pub fn subscribe(&self, id: &str, initial: SessionEvent) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let mut table = lock(&self.table);
        let token = table.next_token;
        table.next_token += 1;

        // Receiver is alive, so the send cannot fail.
        let _ = sender.send(initial);
        table
            .watchers
            .entry(id.to_string())
            .or_default()
            .push(Watcher { token, sender });
        debug!("event=session_watch module=store status=subscribed token={token}");

        Subscription {
            session_id: id.to_string(),
            token,
            receiver,
            registry: Arc::downgrade(&self.table),
        }
    }

    /// Pushes `event` to every live subscriber of `id`.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, id: &str, event: &SessionEvent) -> usize {
        let mut table = lock(&self.table);
        let Some(watchers) = table.watchers.get_mut(id) else {
            return 0;
        };

        watchers.retain(|watcher| watcher.sender.send(event.clone()).is_ok());
        let delivered = watchers.len();
        if watchers.is_empty() {
            table.watchers.remove(id);
        }
        delivered
    }

    /// Number of registered subscribers for `id`.
    pub fn subscriber_count(&self, id: &str) -> usize {
        lock(&self.table).watchers.get(id).map_or(0, Vec::len)
    }
}

/// Receiving side of one session subscription.
///
/// Dropping the handle cancels the subscription.
pub struct Subscription {
    session_id: SessionId,
    token: u64,
    receiver: Receiver<SessionEvent>,
    registry: Weak<Mutex<WatchTable>>,
}

impl Subscription {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the next queued event without blocking.
    pub fn try_next(&self) -> Option<SessionEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.receiver.try_iter().collect()
    }

    /// Cancels the subscription explicitly.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(table) = self.registry.upgrade() else {
            return;
        };
        let mut table = lock(&table);
        if let Some(watchers) = table.watchers.get_mut(&self.session_id) {
            watchers.retain(|watcher| watcher.token != self.token);
            if watchers.is_empty() {
                table.watchers.remove(&self.session_id);
            }
        }
        debug!(
            "event=session_watch module=store status=unsubscribed token={}",
            self.token
        );
    }
}

fn lock(table: &Mutex<WatchTable>) -> MutexGuard<'_, WatchTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::{SessionEvent, WatchRegistry};

    #[test]
    fn initial_event_is_delivered_first() {
        let registry = WatchRegistry::new();
        let subscription = registry.subscribe("lusab-babad", SessionEvent::Deleted);
        registry.publish("lusab-babad", &SessionEvent::Failed("boom".to_string()));

        assert_eq!(
            subscription.drain(),
            vec![
                SessionEvent::Deleted,
                SessionEvent::Failed("boom".to_string())
            ]
        );
    }

    #[test]
    fn dropping_subscription_unregisters_it() {
        let registry = WatchRegistry::new();
        let first = registry.subscribe("lusab-babad", SessionEvent::Deleted);
        let second = registry.subscribe("lusab-babad", SessionEvent::Deleted);
        assert_eq!(registry.subscriber_count("lusab-babad"), 2);

        first.unsubscribe();
        assert_eq!(registry.subscriber_count("lusab-babad"), 1);
        drop(second);
        assert_eq!(registry.subscriber_count("lusab-babad"), 0);
        assert_eq!(registry.publish("lusab-babad", &SessionEvent::Deleted), 0);
    }

    #[test]
    fn publish_only_reaches_matching_session() {
        let registry = WatchRegistry::new();
        let watched = registry.subscribe("lusab-babad", SessionEvent::Deleted);
        let other = registry.subscribe("zuzuz-babab", SessionEvent::Deleted);
        let _ = watched.drain();
        let _ = other.drain();

        assert_eq!(registry.publish("lusab-babad", &SessionEvent::Deleted), 1);
        assert_eq!(watched.try_next(), Some(SessionEvent::Deleted));
        assert_eq!(other.try_next(), None);
    }
}
