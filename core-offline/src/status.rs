//! The shared offline status object and its broadcast.
//!
//! One observable object fans connectivity/storage/progress state out to any
//! number of observers. Subscribers receive a synchronous full-snapshot
//! notification on every mutation (no diffing; snapshots are small) and
//! never mutate the object themselves: all writes funnel through the named
//! methods used by the download orchestrator and the connectivity listener.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::unit::UnitId;

/// Snapshot of the engine's offline state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfflineStatus {
    pub is_online: bool,
    pub downloaded_chapters: Vec<UnitId>,
    /// Progress percent (0-100) per in-flight unit. Entries exist only while
    /// a download is in flight.
    pub download_progress: HashMap<UnitId, u8>,
    pub storage_used: u64,
    pub storage_available: u64,
}

impl Default for OfflineStatus {
    fn default() -> Self {
        Self {
            is_online: true,
            downloaded_chapters: Vec::new(),
            download_progress: HashMap::new(),
            storage_used: 0,
            storage_available: 0,
        }
    }
}

type Callback = Arc<dyn Fn(&OfflineStatus) + Send + Sync>;

/// The process-wide observable status object.
pub struct StatusBroadcast {
    status: Mutex<OfflineStatus>,
    subscribers: Mutex<HashMap<u64, Callback>>,
    next_subscriber_id: AtomicU64,
}

impl StatusBroadcast {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(OfflineStatus::default()),
            subscribers: Mutex::new(HashMap::new()),
            next_subscriber_id: AtomicU64::new(0),
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> OfflineStatus {
        self.status.lock().clone()
    }

    /// Register an observer. The callback immediately receives the current
    /// snapshot, then one snapshot per mutation. Dropping the returned
    /// [`Subscription`] (or calling `unsubscribe`) deregisters it.
    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(&OfflineStatus) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let callback: Callback = Arc::new(callback);
        callback(&self.snapshot());
        self.subscribers.lock().insert(id, callback);
        Subscription {
            broadcast: Arc::downgrade(self),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Apply one mutation and notify every subscriber with the new snapshot.
    fn mutate(&self, apply: impl FnOnce(&mut OfflineStatus)) {
        let snapshot = {
            let mut status = self.status.lock();
            apply(&mut status);
            status.clone()
        };
        // Callbacks run outside both locks so a subscriber may subscribe or
        // unsubscribe from within its callback.
        let callbacks: Vec<Callback> = self.subscribers.lock().values().cloned().collect();
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    pub fn set_online(&self, is_online: bool) {
        self.mutate(|status| status.is_online = is_online);
    }

    pub fn set_progress(&self, id: &UnitId, percent: u8) {
        self.mutate(|status| {
            status.download_progress.insert(id.clone(), percent.min(100));
        });
    }

    pub fn clear_progress(&self, id: &UnitId) {
        self.mutate(|status| {
            status.download_progress.remove(id);
        });
    }

    pub fn set_downloaded_chapters(&self, chapters: Vec<UnitId>) {
        self.mutate(|status| status.downloaded_chapters = chapters);
    }

    pub fn set_storage(&self, used: u64, available: u64) {
        self.mutate(|status| {
            status.storage_used = used;
            status.storage_available = available;
        });
    }
}

impl fmt::Debug for StatusBroadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusBroadcast")
            .field("status", &self.snapshot())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// RAII handle for one observer registration.
pub struct Subscription {
    broadcast: Weak<StatusBroadcast>,
    id: u64,
}

impl Subscription {
    /// Explicit deregistration; equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broadcast) = self.broadcast.upgrade() {
            broadcast.subscribers.lock().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    #[test]
    fn test_subscribe_receives_initial_and_mutation_snapshots() {
        let broadcast = StatusBroadcast::new();
        let seen = Arc::new(PlMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let _subscription = broadcast.subscribe(move |status| {
            sink.lock().push(status.clone());
        });

        broadcast.set_online(false);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_online);
        assert!(!seen[1].is_online);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let broadcast = StatusBroadcast::new();
        let seen = Arc::new(PlMutex::new(0usize));
        let sink = Arc::clone(&seen);

        let subscription = broadcast.subscribe(move |_| {
            *sink.lock() += 1;
        });
        assert_eq!(broadcast.subscriber_count(), 1);

        subscription.unsubscribe();
        assert_eq!(broadcast.subscriber_count(), 0);

        broadcast.set_online(false);
        assert_eq!(*seen.lock(), 1); // only the initial snapshot
    }

    #[test]
    fn test_progress_entries_are_removed_not_zeroed() {
        let broadcast = StatusBroadcast::new();
        let id = UnitId::new("chapter-1");

        broadcast.set_progress(&id, 45);
        assert_eq!(broadcast.snapshot().download_progress.get(&id), Some(&45));

        broadcast.clear_progress(&id);
        assert!(broadcast.snapshot().download_progress.is_empty());
    }

    #[test]
    fn test_progress_is_clamped() {
        let broadcast = StatusBroadcast::new();
        let id = UnitId::new("chapter-1");
        broadcast.set_progress(&id, 250);
        assert_eq!(broadcast.snapshot().download_progress.get(&id), Some(&100));
    }

    #[test]
    fn test_every_mutation_notifies_all_subscribers() {
        let broadcast = StatusBroadcast::new();
        let first = Arc::new(PlMutex::new(0usize));
        let second = Arc::new(PlMutex::new(0usize));

        let sink = Arc::clone(&first);
        let _a = broadcast.subscribe(move |_| *sink.lock() += 1);
        let sink = Arc::clone(&second);
        let _b = broadcast.subscribe(move |_| *sink.lock() += 1);

        broadcast.set_storage(1024, 4096);
        broadcast.set_online(false);

        assert_eq!(*first.lock(), 3); // initial + two mutations
        assert_eq!(*second.lock(), 3);
    }
}
