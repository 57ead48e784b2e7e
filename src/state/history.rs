use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// A single published update for one key.
///
/// `version` is the Unix timestamp (milliseconds) at which the update was
/// published; it doubles as the cursor readers hand back on their next fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "lastUpdated")]
    pub version: i64,
    pub content: String,
}

/// Fixed-capacity, newest-first retention buffer for one key.
///
/// Writers serialize against each other and against readers through the
/// interior lock; readers only ever see fully inserted updates.
pub struct BoundedHistory {
    capacity: usize,
    entries: RwLock<VecDeque<Update>>,
}

impl BoundedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Insert `update` as the newest entry, dropping the oldest one once
    /// the buffer is full.
    pub fn append(&self, update: Update) {
        let mut entries = self.entries.write().unwrap();
        entries.push_front(update);
        entries.truncate(self.capacity);
    }

    /// Stamp and insert a new update in one step.
    ///
    /// The version is the given wall-clock millisecond, bumped past the
    /// newest retained version so a key's versions stay strictly increasing
    /// even when several publishes land inside the same millisecond.
    pub fn record(&self, now: i64, content: String) -> Update {
        let mut entries = self.entries.write().unwrap();

        let version = match entries.front() {
            Some(newest) if newest.version >= now => newest.version + 1,
            _ => now,
        };

        let update = Update { version, content };
        entries.push_front(update.clone());
        entries.truncate(self.capacity);
        update
    }

    /// Point-in-time copy of the current contents, newest first.
    ///
    /// Callers filter the copy instead of the live buffer, so filtering
    /// never races a concurrent append.
    pub fn snapshot(&self) -> Vec<Update> {
        let entries = self.entries.read().unwrap();
        entries.iter().cloned().collect()
    }
}

/// Subsequence of `snapshot` strictly newer than `cursor`, in the
/// snapshot's own order.
pub fn newer_than(snapshot: &[Update], cursor: i64) -> Vec<Update> {
    snapshot
        .iter()
        .filter(|u| u.version > cursor)
        .cloned()
        .collect()
}

struct StoreInner {
    capacity: usize,
    histories: RwLock<HashMap<String, Arc<BoundedHistory>>>,
}

/// Shared map of per-key histories.
///
/// Histories are created lazily on first access and live for the process
/// lifetime; keys are never evicted.
#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<StoreInner>,
}

impl HistoryStore {
    /// `capacity` applies to every history this store creates.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                capacity,
                histories: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Fetch the history for `key`, creating it on first access.
    ///
    /// Existing keys take the read-lock fast path; only the first caller
    /// for a key upgrades to the write lock, re-checking before inserting
    /// so concurrent first callers all end up on one instance.
    pub fn get_or_create(&self, key: &str) -> Arc<BoundedHistory> {
        if let Some(history) = self.inner.histories.read().unwrap().get(key) {
            return Arc::clone(history);
        }

        let mut histories = self.inner.histories.write().unwrap();
        Arc::clone(
            histories
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(BoundedHistory::new(self.inner.capacity))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(version: i64) -> Update {
        Update {
            version,
            content: format!("update-{version}"),
        }
    }

    #[test]
    fn append_keeps_newest_first() {
        let history = BoundedHistory::new(4);
        for v in 1..=3 {
            history.append(update(v));
        }

        let versions: Vec<i64> = history.snapshot().iter().map(|u| u.version).collect();
        assert_eq!(versions, vec![3, 2, 1]);
    }

    #[test]
    fn append_beyond_capacity_evicts_oldest() {
        let history = BoundedHistory::new(32);
        for v in 1..=40 {
            history.append(update(v));
        }

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 32);

        let versions: Vec<i64> = snapshot.iter().map(|u| u.version).collect();
        assert_eq!(versions, (9..=40).rev().collect::<Vec<_>>());
    }

    #[test]
    fn snapshot_is_a_copy_not_a_view() {
        let history = BoundedHistory::new(4);
        history.append(update(1));

        let before = history.snapshot();
        history.append(update(2));

        assert_eq!(before.len(), 1);
        assert_eq!(history.snapshot().len(), 2);
    }

    #[test]
    fn record_bumps_versions_inside_one_millisecond() {
        let history = BoundedHistory::new(4);

        let first = history.record(100, "a".into());
        let second = history.record(100, "b".into());
        let third = history.record(5_000, "c".into());

        assert_eq!(first.version, 100);
        assert_eq!(second.version, 101);
        assert_eq!(third.version, 5_000);
    }

    #[test]
    fn newer_than_filters_strictly_and_preserves_order() {
        let snapshot = vec![update(5), update(4), update(2)];

        let newer = newer_than(&snapshot, 2);
        let versions: Vec<i64> = newer.iter().map(|u| u.version).collect();
        assert_eq!(versions, vec![5, 4]);

        assert!(newer_than(&snapshot, 5).is_empty());
    }

    #[test]
    fn get_or_create_shares_one_instance_per_key() {
        let store = HistoryStore::new(8);

        let a = store.get_or_create("a");
        let a_again = store.get_or_create("a");
        let b = store.get_or_create("b");

        assert!(Arc::ptr_eq(&a, &a_again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_first_access_agrees_on_one_history() {
        let store = HistoryStore::new(8);

        let handles: Vec<_> = (0..8i64)
            .map(|v| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.get_or_create("shared").append(update(v));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // all eight appends landed in the same history
        assert_eq!(store.get_or_create("shared").snapshot().len(), 8);
    }
}
