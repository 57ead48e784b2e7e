use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::oneshot;

/// Registration set of one-shot wake signals for a single key.
struct WaitPoint {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<u64, oneshot::Sender<()>>>,
}

impl WaitPoint {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    fn subscribe(self: Arc<Self>) -> WaitHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        self.waiters.lock().unwrap().insert(id, tx);

        WaitHandle {
            rx,
            point: self,
            id,
        }
    }

    /// Wake every signal registered at this moment and clear the set.
    ///
    /// The set is drained before any send, so signals registered while the
    /// wake is in flight stay parked until the next publish (or their own
    /// timeout), and fired signals are never re-notified.
    fn notify_all(&self) {
        let fired: Vec<oneshot::Sender<()>> = {
            let mut waiters = self.waiters.lock().unwrap();
            waiters.drain().map(|(_, tx)| tx).collect()
        };

        for tx in fired {
            // A waiter that already gave up is fine to miss.
            let _ = tx.send(());
        }
    }

    fn remove(&self, id: u64) {
        self.waiters.lock().unwrap().remove(&id);
    }
}

/// One reader's registration on a key, exposing only "wait" and "cancel".
///
/// Dropping the handle unregisters it, so every exit path out of a wait
/// cleans up after itself.
pub struct WaitHandle {
    rx: oneshot::Receiver<()>,
    point: Arc<WaitPoint>,
    id: u64,
}

impl WaitHandle {
    /// Resolve when the key is published.
    ///
    /// Also resolves if the registration disappears out from under us
    /// (e.g. after an explicit `cancel`); the caller treats that as a
    /// spurious wake since it re-checks history either way.
    pub async fn wait(&mut self) {
        let _ = (&mut self.rx).await;
    }

    /// Remove this registration. Safe to call repeatedly, or after the
    /// signal has already fired; other registrations are untouched.
    pub fn cancel(&self) {
        self.point.remove(self.id);
    }
}

impl Drop for WaitHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct HubInner {
    points: RwLock<HashMap<String, Arc<WaitPoint>>>,
}

/// Per-key wake points, created lazily and kept for the process lifetime.
///
/// Waking readers on key A never touches key B's registrations: every key
/// owns its own wait point and lock.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                points: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a fresh one-shot signal on `key`.
    ///
    /// Same double-checked pattern as the history store: the read lock
    /// covers the common case, the write lock re-checks before inserting
    /// a new wait point.
    pub fn subscribe(&self, key: &str) -> WaitHandle {
        if let Some(point) = self.inner.points.read().unwrap().get(key) {
            return Arc::clone(point).subscribe();
        }

        let point = {
            let mut points = self.inner.points.write().unwrap();
            Arc::clone(
                points
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(WaitPoint::new())),
            )
        };
        point.subscribe()
    }

    /// Wake everyone currently waiting on `key`.
    ///
    /// A key nobody has ever waited on is a no-op.
    pub fn publish(&self, key: &str) {
        let point = self.inner.points.read().unwrap().get(key).cloned();
        if let Some(point) = point {
            point.notify_all();
        }
    }
}
