use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::snapshot::MetricsSnapshot;

/// Primary cache entry; short TTL, checked before every aggregation.
pub const PRIMARY_KEY: &str = "cluster_metrics";

/// Longer-lived copy served when the upstream is unreachable.
pub const BACKUP_KEY: &str = "cluster_metrics_backup";

/// Snapshot store injected into the aggregator. Get/set with TTL is the
/// whole contract; duplicate computation on concurrent expiry is
/// tolerated, so no further coordination is required.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> Option<MetricsSnapshot>;
    fn set(&self, key: &str, snapshot: MetricsSnapshot, ttl: Duration);
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for &T {
    fn get(&self, key: &str) -> Option<MetricsSnapshot> {
        (**self).get(key)
    }

    fn set(&self, key: &str, snapshot: MetricsSnapshot, ttl: Duration) {
        (**self).set(key, snapshot, ttl)
    }
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Option<MetricsSnapshot> {
        (**self).get(key)
    }

    fn set(&self, key: &str, snapshot: MetricsSnapshot, ttl: Duration) {
        (**self).set(key, snapshot, ttl)
    }
}

/// Process-wide in-memory store with lazy expiry on read.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (MetricsSnapshot, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Option<MetricsSnapshot> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((snapshot, expires_at)) if *expires_at > Instant::now() => {
                Some(snapshot.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, snapshot: MetricsSnapshot, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.lock().insert(key.to_string(), (snapshot, expires_at));
    }
}
