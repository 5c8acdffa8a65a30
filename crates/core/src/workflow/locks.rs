//! Per-tracking-id mutual exclusion.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::tracker::tracking_key;

/// Lock table keyed by normalized tracking id.
///
/// Every read-decide-write sequence on a group runs while holding that
/// group's entry, so two scans of the same group can never pick the same
/// item. Entries are dropped once nobody holds or waits on them.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    table: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire_entry(&self, key: &str) -> Arc<Mutex<()>> {
        self.table
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_entry(&self, key: &str, entry: Arc<Mutex<()>>) {
        // One reference in the table plus ours means nobody else is interested.
        // The shard stays write-locked during the check, so no new holder can
        // clone the entry in between.
        self.table.remove_if(key, |_, current| Arc::strong_count(current) == 2);
        drop(entry);
    }

    /// Run `f` while holding the lock for `tracking_id`.
    pub fn with_lock<T>(&self, tracking_id: &str, f: impl FnOnce() -> T) -> T {
        let key = tracking_key(tracking_id);
        let entry = self.acquire_entry(&key);
        let result = {
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release_entry(&key, entry);
        result
    }

    /// Run `f` while holding the locks of every tracking id in `tracking_ids`.
    ///
    /// Locks are taken in sorted key order so this never deadlocks against
    /// other callers.
    pub fn with_locks<'a, T>(
        &self,
        tracking_ids: impl IntoIterator<Item = &'a str>,
        f: impl FnOnce() -> T,
    ) -> T {
        let keys: BTreeSet<String> = tracking_ids.into_iter().map(tracking_key).collect();
        let entries: Vec<(String, Arc<Mutex<()>>)> = keys
            .into_iter()
            .map(|key| {
                let entry = self.acquire_entry(&key);
                (key, entry)
            })
            .collect();

        let result = {
            let _guards: Vec<MutexGuard<'_, ()>> = entries
                .iter()
                .map(|(_, entry)| entry.lock().unwrap_or_else(PoisonError::into_inner))
                .collect();
            f()
        };

        for (key, entry) in entries {
            self.release_entry(&key, entry);
        }
        result
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                // Mixed case still maps to one key.
                let id = if i % 2 == 0 { "awb1" } else { "AWB1" };
                thread::spawn(move || {
                    locks.with_lock(id, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_entries_are_dropped_when_idle() {
        let locks = KeyedLocks::new();
        let value = locks.with_lock("T1", || {
            assert_eq!(locks.len(), 1);
            42
        });
        assert_eq!(value, 42);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_with_locks_deduplicates_keys() {
        let locks = KeyedLocks::new();
        let seen = locks.with_locks(["t1", "T1", "t2"], || locks.len());
        assert_eq!(seen, 2);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_waiting_holder_keeps_entry_alive() {
        let locks = Arc::new(KeyedLocks::new());

        let waiter = locks.with_lock("T1", || {
            let locks = Arc::clone(&locks);
            let handle = thread::spawn(move || locks.with_lock("t1", || ()));
            thread::sleep(Duration::from_millis(20));
            handle
        });

        waiter.join().unwrap();
        assert!(locks.is_empty());
    }
}
