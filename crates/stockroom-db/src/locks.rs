//! # Stock Lock Table
//!
//! Row-scoped locks for stock levels, held from the bulk reads of a request
//! until its commit (or rollback) finishes.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockLockTable                                                         │
//! │                                                                         │
//! │   (drill, loc-1) ──► Weak ─┐                                            │
//! │   (saw,   loc-1) ──► Weak ─┼──► Arc<tokio::Mutex<()>>  (one per row)    │
//! │   (bolt,  loc-2) ──► Weak ─┘                                            │
//! │                                                                         │
//! │  Request A: lock {drill, saw}      Request B: lock {saw, bolt}          │
//! │     drill ✓  saw ✓  ...commit...      saw ⏳ (waits for A)  bolt ✓      │
//! │                                                                         │
//! │  Request C: lock {bolt}  ──► independent of A, runs in parallel         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - Keys are always acquired in sorted order, so two requests can never
//!   wait on each other in a cycle.
//! - The table holds only weak references. An entry lives as long as some
//!   request holds or waits on its mutex and is swept on the next acquire.
//! - tokio's mutex is FIFO, so a waiting request is not starved by later ones.
//!
//! The locks serialize requests inside one process. Writers in other
//! processes are still caught by the `version` compare-and-swap and the
//! CHECK constraints in the schema.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// `(item_id, location_id)`
pub type StockKey = (String, String);

/// Hands out one async mutex per stock row.
#[derive(Debug, Default)]
pub struct StockLockTable {
    entries: Mutex<HashMap<StockKey, Weak<AsyncMutex<()>>>>,
}

/// Guards for every row of one request. Dropping it releases them all.
#[derive(Debug)]
pub struct StockLockSet {
    keys: Vec<StockKey>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl StockLockSet {
    /// Locked keys, in acquisition (sorted) order.
    pub fn keys(&self) -> &[StockKey] {
        &self.keys
    }
}

impl StockLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every given row, waiting for each in key order.
    ///
    /// Duplicate keys are collapsed. Cancelling the returned future releases
    /// whatever was already acquired.
    pub async fn lock_all<I>(&self, keys: I) -> StockLockSet
    where
        I: IntoIterator<Item = StockKey>,
    {
        let keys: BTreeSet<StockKey> = keys.into_iter().collect();
        let mutexes = self.resolve(&keys);

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        trace!(rows = guards.len(), "Stock rows locked");

        StockLockSet {
            keys: keys.into_iter().collect(),
            _guards: guards,
        }
    }

    /// Locks the rows of `item_ids` at one location.
    pub async fn lock_items<'a, I>(&self, location_id: &str, item_ids: I) -> StockLockSet
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keys = item_ids
            .into_iter()
            .map(|item| (item.to_string(), location_id.to_string()));
        self.lock_all(keys).await
    }

    /// Number of rows currently locked or waited on.
    pub fn active_entries(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.values().filter(|w| w.strong_count() > 0).count()
    }

    // Returns the mutex for every key, creating missing ones. The std mutex
    // is never held across an await.
    fn resolve(&self, keys: &BTreeSet<StockKey>) -> Vec<Arc<AsyncMutex<()>>> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.retain(|_, weak| weak.strong_count() > 0);

        keys.iter()
            .map(|key| {
                if let Some(existing) = entries.get(key).and_then(Weak::upgrade) {
                    return existing;
                }
                let fresh = Arc::new(AsyncMutex::new(()));
                entries.insert(key.clone(), Arc::downgrade(&fresh));
                fresh
            })
            .collect()
    }
}
