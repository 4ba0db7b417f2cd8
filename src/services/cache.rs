// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! TTL cache for ranked-result lists, keyed by normalized query text.
//!
//! Concurrent misses for the same key coalesce onto a single builder:
//! the first miss installs an empty `OnceCell` under the map lock, then
//! every caller awaits `get_or_try_init` on that shared cell, so exactly
//! one builder runs and the rest receive its value. If the builder
//! fails, the cell stays empty and the next caller retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

struct CacheEntry<T> {
    cell: Arc<OnceCell<Arc<T>>>,
    inserted_at: Instant,
}

pub struct ResultCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T> ResultCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Return the cached value for `key`, or run `build` to produce it.
    /// Expired entries behave as misses. A builder error is returned to
    /// the caller that observed it and leaves the cache unpopulated.
    pub async fn find_or_build<E, F, Fut>(&self, key: &str, build: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self.live_cell(key);
        cell.get_or_try_init(|| async { build().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Fetch the cell for `key`, replacing expired entries and pruning
    /// other dead entries while the lock is held.
    fn live_cell(&self, key: &str) -> Arc<OnceCell<Arc<T>>> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            // A poisoning panic can only have happened between map
            // operations; the map itself is still consistent.
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(entry) = entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return entry.cell.clone();
            }
        }

        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        let cell = Arc::new(OnceCell::new());
        entries.insert(
            key.to_string(),
            CacheEntry {
                cell: cell.clone(),
                inserted_at: Instant::now(),
            },
        );
        cell
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> std::fmt::Debug for ResultCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
