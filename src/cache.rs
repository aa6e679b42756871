//! Tag-partitioned response cache with in-flight deduplication.
//!
//! Every cacheable read belongs to a resource tag (products or admins)
//! and a key within it. Writes never update entries in place: any
//! successful write bumps its tag's generation, which instantly stales
//! every entry in that partition. Entries are stamped with the
//! generation current when their fetch *began*, so a write that lands
//! while a fetch is in flight stales the result before it is ever
//! served to a later reader.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Resource partitions the cache tracks independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Products,
    Admins,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Products => "products",
            Tag::Admins => "admins",
        }
    }

    fn index(self) -> usize {
        match self {
            Tag::Products => 0,
            Tag::Admins => 1,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    generation: u64,
}

#[derive(Debug, Default)]
struct PartitionState {
    generation: u64,
    entries: HashMap<String, Entry>,
}

#[derive(Default)]
struct Partition {
    state: Mutex<PartitionState>,
    /// Per-key locks so concurrent misses on one key issue one fetch.
    /// Outer parking_lot::Mutex for fast synchronous map access;
    /// inner tokio::sync::Mutex for async-compatible per-key locking.
    fetch_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Response cache shared by all resource clients.
#[derive(Default)]
pub struct ResourceCache {
    partitions: [Partition; 2],
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, tag: Tag) -> &Partition {
        &self.partitions[tag.index()]
    }

    /// Return the cached value, or run `fetch` and cache its result.
    ///
    /// Concurrent callers for the same key serialize on a per-key lock
    /// and re-check the cache after acquiring it, so a burst of misses
    /// costs one upstream fetch. A failed fetch caches nothing; the
    /// next caller through the lock fetches again.
    pub async fn get_or_fetch<F, Fut, E>(&self, tag: Tag, key: &str, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.lookup(tag, key) {
            debug!(%tag, key, "cache hit");
            return Ok(value);
        }

        let lock = self.fetch_lock(tag, key);
        let _guard = lock.lock_owned().await;

        // Another caller may have filled the entry while we waited.
        if let Some(value) = self.lookup(tag, key) {
            debug!(%tag, key, "cache hit after waiting on in-flight fetch");
            return Ok(value);
        }

        // Stamp with the generation from before the fetch starts. If a
        // write bumps it mid-fetch, the entry we store is already stale.
        let generation = self.partition(tag).state.lock().generation;
        debug!(%tag, key, generation, "cache miss, fetching");
        let value = fetch().await?;

        {
            let mut state = self.partition(tag).state.lock();
            state.entries.insert(
                key.to_string(),
                Entry {
                    value: value.clone(),
                    generation,
                },
            );
        }
        self.cleanup_fetch_locks(tag);
        Ok(value)
    }

    /// Stale every entry in the partition. O(1) via the generation
    /// bump; the map is also cleared to release memory.
    pub fn invalidate(&self, tag: Tag) {
        let mut state = self.partition(tag).state.lock();
        state.generation += 1;
        let dropped = state.entries.len();
        state.entries.clear();
        debug!(%tag, generation = state.generation, dropped, "invalidated partition");
    }

    fn lookup(&self, tag: Tag, key: &str) -> Option<Value> {
        let state = self.partition(tag).state.lock();
        state
            .entries
            .get(key)
            .filter(|entry| entry.generation == state.generation)
            .map(|entry| entry.value.clone())
    }

    fn fetch_lock(&self, tag: Tag, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.partition(tag).fetch_locks.lock();
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Prune fetch lock entries that are no longer actively held.
    /// An entry with `Arc::strong_count() == 1` means only the map
    /// references it (no outstanding guard), so it can be removed.
    fn cleanup_fetch_locks(&self, tag: Tag) {
        const CLEANUP_THRESHOLD: usize = 256;
        let mut locks = self.partition(tag).fetch_locks.lock();
        if locks.len() <= CLEANUP_THRESHOLD {
            return;
        }
        locks.retain(|_, arc| Arc::strong_count(arc) > 1);
    }
}
