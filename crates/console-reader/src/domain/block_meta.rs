//! # Block Metadata Cache
//!
//! Bounded map from block id to `(id, height, time)`, used to resolve the
//! parent and LIB heights a log line does not carry.
//!
//! ## Layout
//!
//! Entries live in a contiguous arena arranged as a binary min-heap keyed by
//! height, with a parallel `id -> slot` index. That gives O(1) lookup by id,
//! O(log n) insert, and O(log n) removal of an arbitrary id.
//!
//! ## Capacity
//!
//! The cache only has to answer "what height does this recently seen hash
//! have" for a window behind the head bounded by finality depth. The default
//! of [`DEFAULT_META_CACHE_CAPACITY`] entries is an assumption, not a derived
//! bound: anything older is served by the fallback fetcher. Fallback results
//! are never inserted, so lookups of old blocks cannot grow the cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::errors::CacheError;
use crate::ports::outbound::BlockMetaFetcher;

/// Default number of entries kept before evicting the lowest heights.
pub const DEFAULT_META_CACHE_CAPACITY: usize = 2000;

/// Identity, height and time of a block seen on the stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    /// Canonical (base58) block id.
    pub id: String,
    /// Block height.
    pub height: u64,
    /// Block production time.
    pub observed_at: DateTime<Utc>,
}

impl BlockMeta {
    /// Create a new block meta.
    pub fn new(id: impl Into<String>, height: u64, observed_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            height,
            observed_at,
        }
    }
}

/// Height-ordered block metadata cache with fetch-through on miss.
pub struct BlockMetaCache {
    /// Heap-ordered arena.
    entries: Vec<BlockMeta>,
    /// id -> arena slot.
    index: HashMap<String, usize>,
    /// Maximum entries retained after a push.
    capacity: usize,
    /// Lookup used on a local miss.
    fetcher: Arc<dyn BlockMetaFetcher>,
    /// Number of fallback fetches issued.
    fallback_fetches: u64,
}

impl BlockMetaCache {
    /// Create an empty cache.
    pub fn new(capacity: usize, fetcher: Arc<dyn BlockMetaFetcher>) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            capacity,
            fetcher,
            fallback_fetches: 0,
        }
    }

    /// Insert or replace the meta for `meta.id`, then evict down to capacity.
    pub fn push(&mut self, meta: BlockMeta) {
        match self.index.get(&meta.id).copied() {
            Some(slot) => {
                self.entries[slot] = meta;
                self.fix(slot);
            }
            None => {
                let slot = self.entries.len();
                self.index.insert(meta.id.clone(), slot);
                self.entries.push(meta);
                self.sift_up(slot);
            }
        }

        self.evict_oldest();
    }

    /// Resolve a block id.
    ///
    /// A local hit is returned as is. On a miss the fallback fetcher is
    /// called exactly once and its answer is returned without being cached.
    pub async fn get(&mut self, id: &str) -> Result<BlockMeta, CacheError> {
        if let Some(&slot) = self.index.get(id) {
            return Ok(self.entries[slot].clone());
        }

        self.fallback_fetches += 1;
        debug!(block_id = %id, "block meta not cached, using fallback fetcher");

        match self.fetcher.fetch(id).await {
            Ok(Some(meta)) => Ok(meta),
            Ok(None) => Err(CacheError::NotFound(id.to_string())),
            Err(e) => {
                warn!(block_id = %id, error = %e, "fallback block meta fetch failed");
                Err(CacheError::FetchFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Remove the entry for `id`, whatever its height.
    pub fn purge(&mut self, id: &str) -> Option<BlockMeta> {
        let slot = self.index.get(id).copied()?;
        self.remove_at(slot)
    }

    /// Remove and return the lowest-height entry.
    pub fn pop_oldest(&mut self) -> Option<BlockMeta> {
        self.remove_at(0)
    }

    /// Lowest-height entry, without removing it.
    pub fn peek_oldest(&self) -> Option<&BlockMeta> {
        self.entries.first()
    }

    /// Drop lowest-height entries until the cache is within capacity.
    pub fn evict_oldest(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.pop_oldest() {
                trace!(block_id = %evicted.id, height = evicted.height, "evicted block meta");
            }
        }
    }

    /// True if `id` is cached locally.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of lookups that went to the fallback fetcher.
    pub fn fallback_fetches(&self) -> u64 {
        self.fallback_fetches
    }

    fn remove_at(&mut self, slot: usize) -> Option<BlockMeta> {
        let last = self.entries.len().checked_sub(1)?;
        if slot > last {
            return None;
        }
        self.swap(slot, last);

        let removed = self.entries.pop()?;
        self.index.remove(&removed.id);

        if slot < self.entries.len() {
            self.fix(slot);
        }
        Some(removed)
    }

    /// Restore heap order for an entry whose height may have changed.
    fn fix(&mut self, slot: usize) {
        if !self.sift_down(slot) {
            self.sift_up(slot);
        }
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[slot].height >= self.entries[parent].height {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    /// Returns true if the entry moved.
    fn sift_down(&mut self, start: usize) -> bool {
        let len = self.entries.len();
        let mut slot = start;
        loop {
            let left = 2 * slot + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let child = if right < len && self.entries[right].height < self.entries[left].height {
                right
            } else {
                left
            };
            if self.entries[child].height >= self.entries[slot].height {
                break;
            }
            self.swap(slot, child);
            slot = child;
        }
        slot > start
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.index.insert(self.entries[a].id.clone(), a);
        self.index.insert(self.entries[b].id.clone(), b);
    }
}

impl std::fmt::Debug for BlockMetaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockMetaCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("fallback_fetches", &self.fallback_fetches)
            .finish()
    }
}
