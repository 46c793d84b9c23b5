//! In-memory cache of parsed source tables.

use crate::table::Table;

use cached::{Cached, SizedCache, TimedCache, TimedSizedCache, UnboundCache};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A cache slot for one source.
///
/// The slot is created empty and filled at most once. Concurrent loads of the same source share
/// a slot, so only the first performs the fetch while the others wait for it. A slot whose fill
/// failed stays empty and the next load tries again.
pub type CacheSlot = Arc<OnceCell<Arc<Table>>>;

/// Cache of source tables keyed by source location.
///
/// Entries are never invalidated by changes to the underlying data. Eviction happens only when
/// a size limit or a time to live is configured.
#[derive(Debug)]
pub enum SourceCache {
    /// No eviction
    Unbound(UnboundCache<String, CacheSlot>),
    /// Least recently used eviction once the size limit is reached
    Sized(SizedCache<String, CacheSlot>),
    /// Entries expire after a time to live in seconds
    Timed(TimedCache<String, CacheSlot>),
    /// Both of the above
    TimedSized(TimedSizedCache<String, CacheSlot>),
}

impl SourceCache {
    /// Returns a new SourceCache.
    ///
    /// # Arguments
    ///
    /// * `size`: Optional maximum number of sources
    /// * `ttl`: Optional time to live in seconds
    pub fn new(size: Option<NonZeroUsize>, ttl: Option<u64>) -> Self {
        match (size, ttl) {
            (None, None) => Self::Unbound(UnboundCache::new()),
            (Some(size), None) => Self::Sized(SizedCache::with_size(size.get())),
            (None, Some(ttl)) => Self::Timed(TimedCache::with_lifespan(ttl)),
            (Some(size), Some(ttl)) => {
                Self::TimedSized(TimedSizedCache::with_size_and_lifespan(size.get(), ttl))
            }
        }
    }

    /// Returns the slot for `key`, inserting an empty one if there is none.
    pub fn slot(&mut self, key: &str) -> CacheSlot {
        let key = key.to_string();
        match self {
            Self::Unbound(cache) => cache.cache_get_or_set_with(key, CacheSlot::default).clone(),
            Self::Sized(cache) => cache.cache_get_or_set_with(key, CacheSlot::default).clone(),
            Self::Timed(cache) => cache.cache_get_or_set_with(key, CacheSlot::default).clone(),
            Self::TimedSized(cache) => cache.cache_get_or_set_with(key, CacheSlot::default).clone(),
        }
    }

    /// Removes the slot for `key` if it has not been filled.
    ///
    /// A filled slot is left alone, since a concurrent load may have filled it after a failure.
    pub fn remove_empty(&mut self, key: &str) {
        match self {
            Self::Unbound(cache) => remove_empty(cache, key),
            Self::Sized(cache) => remove_empty(cache, key),
            Self::Timed(cache) => remove_empty(cache, key),
            Self::TimedSized(cache) => remove_empty(cache, key),
        }
    }

    /// Number of cached slots, including empty ones.
    pub fn len(&self) -> usize {
        match self {
            Self::Unbound(cache) => cache.cache_size(),
            Self::Sized(cache) => cache.cache_size(),
            Self::Timed(cache) => cache.cache_size(),
            Self::TimedSized(cache) => cache.cache_size(),
        }
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_empty<C: Cached<String, CacheSlot>>(cache: &mut C, key: &str) {
    let empty = cache
        .cache_get(key)
        .map_or(false, |slot| !slot.initialized());
    if empty {
        cache.cache_remove(key);
    }
}

impl Default for SourceCache {
    fn default() -> Self {
        Self::new(None, None)
    }
}
