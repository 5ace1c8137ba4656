//! Keyed preview cache.
//!
//! Re-parsing a RAW file the application just asked about is the common
//! case in a thumbnail grid, so successful extractions can be cached.
//! Entries are keyed by canonical path, file modification time, and a hash
//! of the selection-relevant options; any change to the file or the request
//! shape misses. Eviction is least-recently-used with a fixed entry cap,
//! plus a fixed time-to-live per entry.
//!
//! Caching is opt-in per call and only applies to path-based extractions;
//! buffers have no stable identity to key on.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::extractor::Preview;

/// Default entry cap.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Default time-to-live per entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// Cache key
// =============================================================================

/// Composite key: one file state under one request shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Canonicalized file path
    pub path: String,

    /// File modification time, milliseconds since the epoch
    pub mtime_ms: u64,

    /// Hash of the selection-relevant extraction options
    pub options_hash: u64,
}

// =============================================================================
// PreviewCache
// =============================================================================

struct CacheEntry {
    preview: Preview,
    stored_at: Instant,
}

/// LRU + TTL store for extraction results.
///
/// One mutex serializes lookup and insert; extraction calls on different
/// files share nothing else.
pub struct PreviewCache {
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl PreviewCache {
    /// Cache with the default entry cap and TTL.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }

    /// Cache with an explicit entry cap and TTL.
    pub fn with_capacity(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Look up a previously computed result. Expired entries are evicted on
    /// the way out.
    pub fn get(&self, key: &CacheKey) -> Option<Preview> {
        let mut inner = self.inner.lock().unwrap();
        let expired = match inner.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.preview.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.pop(key);
        }
        None
    }

    /// Store a result. The LRU entry is evicted when the cap is reached.
    pub fn put(&self, key: CacheKey, preview: Preview) {
        let mut inner = self.inner.lock().unwrap();
        inner.put(
            key,
            CacheEntry {
                preview,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of live entries (expired entries still count until touched).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
