// crates/shp-pivot-core/src/loader/cache.rs

//! In-memory memo of recent loads, keyed by what was uploaded and how it
//! was asked to be loaded.

use super::LoadOutcome;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;

/// Hex SHA-256 of the archive bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fingerprint: String,
    pub include_geometry: bool,
}

impl CacheKey {
    pub fn new(bytes: &[u8], include_geometry: bool) -> Self {
        Self {
            fingerprint: fingerprint(bytes),
            include_geometry,
        }
    }

    /// Stable file name for snapshot storage.
    pub fn file_name(&self) -> String {
        let mode = if self.include_geometry { "geom" } else { "attr" };
        format!("{}-{mode}.bin", self.fingerprint)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// LRU of successful outcomes (`Loaded` and `NotFound`). Errors are never
/// stored, so a transient disk failure does not stick.
pub struct LoadCache {
    entries: Option<LruCache<CacheKey, LoadOutcome>>,
    hits: u64,
    misses: u64,
}

impl LoadCache {
    /// `capacity == 0` yields a cache that never stores anything.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<LoadOutcome> {
        let found = self.entries.as_mut().and_then(|e| e.get(key).cloned());
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    pub fn put(&mut self, key: CacheKey, outcome: LoadOutcome) {
        if let Some(entries) = self.entries.as_mut() {
            entries.put(key, outcome);
        }
    }

    /// Drops every entry for an archive, whichever geometry mode it was
    /// loaded with.
    pub fn invalidate(&mut self, fingerprint: &str) {
        if let Some(entries) = self.entries.as_mut() {
            for include_geometry in [false, true] {
                entries.pop(&CacheKey {
                    fingerprint: fingerprint.to_string(),
                    include_geometry,
                });
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.as_ref().map_or(0, |e| e.len()),
            hits: self.hits,
            misses: self.misses,
        }
    }
}
