//! Shared decoded-content cache.
//!
//! Byte-budgeted LRU over `Arc<MediaImage>`. Controllers consult it before
//! invoking their source, and the prefetcher warms it for neighbouring
//! slideshow items. Shared behind a `parking_lot::Mutex` so decode workers
//! can insert directly.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::content::SharedImage;

const DEFAULT_CACHE_MB: usize = 256;

/// Cache budget in bytes, overridable via `SLIDEVIEW_CACHE_MB`.
static CACHE_BUDGET_BYTES: Lazy<usize> = Lazy::new(|| {
    std::env::var("SLIDEVIEW_CACHE_MB")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .map(|mb| mb * 1024 * 1024)
        .unwrap_or(DEFAULT_CACHE_MB * 1024 * 1024)
});

/// Identity of cacheable content. Static images have no stable identity
/// and are never cached.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    File(PathBuf),
    Asset(String),
    Remote(String),
}

#[derive(Clone)]
struct CacheEntry {
    image: SharedImage,
    bytes: usize,
}

pub struct ContentCache {
    max_bytes: usize,
    bytes: usize,
    entries: LruCache<CacheKey, CacheEntry>,
}

impl ContentCache {
    pub fn new(max_bytes: usize) -> Self {
        // Entry-count cap is generous; the byte budget is the real limit.
        let capacity = NonZeroUsize::new(2048).unwrap();
        Self {
            max_bytes,
            bytes: 0,
            entries: LruCache::new(capacity),
        }
    }

    /// Cache with the environment-configured budget.
    pub fn with_env_budget() -> Self {
        Self::new(*CACHE_BUDGET_BYTES)
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<SharedImage> {
        self.entries.get(key).map(|entry| entry.image.clone())
    }

    pub fn contains(&mut self, key: &CacheKey) -> bool {
        self.entries.get(key).is_some()
    }

    pub fn insert(&mut self, key: CacheKey, image: SharedImage) {
        let entry = CacheEntry {
            bytes: image.byte_len(),
            image,
        };

        if let Some(existing) = self.entries.put(key, entry.clone()) {
            self.bytes = self.bytes.saturating_sub(existing.bytes);
        }
        self.bytes = self.bytes.saturating_add(entry.bytes);

        while self.bytes > self.max_bytes {
            if let Some((_key, evicted)) = self.entries.pop_lru() {
                self.bytes = self.bytes.saturating_sub(evicted.bytes);
            } else {
                break;
            }
        }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes
    }
}

/// Cache handle shared between controllers and decode workers.
pub type SharedContentCache = Arc<Mutex<ContentCache>>;

pub fn shared_cache(max_bytes: usize) -> SharedContentCache {
    Arc::new(Mutex::new(ContentCache::new(max_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MediaImage;

    fn img(side: u32) -> SharedImage {
        Arc::new(MediaImage::solid(side, side, [9, 9, 9, 255]).unwrap())
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = ContentCache::new(1024 * 1024);
        let key = CacheKey::Asset("logo".into());
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), img(4));
        assert_eq!(cache.get(&key).unwrap().width(), 4);
        assert_eq!(cache.byte_len(), 4 * 4 * 4);
    }

    #[test]
    fn test_reinsert_replaces_byte_accounting() {
        let mut cache = ContentCache::new(1024 * 1024);
        let key = CacheKey::Remote("https://example.com/a".into());
        cache.insert(key.clone(), img(4));
        cache.insert(key.clone(), img(8));
        assert_eq!(cache.byte_len(), 8 * 8 * 4);
    }

    #[test]
    fn test_budget_evicts_least_recent() {
        // Budget fits two 4x4 images, not three.
        let mut cache = ContentCache::new(2 * 4 * 4 * 4);
        let (a, b, c) = (
            CacheKey::Asset("a".into()),
            CacheKey::Asset("b".into()),
            CacheKey::Asset("c".into()),
        );
        cache.insert(a.clone(), img(4));
        cache.insert(b.clone(), img(4));
        cache.get(&a); // refresh a, making b the eviction candidate
        cache.insert(c.clone(), img(4));
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert!(cache.byte_len() <= 2 * 4 * 4 * 4);
    }
}
