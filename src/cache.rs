//! Small LRU front for image metadata lookups.
//!
//! The act-on resolver and the group annotator hit `ImageCache::info` for
//! the same handful of ids on every pointer move. `InfoCache` wraps any
//! backend and memoizes results, including negative ones, so a missing id
//! does not turn into a database query per event.

use std::cell::RefCell;
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

use crate::services::{ImageCache, ImageId, ImageInfo};

const DEFAULT_CAPACITY: usize = 512;

pub struct InfoCache<C: ImageCache> {
    inner: C,
    cache: RefCell<LruCache<ImageId, Option<ImageInfo>>>,
}

impl<C: ImageCache> InfoCache<C> {
    pub fn new(inner: C) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: C, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: RefCell::new(LruCache::new(capacity)),
        }
    }

    /// Drops the cached entry for one image, e.g. after its group changed.
    pub fn invalidate(&self, id: ImageId) {
        self.cache.borrow_mut().pop(&id);
    }

    /// Drops everything. Called on collection reload.
    pub fn clear(&self) {
        let mut cache = self.cache.borrow_mut();
        debug!("Clearing {} cached image info entries", cache.len());
        cache.clear();
    }
}

impl<C: ImageCache> ImageCache for InfoCache<C> {
    fn info(&self, id: ImageId) -> Option<ImageInfo> {
        if let Some(hit) = self.cache.borrow_mut().get(&id) {
            return hit.clone();
        }
        let fetched = self.inner.info(id);
        self.cache.borrow_mut().put(id, fetched.clone());
        fetched
    }
}
