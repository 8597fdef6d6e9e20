//! Memoizing store
//!
//! Provides [`CachingStore`], a double-checked concurrent cache in front of
//! another store: reads are lock-free, and at most one thread builds the
//! mapping for any given key.

use super::MappingStore;
use crate::error::MappingResult;
use crate::mapping::{Mapping, MappingKind};
use dashmap::DashMap;
use morphic_reflect::TypeKey;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached entries
    pub entry_count: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that reached the inner store
    pub misses: u64,
}

type CacheKey = (TypeKey, TypeKey, MappingKind);

/// Caches resolutions of an inner store
///
/// Positive results are memoized forever. Misses are memoized only when
/// negative caching is enabled. Errors are never cached.
pub struct CachingStore {
    inner: Box<dyn MappingStore>,
    entries: DashMap<CacheKey, Option<Mapping>>,
    build_lock: Mutex<()>,
    cache_negative: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachingStore {
    /// Cache in front of `inner`
    #[must_use]
    pub fn new(inner: impl MappingStore + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            entries: DashMap::new(),
            build_lock: Mutex::new(()),
            cache_negative: false,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Also remember that a pair has no mapping
    #[inline]
    #[must_use]
    pub fn with_negative_caching(mut self, enabled: bool) -> Self {
        self.cache_negative = enabled;
        self
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len() as u64,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Option<Mapping>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }
}

impl MappingStore for CachingStore {
    fn resolve(&self, source: TypeKey, target: TypeKey, kind: MappingKind) -> MappingResult<Option<Mapping>> {
        let key = (source.non_nullable(), target.non_nullable(), kind);

        if let Some(cached) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        let _guard = self.build_lock.lock();
        // Another thread may have built it while we waited
        if let Some(cached) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolved = self.inner.resolve(key.0, key.1, kind)?;
        if resolved.is_some() || self.cache_negative {
            tracing::debug!(
                source = %key.0,
                target = %key.1,
                kind = %kind,
                found = resolved.is_some(),
                "mapping cached"
            );
            self.entries.insert(key, resolved.clone());
        }
        Ok(resolved)
    }
}

impl fmt::Debug for CachingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingStore")
            .field("stats", &self.stats())
            .field("cache_negative", &self.cache_negative)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::Transform;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        found: bool,
    }

    impl MappingStore for Counting {
        fn resolve(&self, _: TypeKey, _: TypeKey, _: MappingKind) -> MappingResult<Option<Mapping>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .found
                .then(|| Transform::typed::<u8, u8, _>(|v, _| Ok(*v)).into()))
        }
    }

    fn counting(found: bool) -> Arc<Counting> {
        Arc::new(Counting {
            calls: AtomicUsize::new(0),
            found,
        })
    }

    #[test]
    fn positive_results_are_shared() {
        let inner = counting(true);
        let store = CachingStore::new(Arc::clone(&inner));
        let key = TypeKey::of::<u8>();

        let a = store.resolve(key, key, MappingKind::Transform).unwrap().unwrap();
        let b = store.resolve(key, key.nullable(), MappingKind::Transform).unwrap().unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.stats(),
            CacheStats {
                entry_count: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn misses_are_retried_by_default() {
        let inner = counting(false);
        let store = CachingStore::new(Arc::clone(&inner));
        let key = TypeKey::of::<u8>();

        assert!(store.resolve(key, key, MappingKind::Merge).unwrap().is_none());
        assert!(store.resolve(key, key, MappingKind::Merge).unwrap().is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn negative_caching_remembers_misses() {
        let inner = counting(false);
        let store = CachingStore::new(Arc::clone(&inner)).with_negative_caching(true);
        let key = TypeKey::of::<u8>();

        assert!(store.resolve(key, key, MappingKind::Merge).unwrap().is_none());
        assert!(store.resolve(key, key, MappingKind::Merge).unwrap().is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.stats().entry_count, 1);
    }

    #[test]
    fn kinds_are_cached_separately() {
        let inner = counting(true);
        let store = CachingStore::new(Arc::clone(&inner));
        let key = TypeKey::of::<u8>();
        store.resolve(key, key, MappingKind::Transform).unwrap();
        store.resolve(key, key, MappingKind::Merge).unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
