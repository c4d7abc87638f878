//! Size-bounded cache of version artifacts
//!
//! Bundles can be large, so they are held in an LRU cache bounded by total
//! payload bytes and entry count instead of living as long as the versions
//! that refer to them. An evicted bundle is simply fetched again from its
//! backend on the next access; the version metadata is never touched.
//!
//! Memory pressure is signalled explicitly through `reclaim` and
//! `shrink_to`. Every eviction, whatever the cause, is reported to the
//! optional eviction listener.

use crate::bundle::Bundle;
use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identity of one version's payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub registry: String,
    pub family: String,
    pub component: String,
    pub version: u32,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}/{}@{}",
            self.registry, self.family, self.component, self.version
        )
    }
}

/// Called with every entry the cache drops
pub type EvictionListener = Box<dyn Fn(&ArtifactKey, &Bundle) + Send + Sync>;

struct Entries {
    lru: LruCache<ArtifactKey, Arc<Bundle>>,
    bytes: usize,
}

/// Shared artifact cache
pub struct ArtifactCache {
    entries: Mutex<Entries>,
    max_bytes: usize,
    max_entries: usize,
    listener: Option<EvictionListener>,
}

impl ArtifactCache {
    /// Create a cache holding at most `max_bytes` of payload in at most
    /// `max_entries` bundles
    pub fn new(max_bytes: usize, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::unbounded(),
                bytes: 0,
            }),
            max_bytes,
            max_entries: max_entries.max(1),
            listener: None,
        }
    }

    /// Register the eviction listener
    pub fn with_listener(
        mut self,
        listener: impl Fn(&ArtifactKey, &Bundle) + Send + Sync + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Look up a bundle, marking it most recently used
    pub fn get(&self, key: &ArtifactKey) -> Option<Arc<Bundle>> {
        self.entries.lock().lru.get(key).cloned()
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.entries.lock().lru.contains(key)
    }

    /// Store a bundle, evicting least recently used entries to stay in
    /// bounds. A bundle larger than the whole budget is not retained.
    pub fn insert(&self, key: ArtifactKey, bundle: Arc<Bundle>) {
        let evicted = {
            let mut entries = self.entries.lock();
            entries.bytes += bundle.len();
            if let Some(previous) = entries.lru.put(key, bundle) {
                entries.bytes -= previous.len();
            }
            Self::evict_until(&mut entries, self.max_bytes, self.max_entries)
        };
        self.notify(evicted);
    }

    /// Drop one entry as if reclaimed under memory pressure
    pub fn reclaim(&self, key: &ArtifactKey) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            let removed = entries.lru.pop(key);
            if let Some(ref bundle) = removed {
                entries.bytes -= bundle.len();
            }
            removed
        };
        match removed {
            Some(bundle) => {
                self.notify(vec![(key.clone(), bundle)]);
                true
            }
            None => false,
        }
    }

    /// Evict least recently used entries until at most `bytes` remain.
    /// Returns the number of evicted entries.
    pub fn shrink_to(&self, bytes: usize) -> usize {
        let evicted = {
            let mut entries = self.entries.lock();
            Self::evict_until(&mut entries, bytes, self.max_entries)
        };
        let count = evicted.len();
        self.notify(evicted);
        count
    }

    /// Drop every entry belonging to one component
    pub fn reclaim_component(&self, registry: &str, component: &str) -> usize {
        self.reclaim_matching(|k| k.registry == registry && k.component == component)
    }

    /// Drop every entry belonging to one family
    pub fn reclaim_family(&self, registry: &str, family: &str) -> usize {
        self.reclaim_matching(|k| k.registry == registry && k.family == family)
    }

    /// Drop everything
    pub fn clear(&self) -> usize {
        self.reclaim_matching(|_| true)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total payload bytes currently held
    pub fn size_bytes(&self) -> usize {
        self.entries.lock().bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn reclaim_matching(&self, predicate: impl Fn(&ArtifactKey) -> bool) -> usize {
        let evicted = {
            let mut entries = self.entries.lock();
            let keys: Vec<ArtifactKey> = entries
                .lru
                .iter()
                .filter(|(k, _)| predicate(k))
                .map(|(k, _)| k.clone())
                .collect();

            let mut evicted = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(bundle) = entries.lru.pop(&key) {
                    entries.bytes -= bundle.len();
                    evicted.push((key, bundle));
                }
            }
            evicted
        };
        let count = evicted.len();
        self.notify(evicted);
        count
    }

    fn evict_until(
        entries: &mut Entries,
        max_bytes: usize,
        max_entries: usize,
    ) -> Vec<(ArtifactKey, Arc<Bundle>)> {
        let mut evicted = Vec::new();
        while entries.bytes > max_bytes || entries.lru.len() > max_entries {
            match entries.lru.pop_lru() {
                Some((key, bundle)) => {
                    entries.bytes -= bundle.len();
                    evicted.push((key, bundle));
                }
                None => break,
            }
        }
        evicted
    }

    // Runs outside the lock so listeners may call back into the cache
    fn notify(&self, evicted: Vec<(ArtifactKey, Arc<Bundle>)>) {
        for (key, bundle) in evicted {
            debug!("Evicted artifact {} ({} bytes)", key, bundle.len());
            if let Some(ref listener) = self.listener {
                listener(&key, &bundle);
            }
        }
    }
}

impl fmt::Debug for ArtifactCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactCache")
            .field("len", &self.len())
            .field("size_bytes", &self.size_bytes())
            .field("max_bytes", &self.max_bytes)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(component: &str, version: u32) -> ArtifactKey {
        ArtifactKey {
            registry: "/reg".to_string(),
            family: "fam".to_string(),
            component: component.to_string(),
            version,
        }
    }

    fn bundle(len: usize) -> Arc<Bundle> {
        Arc::new(Bundle::from_bytes(vec![7u8; len]))
    }

    #[test]
    fn byte_budget_evicts_least_recently_used() {
        let cache = ArtifactCache::new(100, 10);
        cache.insert(key("a", 1), bundle(40));
        cache.insert(key("b", 1), bundle(40));
        // Touch a so b becomes the eviction candidate
        assert!(cache.get(&key("a", 1)).is_some());
        cache.insert(key("c", 1), bundle(40));

        assert!(cache.contains(&key("a", 1)));
        assert!(!cache.contains(&key("b", 1)));
        assert!(cache.contains(&key("c", 1)));
        assert_eq!(cache.size_bytes(), 80);
    }

    #[test]
    fn entry_cap_is_enforced() {
        let cache = ArtifactCache::new(usize::MAX, 2);
        cache.insert(key("a", 1), bundle(1));
        cache.insert(key("a", 2), bundle(1));
        cache.insert(key("a", 3), bundle(1));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&key("a", 1)));
    }

    #[test]
    fn oversized_bundle_is_not_retained() {
        let cache = ArtifactCache::new(10, 10);
        cache.insert(key("big", 1), bundle(11));
        assert!(cache.is_empty());
        assert_eq!(cache.size_bytes(), 0);
    }

    #[test]
    fn replacing_an_entry_keeps_byte_count_exact() {
        let cache = ArtifactCache::new(1000, 10);
        cache.insert(key("a", 1), bundle(30));
        cache.insert(key("a", 1), bundle(50));
        assert_eq!(cache.size_bytes(), 50);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn listener_sees_every_eviction() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let cache = ArtifactCache::new(1000, 10).with_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        cache.insert(key("a", 1), bundle(10));
        cache.insert(key("a", 2), bundle(10));
        cache.insert(key("b", 1), bundle(10));

        assert!(cache.reclaim(&key("a", 1)));
        assert!(!cache.reclaim(&key("a", 1)));
        assert_eq!(cache.shrink_to(10), 1);
        assert_eq!(cache.clear(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(cache.size_bytes(), 0);
    }

    #[test]
    fn reclaim_by_component_and_family() {
        let cache = ArtifactCache::new(1000, 10);
        cache.insert(key("a", 1), bundle(1));
        cache.insert(key("a", 2), bundle(1));
        cache.insert(key("b", 1), bundle(1));

        assert_eq!(cache.reclaim_component("/reg", "a"), 2);
        assert_eq!(cache.reclaim_family("/other", "fam"), 0);
        assert_eq!(cache.reclaim_family("/reg", "fam"), 1);
        assert!(cache.is_empty());
    }
}
