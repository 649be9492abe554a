//! Full-entity read caching.
//!
//! The engine itself never populates a cache from inside the reader; the
//! store facade consults an optional [`EntityCache`] around loads and evicts
//! after every successful mutation. Real backends live outside this crate —
//! [`InMemoryCache`] is the reference implementation used by tests and
//! single-process deployments.

use facet_model::Entity;
use facet_types::EntityId;
use std::collections::HashMap;
use std::sync::Mutex;

/// A cache of fully resolved entity snapshots, keyed by
/// `"<entity-type>:<id>"`.
pub trait EntityCache: Send + Sync {
    /// Returns the cached snapshot, if any.
    fn get(&self, key: &str) -> Option<Entity>;

    /// Stores a snapshot.
    fn put(&self, key: &str, entity: &Entity);

    /// Evicts a key. Evicting an absent key is a no-op.
    fn remove(&self, key: &str);
}

/// Builds the namespace-qualified cache key for an entity.
pub fn cache_key(namespace: &str, id: EntityId) -> String {
    format!("{namespace}:{id}")
}

/// Evicts the cache entries for a list of entity ids.
pub fn invalidate(cache: &dyn EntityCache, namespace: &str, ids: &[EntityId]) {
    for id in ids {
        cache.remove(&cache_key(namespace, *id));
    }
}

/// Process-local cache backed by a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entity>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached snapshots.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Entity> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn put(&self, key: &str, entity: &Entity) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), entity.clone());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}
