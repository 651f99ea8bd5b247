//! Target cache
//!
//! Holds resolved targets under client-chosen correlation ids so later
//! descriptors can refer to them without re-resolving their parent chain.
//! Entries live until they are disposed; there is no expiry.

use dashmap::DashMap;
use tether_sdk::Value;
use tracing::trace;

/// Concurrent map from correlation id to resolved target
#[derive(Debug, Default)]
pub struct TargetCache {
    entries: DashMap<String, Value>,
}

impl TargetCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a target
    pub fn get(&self, id: &str) -> Option<Value> {
        let hit = self.entries.get(id).map(|entry| entry.value().clone());
        trace!(id, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Store a target, replacing any previous entry
    pub fn put(&self, id: impl Into<String>, value: Value) {
        self.entries.insert(id.into(), value);
    }

    /// Remove a target; returns it if it was present
    pub fn remove(&self, id: &str) -> Option<Value> {
        self.entries.remove(id).map(|(_, value)| value)
    }

    /// Check if an id is cached
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of cached targets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_put_get_remove() {
        let cache = TargetCache::new();
        assert!(cache.is_empty());

        cache.put("a", Value::Int(1));
        cache.put("a", Value::Int(2));
        assert_eq!(cache.get("a"), Some(Value::Int(2)));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.remove("a"), Some(Value::Int(2)));
        assert_eq!(cache.remove("a"), None);
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_clear() {
        let cache = TargetCache::new();
        cache.put("a", Value::Null);
        cache.put("b", Value::Null);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_puts() {
        let cache = Arc::new(TargetCache::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.put(format!("{}-{}", t, i), Value::Int(i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
        assert_eq!(cache.get("7-99"), Some(Value::Int(99)));
    }
}
