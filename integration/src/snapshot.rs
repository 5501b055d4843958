//! Copy-on-read snapshot plumbing (§5 "Shared resource policy": "All other
//! shared data ... is copy-on-read: callers receive immutable snapshots and
//! may mutate their own copies").
//!
//! [`Snapshot<T>`] wraps an `Arc<T>` so handing a portfolio/weights/settings
//! view to a worker is a pointer bump, never a deep copy; the worker clones
//! out of it (`T: Clone`) only if it actually needs to mutate.
//!
//! [`WeakCache<T>`] backs the coordinator's "weak references to cached
//! `TargetWeights` and `SequenceEvaluation`" ownership rule (§3): the cache
//! holds a `Weak<T>`, so once every `Snapshot<T>` handed out for a given
//! cycle is dropped, the cached value is freed without an explicit evict.

use std::sync::{Arc, Weak};

#[derive(Debug)]
pub struct Snapshot<T>(Arc<T>);

impl<T> Snapshot<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn downgrade(&self) -> Weak<T> {
        Arc::downgrade(&self.0)
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> std::ops::Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A single-slot weak-reference cache keyed by `K`. `get` returns `None`
/// once every strong [`Snapshot<V>`] handed out for the current key has been
/// dropped — the coordinator re-derives rather than holding memory hostage
/// across cycles it no longer cares about.
#[derive(Debug, Default)]
pub struct WeakCache<K, V> {
    entry: Option<(K, Weak<V>)>,
}

impl<K: PartialEq, V> WeakCache<K, V> {
    pub fn new() -> Self {
        Self { entry: None }
    }

    pub fn get(&self, key: &K) -> Option<Snapshot<V>> {
        let (cached_key, weak) = self.entry.as_ref()?;
        if cached_key != key {
            return None;
        }
        weak.upgrade().map(Snapshot)
    }

    pub fn put(&mut self, key: K, value: &Snapshot<V>) {
        self.entry = Some((key, value.downgrade()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_clone_shares_the_same_allocation() {
        let snapshot = Snapshot::new(42u32);
        let cloned = snapshot.clone();
        assert!(Arc::ptr_eq(&snapshot.0, &cloned.0));
    }

    #[test]
    fn weak_cache_misses_once_the_last_strong_snapshot_is_dropped() {
        let mut cache: WeakCache<u64, String> = WeakCache::new();
        {
            let snapshot = Snapshot::new("weights".to_string());
            cache.put(1, &snapshot);
            assert_eq!(cache.get(&1).map(|s| s.get().clone()), Some("weights".to_string()));
        }
        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn weak_cache_misses_on_key_mismatch() {
        let mut cache: WeakCache<u64, String> = WeakCache::new();
        let snapshot = Snapshot::new("weights".to_string());
        cache.put(1, &snapshot);
        assert!(cache.get(&2).is_none());
    }
}
