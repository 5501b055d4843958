//! The `(PortfolioHash, OptimizerSettingsHash) -> TargetWeights` cache
//! (§4.6 "cache with the portfolio hash") and the ownership rule from the
//! data model (§3 "Ownership": "The Coordinator holds weak references to
//! cached `TargetWeights`").
//!
//! Built on [`glidepath_integration::WeakCache`]: the cache entry is only
//! as alive as the last [`Snapshot`] a caller is still holding, plus a TTL
//! so a cycle never reuses weights older than `cache_ttl` even while a
//! `Snapshot` of them is still pinned somewhere.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use glidepath_core::hash::{OptimizerSettingsHash, PortfolioHash};
use glidepath_core::weights::TargetWeights;
use glidepath_integration::{Snapshot, WeakCache};

pub type CacheKey = (PortfolioHash, OptimizerSettingsHash);

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub weights: TargetWeights,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct WeightsCache {
    inner: WeakCache<CacheKey, CacheEntry>,
    ttl: ChronoDuration,
}

impl WeightsCache {
    pub fn new(ttl: ChronoDuration) -> Self {
        Self {
            inner: WeakCache::new(),
            ttl,
        }
    }

    /// `None` on a cold cache, a key mismatch, every prior `Snapshot`
    /// already dropped, or the cached entry having aged past `ttl`.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Snapshot<CacheEntry>> {
        let snapshot = self.inner.get(key)?;
        if now.signed_duration_since(snapshot.computed_at) > self.ttl {
            return None;
        }
        Some(snapshot)
    }

    pub fn put(&mut self, key: CacheKey, weights: TargetWeights, now: DateTime<Utc>) -> Snapshot<CacheEntry> {
        let snapshot = Snapshot::new(CacheEntry {
            weights,
            computed_at: now,
        });
        self.inner.put(key, &snapshot);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glidepath_core::weights::FallbackStrategy;
    use indexmap::IndexMap;

    fn key(seed: u8) -> CacheKey {
        (PortfolioHash([seed; 32]), OptimizerSettingsHash([seed; 32]))
    }

    fn weights() -> TargetWeights {
        TargetWeights {
            weights: IndexMap::new(),
            achieved_expected_return: 0.1,
            blend_used: 0.0,
            fallback_used: FallbackStrategy::EfficientReturn,
            attempts: 1,
            highly_correlated: vec![],
        }
    }

    #[test]
    fn a_fresh_entry_is_returned_within_ttl() {
        let mut cache = WeightsCache::new(ChronoDuration::hours(1));
        let now = Utc::now();
        let inserted = cache.put(key(1), weights(), now);
        let fetched = cache.get(&key(1), now + ChronoDuration::minutes(10)).unwrap();
        assert_eq!(fetched.computed_at, inserted.computed_at);
    }

    #[test]
    fn an_entry_older_than_ttl_is_a_miss() {
        let mut cache = WeightsCache::new(ChronoDuration::hours(1));
        let now = Utc::now();
        let _snapshot = cache.put(key(1), weights(), now);
        assert!(cache.get(&key(1), now + ChronoDuration::hours(2)).is_none());
    }

    #[test]
    fn a_different_key_is_a_miss() {
        let mut cache = WeightsCache::new(ChronoDuration::hours(1));
        let now = Utc::now();
        let _snapshot = cache.put(key(1), weights(), now);
        assert!(cache.get(&key(2), now).is_none());
    }
}
