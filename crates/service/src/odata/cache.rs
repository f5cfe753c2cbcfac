//! List-result cache keyed by (entity, generation, canonical query, user).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use configs::CacheConfig;
use dashmap::DashMap;
use moka::future::Cache;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{EntitySet, ODataQuery};
use crate::errors::ServiceError;
use crate::metrics::{QUERY_CACHE_HITS, QUERY_CACHE_MISSES};
use crate::pagination::Page;

pub type CachedPage = Arc<Page<Value>>;

/// Writes bump a per-entity generation instead of scanning keys; stale
/// entries become unreachable and age out through the TTL.
pub struct QueryCache {
    entries: Option<Cache<String, CachedPage>>,
    generations: DashMap<EntitySet, u64>,
}

impl QueryCache {
    pub fn new(cfg: &CacheConfig) -> Self {
        let entries = cfg.enabled.then(|| {
            Cache::builder()
                .max_capacity(cfg.max_entries)
                .time_to_live(Duration::from_secs(cfg.ttl_secs))
                .build()
        });
        Self { entries, generations: DashMap::new() }
    }

    pub fn disabled() -> Self { Self { entries: None, generations: DashMap::new() } }

    pub fn generation(&self, set: EntitySet) -> u64 {
        self.generations.get(&set).map(|g| *g).unwrap_or(0)
    }

    pub fn key(&self, set: EntitySet, query: &ODataQuery, user: Uuid) -> String {
        format!("{}|{}|{}|{}", set.name(), self.generation(set), query.canonical(), user)
    }

    /// Return the cached page or run `load` and remember its result.
    /// Errors are never cached.
    pub async fn get_or_load<F, Fut>(
        &self,
        set: EntitySet,
        query: &ODataQuery,
        user: Uuid,
        load: F,
    ) -> Result<CachedPage, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Page<Value>, ServiceError>>,
    {
        let Some(entries) = &self.entries else {
            QUERY_CACHE_MISSES.inc();
            return load().await.map(Arc::new);
        };
        // generation is read before loading so a concurrent write cannot be masked
        let key = self.key(set, query, user);
        if let Some(hit) = entries.get(&key).await {
            QUERY_CACHE_HITS.inc();
            debug!(%key, "query_cache_hit");
            return Ok(hit);
        }
        QUERY_CACHE_MISSES.inc();
        let page = Arc::new(load().await?);
        entries.insert(key, page.clone()).await;
        Ok(page)
    }

    /// Make cached lists stale for `written` and every set that embeds it.
    pub fn invalidate(&self, written: EntitySet) {
        for set in written.invalidates() {
            *self.generations.entry(*set).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configs::ODataConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn query(pairs: &[(&str, &str)]) -> ODataQuery {
        ODataQuery::parse(pairs.iter().copied(), &ODataConfig::default()).unwrap()
    }

    async fn load_counting(calls: &AtomicUsize) -> Result<Page<Value>, ServiceError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Page::new(vec![Value::from(1)], 1, 20, 0))
    }

    #[tokio::test]
    async fn equivalent_queries_share_entry() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let user = Uuid::new_v4();
        let a = query(&[("$filter", "name eq 'x'"), ("$top", "5")]);
        let b = query(&[("$top", "5"), ("$filter", "Name  eq 'x'")]);
        cache.get_or_load(EntitySet::Products, &a, user, || load_counting(&calls)).await.unwrap();
        cache.get_or_load(EntitySet::Products, &b, user, || load_counting(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn users_do_not_share_entries() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let q = query(&[]);
        cache.get_or_load(EntitySet::Products, &q, Uuid::new_v4(), || load_counting(&calls)).await.unwrap();
        cache.get_or_load(EntitySet::Products, &q, Uuid::new_v4(), || load_counting(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn writes_invalidate_dependents() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = AtomicUsize::new(0);
        let user = Uuid::new_v4();
        let q = query(&[]);
        cache.get_or_load(EntitySet::Products, &q, user, || load_counting(&calls)).await.unwrap();
        cache.invalidate(EntitySet::Categories);
        cache.get_or_load(EntitySet::Products, &q, user, || load_counting(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.generation(EntitySet::Products), 1);
        assert_eq!(cache.generation(EntitySet::Sales), 0);
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = QueryCache::disabled();
        let calls = AtomicUsize::new(0);
        let q = query(&[]);
        let user = Uuid::new_v4();
        for _ in 0..3 {
            cache.get_or_load(EntitySet::Taxes, &q, user, || load_counting(&calls)).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = QueryCache::new(&CacheConfig::default());
        let q = query(&[]);
        let user = Uuid::new_v4();
        let err = cache
            .get_or_load(EntitySet::Taxes, &q, user, || async { Err(ServiceError::Db("down".into())) })
            .await;
        assert!(err.is_err());
        let calls = AtomicUsize::new(0);
        cache.get_or_load(EntitySet::Taxes, &q, user, || load_counting(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
