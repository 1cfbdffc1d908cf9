//! In-process cache for product search results.
//!
//! Search (`GET /products?q=`) is the hottest read path and tolerates
//! slightly stale data, so results are cached per normalized query for a
//! short TTL. Catalog writes call [`SearchCache::invalidate_all`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::models::ProductSummary;

const MAX_ENTRIES: u64 = 1_000;
const TTL: Duration = Duration::from_secs(60);

/// TTL cache keyed by normalized search query.
#[derive(Clone)]
pub struct SearchCache {
    inner: Cache<String, Arc<Vec<ProductSummary>>>,
}

impl SearchCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(TTL)
                .build(),
        }
    }

    /// Normalize a query so "Dolo 650" and " dolo  650 " share an entry.
    fn key(query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    pub async fn get(&self, query: &str) -> Option<Arc<Vec<ProductSummary>>> {
        self.inner.get(&Self::key(query)).await
    }

    pub async fn insert(&self, query: &str, results: Vec<ProductSummary>) -> Arc<Vec<ProductSummary>> {
        let results = Arc::new(results);
        self.inner.insert(Self::key(query), Arc::clone(&results)).await;
        results
    }

    /// Drop every cached query. Called after any catalog write.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use medbasket_core::ProductId;

    fn summary(name: &str) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(1),
            name: name.to_string(),
            slug: name.to_lowercase(),
            price: Decimal::from(99),
            mrp: Decimal::from(120),
            stock: 5,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_hit_after_insert() {
        let cache = SearchCache::new();
        cache.insert("dolo", vec![summary("Dolo 650")]).await;
        let hit = cache.get("dolo").await;
        assert!(hit.is_some_and(|v| v.len() == 1));
    }

    #[tokio::test]
    async fn test_key_normalization() {
        let cache = SearchCache::new();
        cache.insert("Dolo  650", vec![summary("Dolo 650")]).await;
        assert!(cache.get("  dolo 650 ").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let cache = SearchCache::new();
        cache.insert("dolo", vec![summary("Dolo 650")]).await;
        cache.invalidate_all();
        // moka invalidation is applied lazily but reads observe it immediately
        assert!(cache.get("dolo").await.is_none());
    }
}
