//! # Read Cache
//!
//! Short-lived cache for product and customer reads, so scanning the same
//! item twice does not refetch it.
//!
//! ## Invalidation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   entry older than ttl ──────────────► treated as missing              │
//! │                                                                         │
//! │   sale CONFIRMED ──► CacheScope ──► invalidate_scope()                 │
//! │                        ├── every product on the sale (stock moved)      │
//! │                        ├── the customer, if any (balance moved)         │
//! │                        └── the recent-activity feed                     │
//! │                                                                         │
//! │   Rejected or failed sales never touch the cache.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use stockdesk_core::{CacheScope, CustomerCredit, CustomerId, ProductId, ProductSnapshot};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::api::SaleSummary;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Product(ProductId),
    Customer(CustomerId),
    RecentActivity,
}

#[derive(Debug, Clone)]
pub enum CachedValue {
    Product(ProductSnapshot),
    Customer(CustomerCredit),
    /// Feed fetched for `limit` entries.
    RecentActivity { limit: usize, sales: Vec<SaleSummary> },
}

#[derive(Debug, Clone)]
struct CachedEntry {
    value: CachedValue,
    stored_at: Instant,
}

/// TTL cache shared by the desk's reads. Cloning shares the same storage.
#[derive(Debug, Clone)]
pub struct ReadCache {
    entries: Arc<RwLock<HashMap<CacheKey, CachedEntry>>>,
    ttl: Duration,
}

impl ReadCache {
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        ReadCache {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: CacheKey, value: CachedValue) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CachedEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub async fn product(&self, id: &ProductId) -> Option<ProductSnapshot> {
        match self.get(&CacheKey::Product(id.clone())).await {
            Some(CachedValue::Product(product)) => Some(product),
            _ => None,
        }
    }

    pub async fn customer(&self, id: &CustomerId) -> Option<CustomerCredit> {
        match self.get(&CacheKey::Customer(id.clone())).await {
            Some(CachedValue::Customer(customer)) => Some(customer),
            _ => None,
        }
    }

    /// The cached feed, if it was fetched for at least `limit` entries.
    pub async fn recent_activity(&self, limit: usize) -> Option<Vec<SaleSummary>> {
        match self.get(&CacheKey::RecentActivity).await {
            Some(CachedValue::RecentActivity { limit: fetched, mut sales }) if fetched >= limit => {
                sales.truncate(limit);
                Some(sales)
            }
            _ => None,
        }
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        self.entries.write().await.remove(key);
    }

    /// Drops everything a confirmed sale made stale.
    pub async fn invalidate_scope(&self, scope: &CacheScope) {
        let mut entries = self.entries.write().await;
        for id in &scope.products {
            entries.remove(&CacheKey::Product(id.clone()));
        }
        if let Some(customer) = &scope.customer {
            entries.remove(&CacheKey::Customer(customer.clone()));
        }
        if scope.recent_activity {
            entries.remove(&CacheKey::RecentActivity);
        }
        debug!(
            products = scope.products.len(),
            customer = scope.customer.is_some(),
            "Read cache invalidated after sale"
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdesk_core::Money;

    fn product(id: &str) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {}", id),
            sku: None,
            unit_price: Money::from_cents(100),
            available_stock: 3,
            reorder_point: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = ReadCache::new(Duration::from_secs(60));
        cache
            .insert(CacheKey::Product(ProductId::new("1")), CachedValue::Product(product("1")))
            .await;
        assert_eq!(cache.product(&ProductId::new("1")).await, Some(product("1")));
        assert_eq!(cache.product(&ProductId::new("2")).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = ReadCache::new(Duration::from_secs(60));
        cache
            .insert(CacheKey::Product(ProductId::new("1")), CachedValue::Product(product("1")))
            .await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.product(&ProductId::new("1")).await, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let cache = ReadCache::new(Duration::ZERO);
        cache
            .insert(CacheKey::Product(ProductId::new("1")), CachedValue::Product(product("1")))
            .await;
        assert!(cache.is_empty().await);
    }

    fn summary(id: &str) -> SaleSummary {
        SaleSummary {
            id: stockdesk_core::SaleId::new(id),
            total_amount: Money::from_cents(1000),
            payment_status: stockdesk_core::PaymentStatus::Paid,
            customer_name: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_recent_activity_served_only_for_shorter_requests() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let sales: Vec<_> = (1..=5).map(|i| summary(&i.to_string())).collect();
        cache
            .insert(
                CacheKey::RecentActivity,
                CachedValue::RecentActivity { limit: 5, sales },
            )
            .await;

        assert_eq!(cache.recent_activity(2).await.map(|s| s.len()), Some(2));
        assert_eq!(cache.recent_activity(5).await.map(|s| s.len()), Some(5));
        assert!(cache.recent_activity(6).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_single_key() {
        let cache = ReadCache::new(Duration::from_secs(60));
        cache
            .insert(CacheKey::Product(ProductId::new("1")), CachedValue::Product(product("1")))
            .await;
        cache.invalidate(&CacheKey::Product(ProductId::new("1"))).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_scope_only_touches_sold_entries() {
        let cache = ReadCache::new(Duration::from_secs(60));
        for id in ["1", "2", "3"] {
            cache
                .insert(CacheKey::Product(ProductId::new(id)), CachedValue::Product(product(id)))
                .await;
        }
        cache
            .insert(
                CacheKey::RecentActivity,
                CachedValue::RecentActivity {
                    limit: 10,
                    sales: Vec::new(),
                },
            )
            .await;

        cache
            .invalidate_scope(&CacheScope {
                products: vec![ProductId::new("1"), ProductId::new("3")],
                customer: None,
                recent_activity: true,
            })
            .await;

        assert_eq!(cache.len().await, 1);
        assert!(cache.product(&ProductId::new("2")).await.is_some());
        assert!(cache.recent_activity(10).await.is_none());
    }
}
