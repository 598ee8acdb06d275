//! # Sale Desk
//!
//! Drives one sale-entry session end to end: catalog reads, cart edits,
//! submission, the override prompt and post-sale cache invalidation.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  add_product ──► ReadCache / CatalogService ──► Cart::add_line         │
//! │  set_quantity / remove / discounts ───────────► Cart                   │
//! │  select_customer ──► credit view (cached, for display)                 │
//! │                                                                         │
//! │  submit()                                                               │
//! │    1. credit sale? read a FRESH credit view                             │
//! │    2. SaleSession::begin_submit (local preconditions)                   │
//! │    3. SalesService::create_sale                                         │
//! │    4. SaleSession::resolve                                              │
//! │         ├── Completed      → cart cleared, caches invalidated           │
//! │         ├── NeedsOverride  → override_warning() or abandon_warning()    │
//! │         └── Failed         → cart kept, acknowledge() to dismiss        │
//! │                                                                         │
//! │  Methods take `&mut self`, so no edit can interleave with a send.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use stockdesk_core::validation::validate_product_id;
use stockdesk_core::{
    Capability, Cart, CartError, CartTotals, CustomerCredit, CustomerId, FailureReason, Money,
    OutlierWarning, PaymentClassification, PreconditionError, ProductId, ProductSnapshot,
    Rejection, SaleReceipt, SaleSession, StockLevel, SubmissionOutcome, SubmissionState,
    Transition, DEFAULT_LOW_STOCK_THRESHOLD,
};
use tracing::{debug, info, warn};

use crate::api::{CatalogService, SaleSummary, SalesService};
use crate::cache::{CacheKey, CachedValue, ReadCache};
use crate::error::ClientResult;
use crate::session::Session;

/// How a submit (or override) ended, as the desk reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskOutcome {
    Completed(SaleReceipt),
    /// Price outlier: ask the user to override or abandon.
    NeedsOverride(OutlierWarning),
    Failed(FailureReason),
}

/// A product just put in the cart, with its stock status.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedProduct {
    pub product: ProductSnapshot,
    pub stock_level: StockLevel,
    pub totals: CartTotals,
}

pub struct SaleDesk<S, C> {
    sales: S,
    catalog: C,
    session: Session,
    cache: ReadCache,
    sale: SaleSession,
    customer_view: Option<CustomerCredit>,
    low_stock_threshold: i64,
}

impl<S, C> SaleDesk<S, C>
where
    S: SalesService,
    C: CatalogService,
{
    /// Opens a desk for a user allowed to record sales.
    pub fn new(sales: S, catalog: C, session: Session, cache: ReadCache) -> ClientResult<Self> {
        session.require(Capability::RecordSales)?;
        info!(user = %session.user().username, role = %session.user().role, "Sale desk opened");

        Ok(SaleDesk {
            sales,
            catalog,
            session,
            cache,
            sale: SaleSession::new(),
            customer_view: None,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        })
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn cart(&self) -> &Cart {
        self.sale.cart()
    }

    pub fn state(&self) -> &SubmissionState {
        self.sale.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn totals(&self) -> CartTotals {
        self.sale.cart().totals()
    }

    /// Credit view of the selected customer, as last read.
    pub fn customer_view(&self) -> Option<&CustomerCredit> {
        self.customer_view.as_ref()
    }

    /// Product from the cache, else from the catalog.
    pub async fn product(&self, id: &ProductId) -> ClientResult<ProductSnapshot> {
        if let Some(product) = self.cache.product(id).await {
            debug!(product_id = %id, "Product served from cache");
            return Ok(product);
        }

        let product = self.catalog.fetch_product(&self.session, id).await?;
        self.cache
            .insert(CacheKey::Product(id.clone()), CachedValue::Product(product.clone()))
            .await;
        Ok(product)
    }

    async fn customer_credit(&self, id: &CustomerId) -> ClientResult<CustomerCredit> {
        if let Some(customer) = self.cache.customer(id).await {
            return Ok(customer);
        }

        let customer = self.catalog.fetch_customer_credit(&self.session, id).await?;
        self.cache
            .insert(CacheKey::Customer(id.clone()), CachedValue::Customer(customer.clone()))
            .await;
        Ok(customer)
    }

    /// Recent-activity feed, cached until the next confirmed sale.
    ///
    /// A cached feed only answers requests no longer than the one it was
    /// fetched for.
    pub async fn recent_sales(&self, limit: usize) -> ClientResult<Vec<SaleSummary>> {
        self.session.require(Capability::ViewSales)?;

        if let Some(sales) = self.cache.recent_activity(limit).await {
            return Ok(sales);
        }

        let sales = self.catalog.fetch_recent_sales(&self.session, limit).await?;
        self.cache
            .insert(
                CacheKey::RecentActivity,
                CachedValue::RecentActivity {
                    limit,
                    sales: sales.clone(),
                },
            )
            .await;
        Ok(sales)
    }

    // =========================================================================
    // Cart Edits
    // =========================================================================

    /// Adds `quantity` of a product, fetching it if it is not cached.
    pub async fn add_product(&mut self, id: &ProductId, quantity: u32) -> ClientResult<AddedProduct> {
        debug!(product_id = %id, quantity, "add_product");

        // Refuse before any network call if the cart is locked or the id is blank
        self.sale.cart_mut()?;
        validate_product_id(id.as_str()).map_err(CartError::from)?;

        let product = self.product(id).await?;
        self.sale.cart_mut()?.add_line(&product, quantity)?;

        Ok(AddedProduct {
            stock_level: product.stock_level(self.low_stock_threshold),
            product,
            totals: self.totals(),
        })
    }

    pub fn set_quantity(&mut self, id: &ProductId, quantity: i64) -> ClientResult<CartTotals> {
        debug!(product_id = %id, quantity, "set_quantity");
        self.sale.cart_mut()?.set_line_quantity(id, quantity)?;
        Ok(self.totals())
    }

    pub fn remove(&mut self, id: &ProductId) -> ClientResult<CartTotals> {
        debug!(product_id = %id, "remove");
        self.sale.cart_mut()?.remove_line(id)?;
        Ok(self.totals())
    }

    pub fn set_discount_amount(&mut self, amount: Money) -> ClientResult<CartTotals> {
        debug!(amount = %amount, "set_discount_amount");
        self.sale.cart_mut()?.set_discount_amount(amount);
        Ok(self.totals())
    }

    pub fn set_discount_percent(&mut self, percent: Decimal) -> ClientResult<CartTotals> {
        debug!(percent = %percent, "set_discount_percent");
        self.sale.cart_mut()?.set_discount_percent(percent);
        Ok(self.totals())
    }

    /// Selects (or clears) the customer and reads their credit view.
    pub async fn select_customer(
        &mut self,
        customer: Option<CustomerId>,
    ) -> ClientResult<Option<CustomerCredit>> {
        self.sale.cart_mut()?;

        let view = match &customer {
            Some(id) => Some(self.customer_credit(id).await?),
            None => None,
        };

        self.sale.cart_mut()?.select_customer(customer);
        self.customer_view = view.clone();
        Ok(view)
    }

    pub fn choose_payment(&mut self, payment: PaymentClassification) -> ClientResult<()> {
        debug!(payment = %payment, "choose_payment");
        self.sale.cart_mut()?.choose_payment(payment);
        Ok(())
    }

    pub fn set_upfront_payment(&mut self, amount: Money) -> ClientResult<()> {
        self.sale.cart_mut()?.set_upfront_payment(amount)?;
        Ok(())
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Checks preconditions and sends the sale.
    pub async fn submit(&mut self) -> ClientResult<DeskOutcome> {
        if self.sale.state().locks_cart() {
            return Err(PreconditionError::NotIdle {
                state: self.sale.state().name(),
            }
            .into());
        }

        // Credit limits are checked against a fresh read, never the cache
        let credit = match (self.cart().payment(), self.cart().customer()) {
            (Some(PaymentClassification::Credit), Some(id)) => {
                let id = id.clone();
                let view = self.catalog.fetch_customer_credit(&self.session, &id).await?;
                self.customer_view = Some(view.clone());
                Some(view)
            }
            _ => None,
        };

        let payload = self.sale.begin_submit(credit.as_ref())?;
        info!(
            items = payload.items.len(),
            total = %payload.total_amount,
            payment = %payload.payment_method,
            "Submitting sale"
        );

        let outcome = self.sales.create_sale(&self.session, &payload).await;
        self.apply(outcome).await
    }

    /// Resends the rejected payload with the override flag.
    pub async fn override_warning(&mut self) -> ClientResult<DeskOutcome> {
        let payload = self.sale.confirm_override()?;
        info!(total = %payload.total_amount, "Resubmitting sale with override");

        let outcome = self.sales.create_sale(&self.session, &payload).await;
        self.apply(outcome).await
    }

    /// Drops the warning and keeps the cart for editing.
    pub fn abandon_warning(&mut self) -> ClientResult<()> {
        self.sale.abandon_warning()?;
        debug!("Outlier warning abandoned, cart kept");
        Ok(())
    }

    /// Dismisses a success or failure and returns to idle.
    pub fn acknowledge(&mut self) -> ClientResult<()> {
        self.sale.acknowledge()?;
        Ok(())
    }

    /// Throws the current sale away.
    pub fn cancel(&mut self) -> ClientResult<()> {
        self.sale.cancel()?;
        self.customer_view = None;
        info!("Sale cancelled");
        Ok(())
    }

    async fn apply(&mut self, outcome: SubmissionOutcome) -> ClientResult<DeskOutcome> {
        match self.sale.resolve(outcome)? {
            Transition::Succeeded {
                receipt,
                invalidate,
            } => {
                self.cache.invalidate_scope(&invalidate).await;
                self.customer_view = None;
                info!(
                    sale_id = ?receipt.id,
                    total = ?receipt.total_amount,
                    "Sale created"
                );
                Ok(DeskOutcome::Completed(receipt))
            }
            Transition::Warning(warning) => {
                warn!(
                    product_id = ?warning.product_id,
                    range = ?warning.typical_range,
                    "Sale needs price override"
                );
                Ok(DeskOutcome::NeedsOverride(warning))
            }
            Transition::Failed(reason) => {
                warn!(reason = %reason, "Sale failed, cart kept");
                if matches!(reason, FailureReason::Rejected(Rejection::Hard { .. })) {
                    self.refresh_cart_stock().await;
                }
                Ok(DeskOutcome::Failed(reason))
            }
        }
    }

    /// Refetches every product in the cart so corrections after a server
    /// refusal are checked against current stock, not the figures read
    /// when the lines were added.
    async fn refresh_cart_stock(&mut self) {
        let ids: Vec<ProductId> = self
            .cart()
            .lines()
            .iter()
            .map(|line| line.product_id.clone())
            .collect();

        for id in ids {
            self.cache.invalidate(&CacheKey::Product(id.clone())).await;

            let refreshed = match self.product(&id).await {
                Ok(product) => self
                    .sale
                    .cart_mut()
                    .and_then(|cart| cart.refresh_stock(&id, product.available_stock))
                    .map_err(Into::into),
                Err(e) => Err(e),
            };
            if let Err(e) = refreshed {
                warn!(product_id = %id, error = %e, "Could not refresh stock");
            }
        }

        let over_stock = self.cart().over_stock_lines().count();
        if over_stock > 0 {
            info!(lines = over_stock, "Cart lines exceed current stock");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::session::UserProfile;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use stockdesk_core::{PaymentStatus, PriceRange, Role, SaleId, SalePayload};
    use url::Url;

    // -------------------------------------------------------------------------
    // Fakes
    // -------------------------------------------------------------------------

    #[derive(Clone, Default)]
    struct FakeSales {
        outcomes: Arc<Mutex<VecDeque<SubmissionOutcome>>>,
        sent: Arc<Mutex<Vec<SalePayload>>>,
    }

    impl FakeSales {
        fn answering(outcomes: Vec<SubmissionOutcome>) -> Self {
            FakeSales {
                outcomes: Arc::new(Mutex::new(outcomes.into())),
                sent: Arc::default(),
            }
        }

        fn sent(&self) -> Vec<SalePayload> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SalesService for FakeSales {
        async fn create_sale(&self, _session: &Session, payload: &SalePayload) -> SubmissionOutcome {
            self.sent.lock().unwrap().push(payload.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| SubmissionOutcome::Transport("no scripted answer".into()))
        }
    }

    #[derive(Clone, Default)]
    struct FakeCatalog {
        products: Arc<Mutex<HashMap<ProductId, ProductSnapshot>>>,
        customers: Arc<Mutex<HashMap<CustomerId, CustomerCredit>>>,
        recent: Arc<Mutex<Vec<SaleSummary>>>,
        product_reads: Arc<AtomicUsize>,
        customer_reads: Arc<AtomicUsize>,
        recent_reads: Arc<AtomicUsize>,
    }

    impl FakeCatalog {
        fn with_product(self, id: &str, price: Decimal, stock: i64) -> Self {
            self.products.lock().unwrap().insert(
                ProductId::new(id),
                ProductSnapshot {
                    id: ProductId::new(id),
                    name: format!("Product {}", id),
                    sku: None,
                    unit_price: Money::new(price),
                    available_stock: stock,
                    reorder_point: None,
                },
            );
            self
        }

        fn with_customer(self, id: &str, limit: Decimal, balance: Decimal) -> Self {
            self.customers.lock().unwrap().insert(
                CustomerId::new(id),
                CustomerCredit {
                    id: CustomerId::new(id),
                    name: "Amina".into(),
                    credit_limit: Money::new(limit),
                    current_balance: Money::new(balance),
                },
            );
            self
        }

        fn with_recent_sales(self, count: usize) -> Self {
            *self.recent.lock().unwrap() = (1..=count)
                .map(|i| SaleSummary {
                    id: SaleId::new(i.to_string()),
                    total_amount: Money::new(dec!(10)),
                    payment_status: PaymentStatus::Paid,
                    customer_name: None,
                    created_at: None,
                })
                .collect();
            self
        }

        fn set_stock(&self, id: &str, stock: i64) {
            if let Some(p) = self.products.lock().unwrap().get_mut(&ProductId::new(id)) {
                p.available_stock = stock;
            }
        }

        fn set_balance(&self, id: &str, balance: Decimal) {
            if let Some(c) = self.customers.lock().unwrap().get_mut(&CustomerId::new(id)) {
                c.current_balance = Money::new(balance);
            }
        }
    }

    #[async_trait]
    impl CatalogService for FakeCatalog {
        async fn fetch_product(&self, _session: &Session, id: &ProductId) -> ClientResult<ProductSnapshot> {
            self.product_reads.fetch_add(1, Ordering::SeqCst);
            self.products
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound {
                    entity: "Product",
                    id: id.to_string(),
                })
        }

        async fn fetch_customer_credit(
            &self,
            _session: &Session,
            id: &CustomerId,
        ) -> ClientResult<CustomerCredit> {
            self.customer_reads.fetch_add(1, Ordering::SeqCst);
            self.customers
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound {
                    entity: "Customer",
                    id: id.to_string(),
                })
        }

        async fn fetch_recent_sales(&self, _session: &Session, limit: usize) -> ClientResult<Vec<SaleSummary>> {
            self.recent_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.recent.lock().unwrap().iter().take(limit).cloned().collect())
        }
    }

    fn session() -> Session {
        Session::new(
            Url::parse("http://localhost/api/").unwrap(),
            Some("token".into()),
            UserProfile {
                username: "cashier".into(),
                role: Role::Staff,
            },
        )
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog::default()
            .with_product("P1", dec!(50), 10)
            .with_product("P2", dec!(30), 10)
    }

    fn desk(sales: FakeSales, catalog: FakeCatalog) -> SaleDesk<FakeSales, FakeCatalog> {
        SaleDesk::new(sales, catalog, session(), ReadCache::new(Duration::from_secs(60))).unwrap()
    }

    fn outlier() -> SubmissionOutcome {
        SubmissionOutcome::Rejected(Rejection::PriceOutlier(OutlierWarning {
            message: "Unit price is unusual".into(),
            product_id: Some(ProductId::new("P1")),
            typical_range: Some(PriceRange {
                min: Money::new(dec!(60)),
                max: Money::new(dec!(80)),
            }),
        }))
    }

    fn accepted() -> SubmissionOutcome {
        SubmissionOutcome::Accepted(SaleReceipt {
            id: Some(SaleId::new("501")),
            total_amount: Some(Money::new(dec!(120))),
            created_at: None,
        })
    }

    /// `[{P1, 2 × 50}, {P2, 1 × 30}]`, discount 10, cash.
    async fn fill(desk: &mut SaleDesk<FakeSales, FakeCatalog>) {
        desk.add_product(&ProductId::new("P1"), 2).await.unwrap();
        desk.add_product(&ProductId::new("P2"), 1).await.unwrap();
        desk.set_discount_amount(Money::new(dec!(10))).unwrap();
        desk.choose_payment(PaymentClassification::Cash).unwrap();
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_product_uses_cache() {
        let catalog = catalog();
        let mut desk = desk(FakeSales::default(), catalog.clone());

        desk.add_product(&ProductId::new("P1"), 1).await.unwrap();
        let added = desk.add_product(&ProductId::new("P1"), 1).await.unwrap();

        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), 1);
        assert_eq!(desk.cart().lines()[0].quantity, 2);
        assert_eq!(added.totals.subtotal, Money::new(dec!(100)));
        assert_eq!(added.stock_level, StockLevel::InStock);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let mut desk = desk(FakeSales::default(), catalog());
        let err = desk.add_product(&ProductId::new("nope"), 1).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound { entity: "Product", .. }));
        assert!(desk.cart().is_empty());
    }

    #[tokio::test]
    async fn test_outlier_then_override_completes_with_same_total() {
        let sales = FakeSales::answering(vec![outlier(), accepted()]);
        let mut desk = desk(sales.clone(), catalog());
        fill(&mut desk).await;
        assert_eq!(desk.totals().total, Money::new(dec!(120)));

        let outcome = desk.submit().await.unwrap();
        assert!(matches!(outcome, DeskOutcome::NeedsOverride(_)));

        let outcome = desk.override_warning().await.unwrap();
        assert!(matches!(outcome, DeskOutcome::Completed(_)));

        let sent = sales.sent();
        assert_eq!(sent.len(), 2);
        assert!(!sent[0].force);
        assert!(sent[1].force);
        assert_eq!(sent[1].total_amount, Money::new(dec!(120)));
        assert_eq!(sent[1].items, sent[0].items);
        assert!(desk.cart().is_empty());
    }

    #[tokio::test]
    async fn test_cart_locked_while_awaiting_override() {
        let sales = FakeSales::answering(vec![outlier()]);
        let catalog = catalog();
        let mut desk = desk(sales, catalog.clone());
        fill(&mut desk).await;
        desk.submit().await.unwrap();

        let reads = catalog.product_reads.load(Ordering::SeqCst);
        let err = desk.add_product(&ProductId::new("P2"), 1).await.unwrap_err();
        assert!(matches!(err, ClientError::Cart(CartError::Locked)));
        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), reads);
        assert!(desk.set_quantity(&ProductId::new("P1"), 1).is_err());

        desk.abandon_warning().unwrap();
        assert_eq!(desk.cart().item_count(), 2);
        desk.set_quantity(&ProductId::new("P1"), 1).unwrap();
    }

    #[tokio::test]
    async fn test_success_invalidates_sold_products() {
        let sales = FakeSales::answering(vec![accepted()]);
        let catalog = catalog();
        let mut desk = desk(sales, catalog.clone());
        fill(&mut desk).await;
        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), 2);

        desk.submit().await.unwrap();
        desk.acknowledge().unwrap();

        desk.add_product(&ProductId::new("P1"), 1).await.unwrap();
        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_cart_and_cache() {
        let sales = FakeSales::answering(vec![SubmissionOutcome::Transport("timed out".into())]);
        let catalog = catalog();
        let mut desk = desk(sales.clone(), catalog.clone());
        fill(&mut desk).await;

        let outcome = desk.submit().await.unwrap();
        assert_eq!(
            outcome,
            DeskOutcome::Failed(FailureReason::Transport("timed out".into()))
        );
        assert_eq!(desk.cart().item_count(), 2);

        // Cached product still served: nothing was invalidated
        desk.acknowledge().unwrap();
        desk.add_product(&ProductId::new("P1"), 1).await.unwrap();
        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), 2);
        assert_eq!(sales.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_credit_sale_checks_fresh_credit_view() {
        let sales = FakeSales::answering(vec![accepted()]);
        let catalog = catalog().with_customer("c-1", dec!(200), dec!(0));
        let mut desk = desk(sales.clone(), catalog.clone());
        fill(&mut desk).await;
        desk.choose_payment(PaymentClassification::Credit).unwrap();

        let view = desk
            .select_customer(Some(CustomerId::new("c-1")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.available_credit(), Money::new(dec!(200)));

        // Balance moved since the customer was selected: 200 - 150 = 50 < 120
        catalog.set_balance("c-1", dec!(150));
        let err = desk.submit().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::CreditLimitExceeded { .. })
        ));
        assert!(sales.sent().is_empty());
        assert_eq!(desk.state(), &SubmissionState::Idle);
        assert_eq!(
            desk.customer_view().unwrap().available_credit(),
            Money::new(dec!(50))
        );
    }

    #[tokio::test]
    async fn test_credit_without_customer_refused_locally() {
        let sales = FakeSales::default();
        let mut desk = desk(sales.clone(), catalog());
        fill(&mut desk).await;
        desk.choose_payment(PaymentClassification::Credit).unwrap();

        let err = desk.submit().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Precondition(PreconditionError::CreditWithoutCustomer)
        ));
        assert!(sales.sent().is_empty());
    }

    #[tokio::test]
    async fn test_blank_product_id_never_reaches_catalog() {
        let catalog = catalog();
        let mut desk = desk(FakeSales::default(), catalog.clone());

        for id in ["", "   "] {
            let err = desk.add_product(&ProductId::new(id), 1).await.unwrap_err();
            assert!(matches!(err, ClientError::Cart(CartError::Validation(_))));
        }
        assert!(desk.cart().is_empty());
        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recent_sales_longer_request_refetches() {
        let catalog = catalog().with_recent_sales(20);
        let desk = desk(FakeSales::default(), catalog.clone());

        assert_eq!(desk.recent_sales(1).await.unwrap().len(), 1);
        assert_eq!(desk.recent_sales(10).await.unwrap().len(), 10);
        assert_eq!(catalog.recent_reads.load(Ordering::SeqCst), 2);

        // A shorter request is answered from the longer cached feed
        let sales = desk.recent_sales(3).await.unwrap();
        assert_eq!(sales.len(), 3);
        assert_eq!(sales[0].id, SaleId::new("1"));
        assert_eq!(catalog.recent_reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_hard_rejection_refreshes_stock_snapshots() {
        let sales = FakeSales::answering(vec![SubmissionOutcome::Rejected(Rejection::Hard {
            status: 400,
            detail: "Insufficient stock for Product P1".into(),
        })]);
        let catalog = catalog();
        let mut desk = desk(sales, catalog.clone());
        fill(&mut desk).await;
        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), 2);

        // Someone else sold P1 meanwhile
        catalog.set_stock("P1", 1);

        let outcome = desk.submit().await.unwrap();
        assert!(matches!(outcome, DeskOutcome::Failed(FailureReason::Rejected(_))));
        assert_eq!(catalog.product_reads.load(Ordering::SeqCst), 4);

        let over: Vec<_> = desk.cart().over_stock_lines().map(|l| l.product_id.clone()).collect();
        assert_eq!(over, vec![ProductId::new("P1")]);
        assert_eq!(desk.cart().item_count(), 2);

        // Corrections are checked against the refreshed figure
        desk.acknowledge().unwrap();
        assert!(desk.set_quantity(&ProductId::new("P1"), 2).is_err());
        desk.set_quantity(&ProductId::new("P1"), 1).unwrap();
    }

    #[tokio::test]
    async fn test_cancel_resets_sale() {
        let mut desk = desk(FakeSales::default(), catalog());
        fill(&mut desk).await;
        desk.cancel().unwrap();
        assert!(desk.cart().is_empty());
        assert!(desk.cart().payment().is_none());
    }
}
