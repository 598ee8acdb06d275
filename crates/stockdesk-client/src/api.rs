//! # REST API Client
//!
//! Typed access to the backend's sales, product and customer endpoints.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SaleDesk ──► SalesService::create_sale(&Session, &SalePayload)         │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │              POST {base}/sales/                                         │
//! │              Authorization: Token …   X-Request-Id: <uuid v4>           │
//! │                   │                                                     │
//! │        ┌──────────┼──────────────────┬───────────────────┐              │
//! │        ▼          ▼                  ▼                   ▼              │
//! │      2xx       4xx / 5xx        no answer          2xx, bad body        │
//! │   Accepted   Rejected(classify)  Transport       Accepted(unconfirmed)  │
//! │                                                                         │
//! │  Nothing here retries. The only resend is the user's explicit override. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stockdesk_core::{
    CustomerCredit, CustomerId, Money, PaymentStatus, ProductId, ProductSnapshot, Rejection,
    SaleId, SalePayload, SaleReceipt, SubmissionOutcome,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// Header carrying a fresh id for every attempt, override included.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

// =============================================================================
// Service Traits
// =============================================================================

/// The external Sales Service.
#[async_trait]
pub trait SalesService: Send + Sync {
    /// Sends one attempt. Never fails: every result is an outcome.
    async fn create_sale(&self, session: &Session, payload: &SalePayload) -> SubmissionOutcome;
}

/// Read-only catalog, customer credit and activity views.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn fetch_product(&self, session: &Session, id: &ProductId) -> ClientResult<ProductSnapshot>;

    async fn fetch_customer_credit(
        &self,
        session: &Session,
        id: &CustomerId,
    ) -> ClientResult<CustomerCredit>;

    /// Most recent sales, newest first.
    async fn fetch_recent_sales(&self, session: &Session, limit: usize) -> ClientResult<Vec<SaleSummary>>;
}

// =============================================================================
// Wire DTOs
// =============================================================================

/// Product as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(alias = "unit_price", alias = "selling_price")]
    pub price: Money,
    #[serde(alias = "stock", alias = "available_stock", alias = "stock_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub reorder_point: Option<i64>,
}

impl From<ProductRecord> for ProductSnapshot {
    fn from(record: ProductRecord) -> Self {
        ProductSnapshot {
            id: record.id,
            name: record.name,
            sku: record.sku.filter(|s| !s.trim().is_empty()),
            unit_price: record.price,
            available_stock: record.quantity,
            reorder_point: record.reorder_point,
        }
    }
}

/// Customer as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub credit_limit: Money,
    #[serde(default, alias = "balance", alias = "outstanding_balance")]
    pub current_balance: Money,
}

impl From<CustomerRecord> for CustomerCredit {
    fn from(record: CustomerRecord) -> Self {
        CustomerCredit {
            id: record.id,
            name: record.name,
            credit_limit: record.credit_limit,
            current_balance: record.current_balance,
        }
    }
}

/// One entry of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSummary {
    pub id: SaleId,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// List endpoints answer either a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paged { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Paged { results } => results,
            Listing::Plain(items) => items,
        }
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

/// `reqwest`-backed implementation of both service traits.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.api.user_agent.clone())
            .build()?;
        Ok(ApiClient { http })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        entity: &'static str,
        id: &str,
    ) -> ClientResult<T> {
        let url = session.endpoint(path)?;
        debug!(%url, "GET");

        let response = session.authorize(self.http.get(url)).send().await?;
        let status = response.status();

        match status {
            s if s.is_success() => Ok(response.json::<T>().await?),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound {
                entity,
                id: id.to_string(),
            }),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::Api {
                    status: status.as_u16(),
                    detail: Rejection::classify(status.as_u16(), &body)
                        .message()
                        .to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl SalesService for ApiClient {
    async fn create_sale(&self, session: &Session, payload: &SalePayload) -> SubmissionOutcome {
        let url = match session.endpoint("sales/") {
            Ok(url) => url,
            Err(e) => return SubmissionOutcome::Transport(e.to_string()),
        };
        let request_id = Uuid::new_v4();

        debug!(
            %request_id,
            items = payload.items.len(),
            total = %payload.total_amount,
            force = payload.force,
            "Posting sale"
        );

        let request = self
            .http
            .post(url)
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(payload);

        let response = match session.authorize(request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%request_id, error = %e, "Sale request got no answer");
                return SubmissionOutcome::Transport(e.to_string());
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%request_id, error = %e, "Failed to read sale response body");
                String::new()
            }
        };

        if status.is_success() {
            match serde_json::from_str::<SaleReceipt>(&body) {
                Ok(receipt) => {
                    info!(%request_id, sale_id = ?receipt.id, "Sale accepted");
                    SubmissionOutcome::Accepted(receipt)
                }
                Err(e) => {
                    // The sale exists; reporting failure would invite a duplicate.
                    warn!(%request_id, error = %e, "Sale accepted but receipt unreadable");
                    SubmissionOutcome::Accepted(SaleReceipt::unconfirmed())
                }
            }
        } else {
            let rejection = Rejection::classify(status.as_u16(), &body);
            info!(
                %request_id,
                status = status.as_u16(),
                recoverable = rejection.is_recoverable(),
                "Sale rejected"
            );
            SubmissionOutcome::Rejected(rejection)
        }
    }
}

#[async_trait]
impl CatalogService for ApiClient {
    async fn fetch_product(&self, session: &Session, id: &ProductId) -> ClientResult<ProductSnapshot> {
        let record: ProductRecord = self
            .get_json(session, &format!("products/{}/", id), "Product", id.as_str())
            .await?;
        Ok(record.into())
    }

    async fn fetch_customer_credit(
        &self,
        session: &Session,
        id: &CustomerId,
    ) -> ClientResult<CustomerCredit> {
        let record: CustomerRecord = self
            .get_json(session, &format!("customers/{}/", id), "Customer", id.as_str())
            .await?;
        Ok(record.into())
    }

    async fn fetch_recent_sales(&self, session: &Session, limit: usize) -> ClientResult<Vec<SaleSummary>> {
        let listing: Listing<SaleSummary> = self
            .get_json(session, &format!("sales/?ordering=-created_at&limit={}", limit), "Sales", "recent")
            .await?;
        let mut sales = listing.into_vec();
        sales.truncate(limit);
        Ok(sales)
    }
}
