//! # stockdesk-client: I/O Layer for StockDesk
//!
//! Configuration, the signed-in session, the REST client, the read cache
//! and the [`SaleDesk`] that ties them to a [`stockdesk_core::SaleSession`].
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sale Desk Architecture                          │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    SaleDesk (Main Orchestrator)                  │  │
//! │  │                                                                  │  │
//! │  │  Owns one SaleSession, one Session and a ReadCache              │  │
//! │  │  Every edit and submit goes through it                          │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  SalesService  │  │ CatalogService │  │      ReadCache         │    │
//! │  │                │  │                │  │                        │    │
//! │  │ POST sales/    │  │ products/{id}/ │  │ TTL entries, dropped   │    │
//! │  │ one attempt,   │  │ customers/{id}/│  │ per CacheScope after   │    │
//! │  │ never retried  │  │ recent sales   │  │ a confirmed sale       │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │         └──────── ApiClient (reqwest) implements both ─────┘           │
//! │                                                                         │
//! │  ClientConfig: defaults → client.toml → STOCKDESK_* env → validate     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`session`] - Explicit request context (base URL, token, role)
//! - [`api`] - Service traits, wire DTOs and the `reqwest` client
//! - [`cache`] - TTL read cache with scoped invalidation
//! - [`desk`] - `SaleDesk` orchestrator
//! - [`error`] - Client error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockdesk_client::{ApiClient, ClientConfig, ReadCache, SaleDesk, Session};
//!
//! let config = ClientConfig::load(None)?;
//! let api = ApiClient::new(&config)?;
//! let session = Session::from_config(&config)?;
//!
//! let mut desk = SaleDesk::new(api.clone(), api, session, ReadCache::new(config.cache_ttl()))?;
//! desk.add_product(&ProductId::new("42"), 2).await?;
//! desk.choose_payment(PaymentClassification::Cash)?;
//! let outcome = desk.submit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod cache;
pub mod config;
pub mod desk;
pub mod error;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{
    ApiClient, CatalogService, CustomerRecord, ProductRecord, SaleSummary, SalesService,
    REQUEST_ID_HEADER,
};
pub use cache::{CacheKey, CachedValue, ReadCache};
pub use config::{
    ApiSettings, CacheSettings, ClientConfig, DisplaySettings, SessionSettings, StockSettings,
};
pub use desk::{AddedProduct, DeskOutcome, SaleDesk};
pub use error::{ClientError, ClientResult};
pub use session::{Session, UserProfile};
