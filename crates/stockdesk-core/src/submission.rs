//! # Submission State Machine
//!
//! Turns a cart into a sale on the Sales Service and decides what happens
//! to the cart depending on the answer.
//!
//! ## State Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            begin_submit()                                               │
//! │   ┌──────┐ ─────────────► ┌────────────┐  Accepted   ┌───────────┐     │
//! │   │ Idle │                │ Submitting │ ──────────► │ Succeeded │     │
//! │   └──────┘ ◄───────────── └────────────┘             └─────┬─────┘     │
//! │      ▲  abandon_warning()   │    ▲    │                    │           │
//! │      │                      │    │    │ rejected /         │           │
//! │      │      price outlier   │    │    │ transport          │           │
//! │      │      (initial only)  ▼    │    ▼                    │           │
//! │   ┌──┴───────────────────────┐   │  ┌────────┐             │           │
//! │   │ RecoverableWarning       │───┘  │ Failed │             │           │
//! │   │ (payload kept verbatim)  │      └───┬────┘             │           │
//! │   └──────────────────────────┘          │                  │           │
//! │              confirm_override()          │   acknowledge()  │           │
//! │                                          └──────────► Idle ◄┘           │
//! │                                                                         │
//! │  - Only Accepted clears the cart and invalidates caches                 │
//! │  - A rejection of an override attempt is always Failed, even another   │
//! │    outlier, so a misbehaving server cannot loop the prompt              │
//! │  - Transport failures are never retried automatically                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cart Lock
//!
//! While `Submitting` or `RecoverableWarning` the cart is locked:
//! [`SaleSession::cart_mut`] returns [`CartError::Locked`]. The outcome is
//! therefore always applied to the same cart that produced the payload.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::error::{CartError, PreconditionError, StateError};
use crate::money::Money;
use crate::types::{
    CustomerCredit, CustomerId, PaymentClassification, PaymentStatus, ProductId, SaleId,
};

/// Wire code the Sales Service uses for a price-outlier rejection.
pub const PRICE_OUTLIER_CODE: &str = "price_outlier";

// =============================================================================
// Wire Request
// =============================================================================

/// One line of the sale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayloadItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

/// The sale request body sent to `POST /sales/`.
///
/// All money is rounded to currency precision here and nowhere earlier.
/// `total_amount` is derived from the rounded `original_amount` and
/// `discount`, so the three fields always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayload {
    pub items: Vec<SalePayloadItem>,
    pub total_amount: Money,
    pub original_amount: Money,
    pub discount: Money,
    pub discount_percentage: Decimal,
    pub customer: Option<CustomerId>,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentClassification,
    pub amount_paid: Money,
    pub amount_credit: Money,
    /// Override flag for a price-outlier rejection. Omitted unless set.
    #[serde(default, skip_serializing_if = "is_false")]
    pub force: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SalePayload {
    /// Builds the request for the cart as it stands.
    ///
    /// ## Amounts
    /// ```text
    /// original_amount = round(subtotal)
    /// discount        = min(round(discount_amount), original_amount)
    /// total_amount    = original_amount - discount
    ///
    /// paid sale:   amount_paid = total,                 amount_credit = 0
    /// credit sale: amount_paid = min(upfront, total),   amount_credit = total - paid
    /// ```
    pub fn from_cart(cart: &Cart) -> Result<SalePayload, PreconditionError> {
        if cart.is_empty() {
            return Err(PreconditionError::EmptyCart);
        }
        let payment = cart.payment().ok_or(PreconditionError::NoPaymentMethod)?;

        let items = cart
            .lines()
            .iter()
            .map(|line| SalePayloadItem {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.rounded(),
                total_price: line.line_total().rounded(),
            })
            .collect();

        let original_amount = cart.subtotal().rounded();
        let discount = cart.discount_amount().rounded().min(original_amount);
        let total_amount = (original_amount - discount).max(Money::zero());

        let (amount_paid, amount_credit) = if payment.is_credit() {
            let paid = cart.upfront_payment().rounded().min(total_amount);
            (paid, total_amount - paid)
        } else {
            (total_amount, Money::zero())
        };

        Ok(SalePayload {
            items,
            total_amount,
            original_amount,
            discount,
            discount_percentage: cart.discount_percent().rounded(),
            customer: cart.customer().cloned(),
            payment_status: payment.payment_status(),
            payment_method: payment,
            amount_paid,
            amount_credit,
            force: false,
        })
    }

    /// The same payload with the override flag set; nothing else changes.
    pub fn with_override(&self) -> SalePayload {
        SalePayload {
            force: true,
            ..self.clone()
        }
    }

    /// Products named in the request.
    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.items.iter().map(|item| &item.product_id)
    }
}

// =============================================================================
// Wire Responses
// =============================================================================

/// Success response. Only drives a receipt view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReceipt {
    /// `None` when the service accepted the sale but its body was unreadable.
    #[serde(default)]
    pub id: Option<SaleId>,
    #[serde(default)]
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl SaleReceipt {
    /// Receipt for a 2xx answer whose body could not be decoded.
    pub fn unconfirmed() -> Self {
        SaleReceipt {
            id: None,
            total_amount: None,
            created_at: None,
        }
    }
}

/// Typical price range reported with an outlier rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Money,
    pub max: Money,
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// A price-outlier rejection, recoverable by explicit override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlierWarning {
    pub message: String,
    pub product_id: Option<ProductId>,
    pub typical_range: Option<PriceRange>,
}

/// Error body shape. Known fields first, anything else is a field error.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    typical_range: Option<PriceRange>,
    #[serde(flatten)]
    fields: BTreeMap<String, serde_json::Value>,
}

/// A server rejection of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    /// Recoverable: the user may resend with `force`.
    PriceOutlier(OutlierWarning),
    /// Stock conflict, validation, auth... shown verbatim.
    Hard { status: u16, detail: String },
}

impl Rejection {
    /// Classifies a non-2xx response.
    ///
    /// The outlier case is recognised only by the structured
    /// `code: "price_outlier"` field; message text is never inspected.
    pub fn classify(status: u16, body: &str) -> Rejection {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();

        let Some(parsed) = parsed else {
            return Rejection::Hard {
                status,
                detail: fallback_detail(status, body),
            };
        };

        if parsed.code.as_deref() == Some(PRICE_OUTLIER_CODE) {
            let message = parsed
                .message
                .or(parsed.detail)
                .unwrap_or_else(|| "Price is outside the typical range".to_string());
            return Rejection::PriceOutlier(OutlierWarning {
                message,
                product_id: parsed.product_id,
                typical_range: parsed.typical_range,
            });
        }

        let detail = parsed
            .detail
            .or(parsed.message)
            .or_else(|| summarize_fields(&parsed.fields))
            .unwrap_or_else(|| fallback_detail(status, body));

        Rejection::Hard { status, detail }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Rejection::PriceOutlier(_))
    }

    /// Message to show the user.
    pub fn message(&self) -> &str {
        match self {
            Rejection::PriceOutlier(warning) => &warning.message,
            Rejection::Hard { detail, .. } => detail,
        }
    }
}

/// `"quantity: Not enough stock; unit_price: Required"` from a field map.
fn summarize_fields(fields: &BTreeMap<String, serde_json::Value>) -> Option<String> {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|(field, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(values) => values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => return None,
            };
            if text.is_empty() {
                None
            } else {
                Some(format!("{}: {}", field, text))
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn fallback_detail(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("Sale was rejected (HTTP {})", status)
    } else {
        body.to_string()
    }
}

/// What the Sales Service said about one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted(SaleReceipt),
    Rejected(Rejection),
    /// The request never got an answer (connect, timeout, reset).
    Transport(String),
}

// =============================================================================
// States
// =============================================================================

/// Whether an attempt is the first send or the user-confirmed override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Initial,
    Override,
}

/// Why a submission ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Rejected(Rejection),
    Transport(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected(rejection) => write!(f, "{}", rejection.message()),
            FailureReason::Transport(msg) => write!(f, "Could not reach the server: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting {
        attempt: AttemptKind,
        payload: SalePayload,
    },
    Succeeded(SaleReceipt),
    RecoverableWarning {
        payload: SalePayload,
        warning: OutlierWarning,
    },
    Failed(FailureReason),
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting { .. } => "submitting",
            SubmissionState::Succeeded(_) => "succeeded",
            SubmissionState::RecoverableWarning { .. } => "awaiting override",
            SubmissionState::Failed(_) => "failed",
        }
    }

    /// True while the cart must not change.
    pub fn locks_cart(&self) -> bool {
        matches!(
            self,
            SubmissionState::Submitting { .. } | SubmissionState::RecoverableWarning { .. }
        )
    }
}

/// Read caches that are stale once a sale is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScope {
    pub products: Vec<ProductId>,
    pub customer: Option<CustomerId>,
    pub recent_activity: bool,
}

impl CacheScope {
    fn for_sale(payload: &SalePayload) -> Self {
        CacheScope {
            products: payload.product_ids().cloned().collect(),
            customer: payload.customer.clone(),
            recent_activity: true,
        }
    }
}

/// Result of applying an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Succeeded {
        receipt: SaleReceipt,
        invalidate: CacheScope,
    },
    Warning(OutlierWarning),
    Failed(FailureReason),
}

// =============================================================================
// Sale Session
// =============================================================================

/// One sale-entry session: exactly one cart and its submission state.
#[derive(Debug, Clone, Default)]
pub struct SaleSession {
    cart: Cart,
    state: SubmissionState,
}

impl SaleSession {
    pub fn new() -> Self {
        SaleSession::default()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Mutable cart access, refused while a submission holds the cart.
    pub fn cart_mut(&mut self) -> Result<&mut Cart, CartError> {
        if self.state.locks_cart() {
            return Err(CartError::Locked);
        }
        Ok(&mut self.cart)
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Local checks that must pass before anything is sent.
    ///
    /// `credit` is the freshly read credit view of the selected customer; it
    /// is only consulted for credit sales.
    pub fn check_preconditions(
        &self,
        credit: Option<&CustomerCredit>,
    ) -> Result<SalePayload, PreconditionError> {
        if self.state.locks_cart() {
            return Err(PreconditionError::NotIdle {
                state: self.state.name(),
            });
        }

        let payload = SalePayload::from_cart(&self.cart)?;

        if payload.payment_method.is_credit() {
            let customer = self
                .cart
                .customer()
                .ok_or(PreconditionError::CreditWithoutCustomer)?;
            let view = credit.ok_or_else(|| PreconditionError::CreditViewMissing(customer.clone()))?;
            if &view.id != customer {
                return Err(PreconditionError::CreditViewMismatch {
                    expected: customer.clone(),
                    actual: view.id.clone(),
                });
            }

            let upfront = self.cart.upfront_payment().rounded();
            if upfront > payload.total_amount {
                return Err(PreconditionError::UpfrontExceedsTotal {
                    upfront,
                    total: payload.total_amount,
                });
            }

            if !view.can_absorb(payload.amount_credit) {
                return Err(PreconditionError::CreditLimitExceeded {
                    customer: customer.clone(),
                    requested: payload.amount_credit,
                    available: view.available_credit(),
                });
            }
        }

        Ok(payload)
    }

    /// `Idle → Submitting`. Returns the payload to send.
    ///
    /// Also allowed from `Succeeded` and `Failed`, which counts as
    /// acknowledging the previous result.
    pub fn begin_submit(
        &mut self,
        credit: Option<&CustomerCredit>,
    ) -> Result<SalePayload, PreconditionError> {
        let payload = self.check_preconditions(credit)?;
        self.state = SubmissionState::Submitting {
            attempt: AttemptKind::Initial,
            payload: payload.clone(),
        };
        Ok(payload)
    }

    /// Applies the Sales Service's answer to the in-flight attempt.
    pub fn resolve(&mut self, outcome: SubmissionOutcome) -> Result<Transition, StateError> {
        let (attempt, payload) = match mem::take(&mut self.state) {
            SubmissionState::Submitting { attempt, payload } => (attempt, payload),
            other => {
                let state = other.name();
                self.state = other;
                return Err(StateError {
                    action: "resolve a submission",
                    state,
                });
            }
        };

        let transition = match outcome {
            SubmissionOutcome::Accepted(receipt) => {
                self.cart.clear();
                self.state = SubmissionState::Succeeded(receipt.clone());
                Transition::Succeeded {
                    receipt,
                    invalidate: CacheScope::for_sale(&payload),
                }
            }
            SubmissionOutcome::Rejected(Rejection::PriceOutlier(warning))
                if attempt == AttemptKind::Initial =>
            {
                self.state = SubmissionState::RecoverableWarning {
                    payload,
                    warning: warning.clone(),
                };
                Transition::Warning(warning)
            }
            SubmissionOutcome::Rejected(rejection) => {
                self.fail(FailureReason::Rejected(rejection))
            }
            SubmissionOutcome::Transport(msg) => self.fail(FailureReason::Transport(msg)),
        };

        Ok(transition)
    }

    fn fail(&mut self, reason: FailureReason) -> Transition {
        self.state = SubmissionState::Failed(reason.clone());
        Transition::Failed(reason)
    }

    /// `RecoverableWarning → Submitting` with the retained payload plus
    /// `force: true`.
    pub fn confirm_override(&mut self) -> Result<SalePayload, StateError> {
        match mem::take(&mut self.state) {
            SubmissionState::RecoverableWarning { payload, .. } => {
                let payload = payload.with_override();
                self.state = SubmissionState::Submitting {
                    attempt: AttemptKind::Override,
                    payload: payload.clone(),
                };
                Ok(payload)
            }
            other => Err(self.restore(other, "override")),
        }
    }

    /// `RecoverableWarning → Idle`. The cart is kept.
    pub fn abandon_warning(&mut self) -> Result<(), StateError> {
        match mem::take(&mut self.state) {
            SubmissionState::RecoverableWarning { .. } => Ok(()),
            other => Err(self.restore(other, "abandon a warning")),
        }
    }

    /// `Succeeded | Failed → Idle`. A no-op when already idle.
    pub fn acknowledge(&mut self) -> Result<(), StateError> {
        match mem::take(&mut self.state) {
            SubmissionState::Idle | SubmissionState::Succeeded(_) | SubmissionState::Failed(_) => {
                Ok(())
            }
            other => Err(self.restore(other, "acknowledge")),
        }
    }

    /// Explicit cancel: empties the cart and returns to `Idle`.
    ///
    /// Not possible while a request is in flight; in-flight sends are never
    /// aborted.
    pub fn cancel(&mut self) -> Result<(), StateError> {
        if let SubmissionState::Submitting { .. } = self.state {
            return Err(StateError {
                action: "cancel",
                state: self.state.name(),
            });
        }
        self.cart.clear();
        self.state = SubmissionState::Idle;
        Ok(())
    }

    fn restore(&mut self, state: SubmissionState, action: &'static str) -> StateError {
        let err = StateError {
            action,
            state: state.name(),
        };
        self.state = state;
        err
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
