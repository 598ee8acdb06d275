//! # Client Error Types
//!
//! Error types for everything the client layer does.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Api { status, detail } │ │
//! │  │  InvalidUrl     │  │  Decode         │  │  NotFound               │ │
//! │  │  ConfigLoad/Save│  │                 │  │  Unauthorized           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Local (from stockdesk-core)                                    │   │
//! │  │  Cart │ Precondition │ State │ Forbidden                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  A sale REJECTED by the server is not an error here: it is a          │
//! │  `SubmissionOutcome` that drives the state machine.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockdesk_core::{Capability, CartError, PreconditionError, StateError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request did not complete (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a body we could not read.
    #[error("Could not decode response: {0}")]
    Decode(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    #[error("Server returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Not signed in or session expired")]
    Unauthorized,

    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Your role does not allow this ({0:?})")]
    Forbidden(Capability),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if the user can fix this at the desk without help.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            ClientError::Cart(_) | ClientError::Precondition(_) | ClientError::State(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockdesk_core::StockRejection;

    #[test]
    fn test_categories() {
        assert!(ClientError::InvalidUrl("x".into()).is_config_error());
        assert!(!ClientError::Unauthorized.is_config_error());

        let err: ClientError = CartError::Stock(StockRejection::OutOfStock {
            product: "Milk".into(),
        })
        .into();
        assert!(err.is_user_correctable());
        assert_eq!(err.to_string(), "Milk is out of stock");
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Api {
            status: 503,
            detail: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "Server returned 503: maintenance");

        let err = ClientError::NotFound {
            entity: "Product",
            id: "42".into(),
        };
        assert_eq!(err.to_string(), "Product 42 not found");
    }
}
