//! Unified error type for the container market backend.
//!
//! Every layer returns [`Result`]; the HTTP layer turns each variant into a
//! status code in `api::error`.

use thiserror::Error;

/// Application error
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Caller supplied invalid input
    #[error("Validation error: {message}")]
    Validation {
        /// Which input was rejected and why
        message: String,
    },

    /// A price, rate or amount was negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// No container listing matched
    #[error("Container not found: {sku}")]
    ContainerNotFound {
        /// SKU or id that was looked up
        sku: String,
    },

    /// No depot matched
    #[error("Depot not found: {name}")]
    DepotNotFound {
        /// Name, id or search description
        name: String,
    },

    /// No lease contract matched
    #[error("Contract not found: {id}")]
    ContractNotFound {
        /// Contract id or number
        id: String,
    },

    /// No container assignment matched
    #[error("Contract container not found: {id}")]
    ContractContainerNotFound {
        /// Assignment id
        id: i64,
    },

    /// No billing schedule row matched
    #[error("Billing entry not found: {id}")]
    BillingEntryNotFound {
        /// Billing row id
        id: i64,
    },

    /// No invoice matched
    #[error("Invoice not found: {number}")]
    InvoiceNotFound {
        /// Invoice id or number
        number: String,
    },

    /// Address could not be geocoded
    #[error("Geocoding failed: {message}")]
    Geocoding {
        /// Reason reported by the geocoder
        message: String,
    },

    /// Tracking was requested but no Shipsgo credentials are configured
    #[error("Tracking service is not configured: SHIPSGO_API_KEY is missing")]
    TrackingNotConfigured,

    /// The tracking service has no shipment for the reference
    #[error("No shipment found for {number}")]
    ShipmentNotFound {
        /// Tracking reference that was searched
        number: String,
    },

    /// Shipsgo rejected the configured credentials
    #[error("Tracking credentials rejected: {message}")]
    TrackingUnauthorized {
        /// Upstream message
        message: String,
    },

    /// Shipsgo account is out of credits
    #[error("Insufficient Shipsgo credits")]
    InsufficientCredits,

    /// Upstream API rate limit hit
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Upstream API returned an unexpected answer or could not be reached
    #[error("Upstream service error: {message}")]
    Upstream {
        /// Transport or decode failure
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Outbound HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
