//! HTTP mapping for [`Error`].
//!
//! Every failure leaves the API as `{"error": {"code", "message"}}` with a
//! status chosen per variant. Internal failures are logged in full and
//! reported to the client with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// HTTP status and stable error code for this error
    #[must_use]
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation { .. } | Self::InvalidAmount { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_input")
            }
            Self::ContainerNotFound { .. }
            | Self::DepotNotFound { .. }
            | Self::ContractNotFound { .. }
            | Self::ContractContainerNotFound { .. }
            | Self::BillingEntryNotFound { .. }
            | Self::InvoiceNotFound { .. }
            | Self::ShipmentNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Self::TrackingNotConfigured => (StatusCode::UNAUTHORIZED, "tracking_not_configured"),
            Self::TrackingUnauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::InsufficientCredits => (StatusCode::PAYMENT_REQUIRED, "insufficient_credits"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Self::Geocoding { .. } => (StatusCode::BAD_GATEWAY, "geocoding_failed"),
            Self::Upstream { .. } | Self::Http(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            Self::Config { .. } | Self::Io(_) | Self::EnvVar(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() && !matches!(status, StatusCode::BAD_GATEWAY) {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (
            status,
            Json(json!({ "error": { "code": code, "message": message } })),
        )
            .into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}
