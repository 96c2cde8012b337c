//! Container tracking - the port the HTTP layer calls and its local providers.
//!
//! Requests are validated here before any provider sees them, so an invalid
//! container number never spends upstream credits. The Shipsgo adapter lives
//! in `outbound::shipsgo`; this module also carries the provider used when no
//! API key is configured and the optional demo provider.

use crate::{
    core::container_number,
    errors::{Error, Result},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What kind of reference is being tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchType {
    /// ISO 6346 container number
    #[default]
    Container,
    /// Carrier booking reference
    Booking,
    /// Bill of lading number
    #[serde(alias = "bl")]
    BillOfLading,
}

/// Tracking request as submitted by a client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    /// Container, booking or bill of lading number
    pub tracking_number: String,
    /// Carrier SCAC or name, if known
    #[serde(default)]
    pub shipping_line: Option<String>,
    /// Defaults to a container number search
    #[serde(default)]
    pub search_type: Option<SearchType>,
}

/// A validated tracking request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingQuery {
    /// Normalized reference
    pub number: String,
    /// Carrier hint
    pub carrier: Option<String>,
    /// Reference kind
    pub search_type: SearchType,
}

/// One movement in a shipment's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Event timestamp as reported by the carrier
    pub date: Option<String>,
    /// Where it happened
    pub location: String,
    /// What happened
    pub description: String,
    /// Vessel involved, if any
    pub vessel: Option<String>,
}

/// Shipment status reshaped for the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResult {
    /// Container or reference that was tracked
    pub container_number: String,
    /// Carrier name
    pub carrier: String,
    /// Current shipment status
    pub status: String,
    /// Port of loading
    pub origin: String,
    /// Port of discharge
    pub destination: String,
    /// Departure date
    pub departure: Option<String>,
    /// Estimated arrival
    pub eta: Option<String>,
    /// Current vessel
    pub vessel: Option<String>,
    /// Current voyage number
    pub voyage: Option<String>,
    /// Movements, oldest first
    pub events: Vec<TrackingEvent>,
}

/// Looks up shipments with an ocean tracking service
#[async_trait]
pub trait TrackingProvider: Send + Sync {
    /// Tracks a validated reference. `Ok(None)` means the service has no
    /// shipment for it.
    async fn track(&self, query: &TrackingQuery) -> Result<Option<TrackingResult>>;
}

/// Validates and normalizes a tracking request.
///
/// # Errors
/// Returns a validation error for a blank reference, a container number that
/// fails its ISO 6346 check digit, or a reference with unexpected characters.
pub fn validate_request(request: &TrackingRequest) -> Result<TrackingQuery> {
    let raw = request.tracking_number.trim();
    if raw.is_empty() {
        return Err(Error::validation("Tracking number cannot be empty"));
    }

    let search_type = request.search_type.unwrap_or_default();
    let number = match search_type {
        SearchType::Container => container_number::validate(raw)?,
        SearchType::Booking | SearchType::BillOfLading => {
            let number = container_number::normalize(raw);
            if !number.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::validation(format!(
                    "Tracking reference may only contain letters and digits: {raw}"
                )));
            }
            number
        }
    };

    let carrier = request
        .shipping_line
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase);

    Ok(TrackingQuery {
        number,
        carrier,
        search_type,
    })
}

/// Validates a request and asks the provider to track it
///
/// # Errors
/// Returns validation errors from [`validate_request`] and any provider error.
pub async fn search_container(
    provider: &dyn TrackingProvider,
    request: &TrackingRequest,
) -> Result<Option<TrackingResult>> {
    let query = validate_request(request)?;
    debug!("Tracking {:?} {}", query.search_type, query.number);
    provider.track(&query).await
}

/// Provider used when no tracking API key is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTracker;

#[async_trait]
impl TrackingProvider for UnconfiguredTracker {
    async fn track(&self, _query: &TrackingQuery) -> Result<Option<TrackingResult>> {
        Err(Error::TrackingNotConfigured)
    }
}

/// Serves a canned voyage for every reference. Only used when demo mode is
/// switched on in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoTracker;

#[async_trait]
impl TrackingProvider for DemoTracker {
    async fn track(&self, query: &TrackingQuery) -> Result<Option<TrackingResult>> {
        Ok(Some(demo_result(query)))
    }
}

fn demo_result(query: &TrackingQuery) -> TrackingResult {
    let event = |date: &str, location: &str, description: &str, vessel: Option<&str>| {
        TrackingEvent {
            date: Some(date.to_string()),
            location: location.to_string(),
            description: description.to_string(),
            vessel: vessel.map(str::to_string),
        }
    };

    TrackingResult {
        container_number: query.number.clone(),
        carrier: query.carrier.clone().unwrap_or_else(|| "MAERSK".to_string()),
        status: "In Transit".to_string(),
        origin: "Shanghai, CN".to_string(),
        destination: "Los Angeles, US".to_string(),
        departure: Some("2026-09-02".to_string()),
        eta: Some("2026-09-24".to_string()),
        vessel: Some("MAERSK ESSEN".to_string()),
        voyage: Some("436E".to_string()),
        events: vec![
            event("2026-08-29", "Shanghai, CN", "Gate in full", None),
            event("2026-09-01", "Shanghai, CN", "Loaded on vessel", Some("MAERSK ESSEN")),
            event("2026-09-02", "Shanghai, CN", "Vessel departure", Some("MAERSK ESSEN")),
        ],
    }
}
