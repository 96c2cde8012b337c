//! Shipsgo ocean tracking adapter.
//!
//! Tracking is a two-step exchange: register the shipment (a 409 answer means
//! it is already registered and carries the existing id), then fetch its
//! details. Shipsgo charges a credit per new shipment, never per lookup.

use super::{body_preview, map_transport_error};
use crate::{
    config::app::TrackingConfig,
    core::tracking::{SearchType, TrackingEvent, TrackingProvider, TrackingQuery, TrackingResult},
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

const TOKEN_HEADER: &str = "X-Shipsgo-User-Token";

#[derive(Debug, Serialize)]
struct CreateShipmentDto<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    container_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    carrier: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ShipmentResponseDto {
    shipment: ShipmentDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShipmentDto {
    id: Option<i64>,
    container_number: Option<String>,
    booking_number: Option<String>,
    status: Option<String>,
    carrier: Option<CarrierDto>,
    route: Option<RouteDto>,
    containers: Vec<ShipmentContainerDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CarrierDto {
    scac: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RouteDto {
    port_of_loading: Option<PortCallDto>,
    port_of_discharge: Option<PortCallDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PortCallDto {
    location: Option<LocationDto>,
    date_of_loading: Option<String>,
    date_of_discharge: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocationDto {
    name: Option<String>,
    country: Option<CountryDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CountryDto {
    code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShipmentContainerDto {
    number: Option<String>,
    movements: Vec<MovementDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MovementDto {
    event: Option<String>,
    status: Option<String>,
    timestamp: Option<String>,
    location: Option<LocationDto>,
    vessel: Option<VesselDto>,
    voyage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VesselDto {
    name: Option<String>,
}

impl LocationDto {
    fn label(&self) -> String {
        match (self.name.as_deref(), self.country.as_ref().and_then(|c| c.code.as_deref())) {
            (Some(name), Some(code)) => format!("{name}, {code}"),
            (Some(name), None) => name.to_string(),
            (None, Some(code)) => code.to_string(),
            (None, None) => "Unknown".to_string(),
        }
    }
}

fn location_label(call: Option<&PortCallDto>) -> String {
    call.and_then(|c| c.location.as_ref())
        .map_or_else(|| "Unknown".to_string(), LocationDto::label)
}

impl ShipmentDto {
    fn into_result(self, query: &TrackingQuery) -> TrackingResult {
        let container = self.containers.into_iter().next().unwrap_or_default();
        let latest = container.movements.iter().rev().find(|m| m.vessel.is_some());
        let vessel = latest
            .and_then(|m| m.vessel.as_ref())
            .and_then(|v| v.name.clone());
        let voyage = latest.and_then(|m| m.voyage.clone());

        let route = self.route.unwrap_or_default();
        let events = container
            .movements
            .iter()
            .map(|movement| TrackingEvent {
                date: movement.timestamp.clone(),
                location: movement
                    .location
                    .as_ref()
                    .map_or_else(|| "Unknown".to_string(), LocationDto::label),
                description: movement
                    .event
                    .clone()
                    .or_else(|| movement.status.clone())
                    .unwrap_or_else(|| "Update".to_string()),
                vessel: movement.vessel.as_ref().and_then(|v| v.name.clone()),
            })
            .collect();

        let carrier = self.carrier.unwrap_or_default();
        TrackingResult {
            container_number: container
                .number
                .or(self.container_number)
                .or(self.booking_number)
                .unwrap_or_else(|| query.number.clone()),
            carrier: carrier
                .name
                .or(carrier.scac)
                .or_else(|| query.carrier.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            status: self.status.unwrap_or_else(|| "Unknown".to_string()),
            origin: location_label(route.port_of_loading.as_ref()),
            destination: location_label(route.port_of_discharge.as_ref()),
            departure: route
                .port_of_loading
                .as_ref()
                .and_then(|c| c.date_of_loading.clone()),
            eta: route
                .port_of_discharge
                .as_ref()
                .and_then(|c| c.date_of_discharge.clone()),
            vessel,
            voyage,
            events,
        }
    }
}

/// Shipsgo v2 ocean tracking client
pub struct ShipsgoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ShipsgoClient {
    /// Builds a client with the configured base URL and request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &TrackingConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn shipments_url(&self) -> String {
        format!("{}/ocean/shipments", self.base_url)
    }

    /// Registers the shipment, returning its id. Already-registered
    /// shipments answer 409 with the existing id.
    async fn register(&self, query: &TrackingQuery) -> Result<Option<i64>> {
        let payload = CreateShipmentDto {
            container_number: (query.search_type == SearchType::Container)
                .then_some(query.number.as_str()),
            booking_number: (query.search_type != SearchType::Container)
                .then_some(query.number.as_str()),
            carrier: query.carrier.as_deref(),
        };

        let response = self
            .client
            .post(self.shipments_url())
            .header(TOKEN_HEADER, self.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::CONFLICT => {
                debug!("Shipment {} already registered", query.number);
                shipment_id(&body).map(Some)
            }
            s if s.is_success() => {
                info!("Registered shipment {} with Shipsgo", query.number);
                shipment_id(&body).map(Some)
            }
            s => Err(map_status_error(s, &body)),
        }
    }

    async fn details(&self, id: i64, query: &TrackingQuery) -> Result<Option<TrackingResult>> {
        let response = self
            .client
            .get(format!("{}/{id}", self.shipments_url()))
            .header(TOKEN_HEADER, self.api_key.as_str())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => parse_shipment(&body).map(|shipment| Some(shipment.into_result(query))),
            s => Err(map_status_error(s, &body)),
        }
    }
}

#[async_trait]
impl TrackingProvider for ShipsgoClient {
    #[instrument(skip(self), fields(number = %query.number))]
    async fn track(&self, query: &TrackingQuery) -> Result<Option<TrackingResult>> {
        let Some(id) = self.register(query).await? else {
            return Ok(None);
        };
        self.details(id, query).await
    }
}

fn parse_shipment(body: &[u8]) -> Result<ShipmentDto> {
    serde_json::from_slice::<ShipmentResponseDto>(body)
        .map(|response| response.shipment)
        .map_err(|error| Error::Upstream {
            message: format!("invalid Shipsgo payload: {error}"),
        })
}

fn shipment_id(body: &[u8]) -> Result<i64> {
    parse_shipment(body)?.id.ok_or_else(|| Error::Upstream {
        message: format!("Shipsgo response without shipment id: {}", body_preview(body)),
    })
}

/// Maps a non-success Shipsgo answer to a typed error.
///
/// Status codes are authoritative; the body text is only consulted for
/// answers Shipsgo sends with a generic status.
fn map_status_error(status: StatusCode, body: &[u8]) -> Error {
    let preview = body_preview(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::TrackingUnauthorized {
            message: if preview.is_empty() {
                format!("status {}", status.as_u16())
            } else {
                preview
            },
        },
        StatusCode::PAYMENT_REQUIRED => Error::InsufficientCredits,
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
        _ if preview.contains("Insufficient Shipsgo credits") => Error::InsufficientCredits,
        _ if preview.contains("Rate limit exceeded") => Error::RateLimited,
        _ => Error::Upstream {
            message: format!("Shipsgo status {}: {preview}", status.as_u16()),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn query() -> TrackingQuery {
        TrackingQuery {
            number: "MSKU1234565".to_string(),
            carrier: Some("MAEU".to_string()),
            search_type: SearchType::Container,
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, b"{\"message\":\"bad token\"}"),
            Error::TrackingUnauthorized { .. }
        ));
        assert!(matches!(
            map_status_error(StatusCode::FORBIDDEN, b""),
            Error::TrackingUnauthorized { .. }
        ));
        assert!(matches!(
            map_status_error(StatusCode::PAYMENT_REQUIRED, b""),
            Error::InsufficientCredits
        ));
        assert!(matches!(
            map_status_error(StatusCode::TOO_MANY_REQUESTS, b""),
            Error::RateLimited
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_REQUEST, b"Insufficient Shipsgo credits"),
            Error::InsufficientCredits
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_REQUEST, b"{\"message\":\"Rate limit exceeded\"}"),
            Error::RateLimited
        ));
        assert!(matches!(
            map_status_error(StatusCode::INTERNAL_SERVER_ERROR, b"oops"),
            Error::Upstream { .. }
        ));
    }

    #[test]
    fn test_conflict_body_carries_existing_id() {
        let body = br#"{"message":"ALREADY_EXISTS","shipment":{"id":9182}}"#;
        assert_eq!(shipment_id(body).unwrap(), 9182);
        assert!(matches!(
            shipment_id(br#"{"shipment":{}}"#).unwrap_err(),
            Error::Upstream { .. }
        ));
    }

    #[test]
    fn test_create_payload_shape() {
        let q = query();
        let payload = CreateShipmentDto {
            container_number: Some(q.number.as_str()),
            booking_number: None,
            carrier: q.carrier.as_deref(),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"container_number": "MSKU1234565", "carrier": "MAEU"})
        );
    }

    #[test]
    fn test_shipment_details_reshape() {
        let body = r#"{
            "shipment": {
                "id": 9182,
                "status": "SAILING",
                "carrier": { "scac": "MAEU", "name": "Maersk" },
                "route": {
                    "port_of_loading": {
                        "location": { "name": "Shanghai", "country": { "code": "CN" } },
                        "date_of_loading": "2026-09-02"
                    },
                    "port_of_discharge": {
                        "location": { "name": "Los Angeles", "country": { "code": "US" } },
                        "date_of_discharge": "2026-09-24"
                    }
                },
                "containers": [
                    {
                        "number": "MSKU1234565",
                        "movements": [
                            { "event": "GTIN", "timestamp": "2026-08-29T10:00:00Z",
                              "location": { "name": "Shanghai" } },
                            { "event": "LOAD", "timestamp": "2026-09-01T08:00:00Z",
                              "location": { "name": "Shanghai", "country": { "code": "CN" } },
                              "vessel": { "name": "MAERSK ESSEN" }, "voyage": "436E" }
                        ]
                    }
                ]
            }
        }"#;

        let result = parse_shipment(body.as_bytes()).unwrap().into_result(&query());
        assert_eq!(result.container_number, "MSKU1234565");
        assert_eq!(result.carrier, "Maersk");
        assert_eq!(result.status, "SAILING");
        assert_eq!(result.origin, "Shanghai, CN");
        assert_eq!(result.destination, "Los Angeles, US");
        assert_eq!(result.departure.as_deref(), Some("2026-09-02"));
        assert_eq!(result.eta.as_deref(), Some("2026-09-24"));
        assert_eq!(result.vessel.as_deref(), Some("MAERSK ESSEN"));
        assert_eq!(result.voyage.as_deref(), Some("436E"));
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].location, "Shanghai");
        assert_eq!(result.events[1].description, "LOAD");
    }

    #[test]
    fn test_sparse_details_fall_back_to_query() {
        let result = parse_shipment(br#"{"shipment":{"id":1}}"#)
            .unwrap()
            .into_result(&query());
        assert_eq!(result.container_number, "MSKU1234565");
        assert_eq!(result.carrier, "MAEU");
        assert_eq!(result.origin, "Unknown");
        assert!(result.events.is_empty());
    }
}
