//! Google Geocoding API adapter.

use super::{body_preview, map_transport_error};
use crate::{
    config::app::GeocodingConfig,
    core::geo::{GeoPoint, Geocoder},
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct GeocodeResponseDto {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResultDto>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResultDto {
    #[serde(default)]
    formatted_address: Option<String>,
    geometry: GeometryDto,
}

#[derive(Debug, Deserialize)]
struct GeometryDto {
    location: LatLngDto,
}

#[derive(Debug, Deserialize)]
struct LatLngDto {
    lat: f64,
    lng: f64,
}

/// Geocoder backed by the Google Maps Geocoding API
pub struct GoogleGeocoder {
    client: Client,
    endpoint: String,
    region: String,
    api_key: String,
}

impl GoogleGeocoder {
    /// Builds a geocoder with the configured endpoint and request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &GeocodingConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            region: config.region.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("address", address),
                ("region", self.region.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(Error::Upstream {
                message: format!("geocoder status {}: {}", status.as_u16(), body_preview(&body)),
            });
        }

        let point = parse_geocode(&body)?;
        debug!(found = point.is_some(), "Geocoded address");
        Ok(point)
    }
}

fn parse_geocode(body: &[u8]) -> Result<Option<GeoPoint>> {
    let decoded: GeocodeResponseDto = serde_json::from_slice(body).map_err(|error| Error::Upstream {
        message: format!("invalid geocoder payload: {error}"),
    })?;

    match decoded.status.as_str() {
        "OK" => Ok(decoded.results.into_iter().next().map(|result| GeoPoint {
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
            formatted_address: result.formatted_address,
        })),
        "ZERO_RESULTS" => Ok(None),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(Error::RateLimited),
        other => {
            let message = decoded
                .error_message
                .map_or_else(|| other.to_string(), |detail| format!("{other}: {detail}"));
            warn!("Geocoder rejected request: {message}");
            Err(Error::Geocoding { message })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_first_result() {
        let body = r#"{
            "status": "OK",
            "results": [
                {
                    "formatted_address": "Houston, TX 77029, USA",
                    "geometry": { "location": { "lat": 29.76, "lng": -95.26 } }
                },
                {
                    "geometry": { "location": { "lat": 1.0, "lng": 1.0 } }
                }
            ]
        }"#;

        let point = parse_geocode(body.as_bytes()).unwrap().unwrap();
        assert_eq!(point.latitude, 29.76);
        assert_eq!(point.longitude, -95.26);
        assert_eq!(
            point.formatted_address.as_deref(),
            Some("Houston, TX 77029, USA")
        );
    }

    #[test]
    fn test_zero_results_is_none() {
        let body = br#"{"status":"ZERO_RESULTS","results":[]}"#;
        assert!(parse_geocode(body).unwrap().is_none());
    }

    #[test]
    fn test_status_mapping() {
        let body = br#"{"status":"OVER_QUERY_LIMIT","results":[]}"#;
        assert!(matches!(parse_geocode(body).unwrap_err(), Error::RateLimited));

        let body = br#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid."}"#;
        match parse_geocode(body).unwrap_err() {
            Error::Geocoding { message } => assert!(message.contains("API key is invalid")),
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            parse_geocode(b"<html>").unwrap_err(),
            Error::Upstream { .. }
        ));
    }
}
