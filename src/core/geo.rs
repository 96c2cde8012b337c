//! Geographic helpers and the geocoding port.
//!
//! Distances are great-circle miles. The [`Geocoder`] trait is implemented by
//! `outbound::google` in production and by stubs in tests.

use crate::errors::Result;
use async_trait::async_trait;
use serde::Serialize;

const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A geocoded location
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Address as normalised by the geocoder
    pub formatted_address: Option<String>,
}

impl GeoPoint {
    /// A bare coordinate pair without an address
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            formatted_address: None,
        }
    }

    /// Great-circle distance to another coordinate, in miles
    #[must_use]
    pub fn miles_to(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_miles(self.latitude, self.longitude, latitude, longitude)
    }
}

/// Address to coordinate lookup
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocodes a free-text address or postal code.
    ///
    /// Returns `Ok(None)` when the geocoder found no match.
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>>;
}

/// Haversine distance between two coordinates, in miles
#[must_use]
pub fn haversine_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

/// Longitude scale factor at a latitude, for equirectangular ordering.
///
/// `(Δlat)² + (Δlng · k)²` orders points the same way as true distance over
/// the short ranges a delivery search covers, and needs only arithmetic, so
/// it can be evaluated inside the database.
#[must_use]
pub fn longitude_scale(latitude: f64) -> f64 {
    latitude.to_radians().cos().powi(2)
}

/// Checks that a coordinate pair is on the globe
#[must_use]
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        assert!(haversine_miles(29.76, -95.37, 29.76, -95.37).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_houston_to_dallas() {
        // Roughly 225 miles as the crow flies
        let miles = haversine_miles(29.7604, -95.3698, 32.7767, -96.7970);
        assert!((220.0..232.0).contains(&miles), "got {miles}");
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let there = haversine_miles(40.71, -74.0, 34.05, -118.24);
        let back = haversine_miles(34.05, -118.24, 40.71, -74.0);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_longitude_scale_shrinks_with_latitude() {
        assert!((longitude_scale(0.0) - 1.0).abs() < 1e-12);
        assert!(longitude_scale(60.0) < longitude_scale(30.0));
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(is_valid_coordinate(29.7, -95.3));
        assert!(!is_valid_coordinate(91.0, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::NAN));
    }
}
