//! Shared test utilities for the container market backend.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults, plus stub geocoding and
//! tracking providers so no test touches the network.

use crate::{
    api::{self, AppState},
    config::AppConfig,
    core::{
        catalog::{self, NewContainer, NewDepot},
        geo::{GeoPoint, Geocoder},
        leasing::NewContract,
        tracking::{
            TrackingEvent, TrackingProvider, TrackingQuery, TrackingResult, UnconfiguredTracker,
        },
    },
    entities,
    errors::{Error, Result},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tower::ServiceExt;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Depot input with sensible defaults.
///
/// # Defaults
/// * `city`: same as the name
/// * `state`: "TX"
/// * `postal_code`: "77029"
pub fn test_depot(name: &str, latitude: f64, longitude: f64) -> NewDepot {
    NewDepot {
        name: name.to_string(),
        address: "100 Terminal Rd".to_string(),
        city: name.to_string(),
        state: "TX".to_string(),
        postal_code: "77029".to_string(),
        latitude,
        longitude,
    }
}

/// Creates a depot with a specific postal code and coordinates.
pub async fn create_test_depot(
    db: &DatabaseConnection,
    name: &str,
    postal_code: &str,
    latitude: f64,
    longitude: f64,
) -> Result<entities::depot::Model> {
    let mut depot = test_depot(name, latitude, longitude);
    depot.postal_code = postal_code.to_string();
    catalog::create_depot(db, depot).await
}

/// Creates a test database with a single Houston depot.
pub async fn setup_with_depot() -> Result<(DatabaseConnection, entities::depot::Model)> {
    let db = setup_test_db().await?;
    let depot = create_test_depot(&db, "Houston", "77029", 29.73, -95.26).await?;
    Ok((db, depot))
}

/// Listing input with sensible defaults.
///
/// # Defaults
/// * `quantity`: 1
/// * all delivery options available
pub fn test_container(sku: &str, container_type: &str, condition: &str, price: f64) -> NewContainer {
    NewContainer {
        sku: sku.to_string(),
        container_type: container_type.to_string(),
        condition: condition.to_string(),
        price,
        quantity: 1,
        tilt_bed_delivery: true,
        flatbed_delivery: true,
        pickup_available: true,
    }
}

/// Creates a listing stocked at the given depot.
pub async fn create_test_listing(
    db: &DatabaseConnection,
    depot: &entities::depot::Model,
    sku: &str,
    container_type: &str,
    condition: &str,
    price: f64,
) -> Result<entities::container::Model> {
    catalog::create_container(db, test_container(sku, container_type, condition, price), depot)
        .await
}

/// Lease contract input with sensible defaults.
///
/// # Defaults
/// * term: 2026-01-01 to 2026-06-30
/// * `monthly_rate`: 250.0
/// * `free_days`: 10
/// * `per_diem_rate`: 35.0
pub fn test_contract() -> NewContract {
    NewContract {
        customer_name: "Gulf Freight LLC".to_string(),
        customer_email: "ops@gulffreight.example".to_string(),
        origin_depot_id: None,
        destination: "Denver, CO".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
        end_date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap_or_default(),
        monthly_rate: 250.0,
        free_days: 10,
        per_diem_rate: 35.0,
    }
}

/// Geocoder answering from a fixed table
#[derive(Default)]
pub struct StubGeocoder {
    points: HashMap<String, GeoPoint>,
    failing: bool,
    calls: AtomicUsize,
}

impl StubGeocoder {
    /// A geocoder that knows no addresses
    pub fn new() -> Self {
        Self::default()
    }

    /// A geocoder whose every lookup fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Adds a known address
    #[must_use]
    pub fn with(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        let point = GeoPoint {
            formatted_address: Some(format!("{address}, USA")),
            ..GeoPoint::new(latitude, longitude)
        };
        self.points.insert(address.to_string(), point);
        self
    }

    /// Number of lookups made
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::Geocoding {
                message: "stub geocoder offline".to_string(),
            });
        }
        Ok(self.points.get(address.trim()).cloned())
    }
}

/// What a [`StubTracker`] answers
#[derive(Debug, Clone, Copy)]
pub enum StubOutcome {
    /// A one-event shipment
    Found,
    /// No shipment for the reference
    NotFound,
    /// Upstream rate limit
    RateLimited,
    /// Upstream credits exhausted
    NoCredits,
}

/// Tracking provider with a fixed answer
pub struct StubTracker(pub StubOutcome);

#[async_trait]
impl TrackingProvider for StubTracker {
    async fn track(&self, query: &TrackingQuery) -> Result<Option<TrackingResult>> {
        match self.0 {
            StubOutcome::Found => Ok(Some(TrackingResult {
                container_number: query.number.clone(),
                carrier: "Maersk".to_string(),
                status: "Discharged".to_string(),
                origin: "Ningbo, CN".to_string(),
                destination: "Houston, US".to_string(),
                departure: Some("2026-08-01".to_string()),
                eta: Some("2026-09-10".to_string()),
                vessel: None,
                voyage: None,
                events: vec![TrackingEvent {
                    date: Some("2026-09-10".to_string()),
                    location: "Houston, US".to_string(),
                    description: "Discharged".to_string(),
                    vessel: None,
                }],
            })),
            StubOutcome::NotFound => Ok(None),
            StubOutcome::RateLimited => Err(Error::RateLimited),
            StubOutcome::NoCredits => Err(Error::InsufficientCredits),
        }
    }
}

/// API state over a fresh in-memory database with default configuration and
/// no tracking credentials.
pub async fn test_state(geocoder: StubGeocoder) -> Result<AppState> {
    Ok(AppState {
        db: setup_test_db().await?,
        config: Arc::new(AppConfig::default()),
        geocoder: Some(Arc::new(geocoder)),
        tracker: Arc::new(UnconfiguredTracker),
    })
}

/// Router over [`test_state`] with the given tracking provider.
pub async fn test_app_with_tracker(tracker: impl TrackingProvider + 'static) -> Result<Router> {
    let state = AppState {
        tracker: Arc::new(tracker),
        ..test_state(StubGeocoder::new()).await?
    };
    Ok(api::router(state))
}

/// Sends one request through the router and decodes the JSON answer.
///
/// Panics if the router fails or the body is not JSON; only for tests.
#[allow(clippy::unwrap_used)]
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(json) => request.body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
