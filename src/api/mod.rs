//! HTTP API - axum routes over the core business logic.
//!
//! Handlers stay thin: extract, call one `core` function, wrap the result in
//! JSON. All request and response bodies use camelCase field names.

pub mod admin;
pub mod containers;
pub mod error;
pub mod leasing;
pub mod orders;
pub mod tracking;

use crate::{
    config::AppConfig,
    core::{geo::Geocoder, tracking::TrackingProvider},
};
use axum::{
    Router,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Geocoder, absent when no Google key is configured
    pub geocoder: Option<Arc<dyn Geocoder>>,
    /// Tracking provider
    pub tracker: Arc<dyn TrackingProvider>,
}

impl AppState {
    /// The geocoder as a trait object reference, if configured
    #[must_use]
    pub fn geocoder(&self) -> Option<&dyn Geocoder> {
        self.geocoder.as_deref()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(admin::health))
        .route("/api/admin/summary", get(admin::summary))
        .route("/api/admin/containers/:sku", patch(admin::update_stock))
        .route("/api/depots", get(admin::list_depots))
        .route("/api/containers", get(containers::search))
        .route("/api/containers/nearest-depot", post(containers::nearest_depot))
        .route("/api/containers/:sku", get(containers::detail))
        .route("/api/tracking/search", post(tracking::search))
        .route("/api/cart/quote", post(orders::quote))
        .route("/api/checkout", post(orders::checkout))
        .route("/api/invoices", get(orders::list_invoices))
        .route("/api/invoices/:number", get(orders::get_invoice))
        .route("/api/invoices/:number/status", patch(orders::update_status))
        .route(
            "/api/leasing/contracts",
            get(leasing::list_contracts).post(leasing::create_contract),
        )
        .route("/api/leasing/contracts/:id", get(leasing::get_contract))
        .route(
            "/api/leasing/contracts/:id/status",
            patch(leasing::update_contract_status),
        )
        .route(
            "/api/leasing/contracts/:id/containers",
            get(leasing::list_containers).post(leasing::assign_container),
        )
        .route(
            "/api/leasing/containers/:id/status",
            patch(leasing::update_container_status),
        )
        .route(
            "/api/leasing/contracts/:id/billing",
            get(leasing::list_billing).post(leasing::add_billing_entry),
        )
        .route(
            "/api/leasing/contracts/:id/billing/generate",
            post(leasing::generate_billing),
        )
        .route("/api/leasing/billing/:id/paid", post(leasing::mark_billing_paid))
        .route("/api/leasing/contracts/:id/per-diem", get(leasing::per_diem))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
