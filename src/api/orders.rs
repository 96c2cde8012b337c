//! Cart quoting, checkout and invoice endpoints.

use super::AppState;
use crate::{
    core::{
        cart::{self, CartItem, DeliveryMethod, Quote},
        invoice::{self, CheckoutRequest, InvoiceStatus, InvoiceWithItems},
    },
    entities::invoice as invoice_entity,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

/// Body of `POST /api/cart/quote`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    items: Vec<CartItem>,
    delivery_method: DeliveryMethod,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    depot_id: Option<i64>,
}

/// Body of `PATCH /api/invoices/:number/status`
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: String,
}

/// `POST /api/cart/quote`
pub async fn quote(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<Quote>> {
    let Json(request) = payload?;
    let miles = if request.delivery_method.delivers() {
        cart::delivery_miles(
            &state.db,
            state.geocoder(),
            request.postal_code.as_deref(),
            request.depot_id,
        )
        .await?
    } else {
        None
    };
    cart::quote(
        &request.items,
        request.delivery_method,
        miles,
        &state.config.pricing,
    )
    .map(Json)
}

/// `POST /api/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InvoiceWithItems>)> {
    let Json(request) = payload?;
    let created = invoice::checkout(
        &state.db,
        state.geocoder(),
        &request,
        &state.config.pricing,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/invoices`
pub async fn list_invoices(State(state): State<AppState>) -> Result<Json<Vec<invoice_entity::Model>>> {
    invoice::list_invoices(&state.db).await.map(Json)
}

/// `GET /api/invoices/:number`
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<InvoiceWithItems>> {
    invoice::get_invoice_by_number(&state.db, &number)
        .await?
        .map(Json)
        .ok_or(Error::InvoiceNotFound { number })
}

/// `PATCH /api/invoices/:number/status`
pub async fn update_status(
    State(state): State<AppState>,
    Path(number): Path<String>,
    payload: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<invoice_entity::Model>> {
    let Json(update) = payload?;
    let status: InvoiceStatus = update.status.parse()?;
    invoice::update_invoice_status(&state.db, &number, status)
        .await
        .map(Json)
}
