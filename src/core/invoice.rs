//! Invoice business logic - Turns a priced cart into a persisted invoice.
//!
//! Checkout validates the submitted cart, prices it with the same rules the
//! quote endpoint uses, and writes the invoice header and its lines inside one
//! database transaction. Listing stock is not reserved or decremented here.

use crate::{
    config::app::PricingConfig,
    core::{
        cart::{self, CartItem, DeliveryMethod, LineKind},
        geo::Geocoder,
    },
    entities::{Invoice, InvoiceItem, invoice, invoice_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::info;

/// Lifecycle of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Issued, awaiting payment
    Pending,
    /// Settled
    Paid,
    /// Voided
    Cancelled,
}

impl InvoiceStatus {
    /// Stored text form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(Error::validation(format!("Unknown invoice status: {other}"))),
        }
    }
}

/// A checkout submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Billing name
    pub customer_name: String,
    /// Billing email
    pub customer_email: String,
    /// Chosen delivery method
    pub delivery_method: DeliveryMethod,
    /// Delivery postal code, used for the distance surcharge
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Depot the order ships from
    #[serde(default)]
    pub depot_id: Option<i64>,
    /// Cart lines
    pub items: Vec<CartItem>,
}

/// An invoice with its lines
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceWithItems {
    /// Header
    #[serde(flatten)]
    pub invoice: invoice::Model,
    /// Lines in insertion order
    pub items: Vec<invoice_item::Model>,
}

fn validate_checkout(request: &CheckoutRequest) -> Result<()> {
    if request.items.is_empty() {
        return Err(Error::validation("Cart is empty"));
    }
    if request.customer_name.trim().is_empty() {
        return Err(Error::validation("Customer name cannot be empty"));
    }
    let email = request.customer_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::validation("A valid customer email is required"));
    }
    if request.delivery_method.delivers()
        && request
            .postal_code
            .as_deref()
            .is_none_or(|p| p.trim().is_empty())
    {
        return Err(Error::validation(
            "A delivery postal code is required for truck delivery",
        ));
    }
    Ok(())
}

fn invoice_number(now: chrono::DateTime<chrono::Utc>, id: i64) -> String {
    format!("INV-{}-{id:05}", now.format("%Y%m%d"))
}

/// Unique stand-in written until the row id is known
fn provisional_number(now: chrono::DateTime<chrono::Utc>) -> String {
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros());
    format!("INV-PENDING-{nanos}")
}

/// Checks out a cart and stores the resulting invoice.
///
/// The distance surcharge uses the geocoded postal code and the given depot
/// when both are known; otherwise the order is priced without one.
///
/// # Errors
/// Returns an error if the cart or customer details are invalid, the depot or
/// postal code cannot be resolved, or the database write fails.
pub async fn checkout(
    db: &DatabaseConnection,
    geocoder: Option<&dyn Geocoder>,
    request: &CheckoutRequest,
    rates: &PricingConfig,
) -> Result<InvoiceWithItems> {
    validate_checkout(request)?;

    let miles = if request.delivery_method.delivers() {
        cart::delivery_miles(
            db,
            geocoder,
            request.postal_code.as_deref(),
            request.depot_id,
        )
        .await?
    } else {
        None
    };
    let quote = cart::quote(&request.items, request.delivery_method, miles, rates)?;

    let now = chrono::Utc::now();
    let txn = db.begin().await?;

    let header = invoice::ActiveModel {
        invoice_number: Set(provisional_number(now)),
        customer_name: Set(request.customer_name.trim().to_string()),
        customer_email: Set(request.customer_email.trim().to_string()),
        delivery_method: Set(request.delivery_method.as_str().to_string()),
        postal_code: Set(request
            .postal_code
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)),
        subtotal: Set(quote.subtotal),
        shipping: Set(quote.shipping),
        distance_surcharge: Set(quote.distance_surcharge),
        total: Set(quote.total),
        status: Set(InvoiceStatus::Pending.as_str().to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    // The number comes from the row id so concurrent checkouts never collide
    let number = invoice_number(now, header.id);
    let mut numbered: invoice::ActiveModel = header.into();
    numbered.invoice_number = Set(number);
    let header = numbered.update(&txn).await?;

    let mut items = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let quantity = i32::try_from(line.quantity)
            .map_err(|_| Error::validation(format!("Quantity too large: {}", line.quantity)))?;
        let (sku, leasing_record_id) = match &line.kind {
            LineKind::Purchase { sku, .. } => (Some(sku.trim().to_string()), None),
            LineKind::Lease {
                leasing_record_id, ..
            } => (None, Some(leasing_record_id.trim().to_string())),
        };
        let item = invoice_item::ActiveModel {
            invoice_id: Set(header.id),
            sku: Set(sku),
            leasing_record_id: Set(leasing_record_id),
            description: Set(line.description()),
            unit_price: Set(line.price),
            quantity: Set(quantity),
            line_total: Set(cart::round_cents(line.line_total())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    info!(
        "Issued invoice {} for {} ({} items, total {:.2})",
        header.invoice_number,
        header.customer_email,
        items.len(),
        header.total
    );

    Ok(InvoiceWithItems {
        invoice: header,
        items,
    })
}

async fn with_items(
    db: &DatabaseConnection,
    invoice: Option<invoice::Model>,
) -> Result<Option<InvoiceWithItems>> {
    let Some(invoice) = invoice else {
        return Ok(None);
    };
    let items = InvoiceItem::find()
        .filter(invoice_item::Column::InvoiceId.eq(invoice.id))
        .order_by_asc(invoice_item::Column::Id)
        .all(db)
        .await?;
    Ok(Some(InvoiceWithItems { invoice, items }))
}

/// Looks up an invoice and its lines by id
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_invoice(db: &DatabaseConnection, id: i64) -> Result<Option<InvoiceWithItems>> {
    let invoice = Invoice::find_by_id(id).one(db).await?;
    with_items(db, invoice).await
}

/// Looks up an invoice and its lines by invoice number
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_invoice_by_number(
    db: &DatabaseConnection,
    invoice_number: &str,
) -> Result<Option<InvoiceWithItems>> {
    let invoice = Invoice::find()
        .filter(invoice::Column::InvoiceNumber.eq(invoice_number.trim()))
        .one(db)
        .await?;
    with_items(db, invoice).await
}

/// All invoice headers, newest first
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_invoices(db: &DatabaseConnection) -> Result<Vec<invoice::Model>> {
    Invoice::find()
        .order_by_desc(invoice::Column::CreatedAt)
        .order_by_desc(invoice::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sets an invoice's status. Any status may follow any other.
///
/// # Errors
/// Returns `InvoiceNotFound` for an unknown number, or a database error.
pub async fn update_invoice_status(
    db: &DatabaseConnection,
    invoice_number: &str,
    status: InvoiceStatus,
) -> Result<invoice::Model> {
    let invoice = Invoice::find()
        .filter(invoice::Column::InvoiceNumber.eq(invoice_number.trim()))
        .one(db)
        .await?
        .ok_or_else(|| Error::InvoiceNotFound {
            number: invoice_number.to_string(),
        })?;

    let mut active: invoice::ActiveModel = invoice.into();
    active.status = Set(status.as_str().to_string());
    let updated = active.update(db).await?;
    info!("Invoice {} marked {status}", updated.invoice_number);
    Ok(updated)
}
