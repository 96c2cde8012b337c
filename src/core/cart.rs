//! Cart pricing business logic.
//!
//! Carts are owned by the client; the server never stores one. This module
//! holds the line-item arithmetic so every client prices a cart the same way:
//! subtotal, a flat delivery rate per container for the chosen method, and a
//! per-mile surcharge past the free delivery radius. Nothing here checks
//! inventory, so a cart can hold more units than a listing has in stock.

use crate::{
    config::app::PricingConfig,
    core::geo::{Geocoder, haversine_miles},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{debug, warn};

/// How containers reach the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMethod {
    /// Tilt-bed truck, set down on the ground
    TiltBed,
    /// Flatbed truck, customer unloads
    Flatbed,
    /// Customer collects at the depot
    CustomerPickup,
    /// Wholesale orders, freight arranged separately
    Wholesale,
}

impl DeliveryMethod {
    /// The slug stored on invoices
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TiltBed => "tilt-bed",
            Self::Flatbed => "flatbed",
            Self::CustomerPickup => "customer-pickup",
            Self::Wholesale => "wholesale",
        }
    }

    /// Whether the seller drives the containers to the customer
    #[must_use]
    pub const fn delivers(self) -> bool {
        matches!(self, Self::TiltBed | Self::Flatbed)
    }

    /// Flat rate charged per container
    #[must_use]
    pub const fn flat_rate(self, rates: &PricingConfig) -> f64 {
        match self {
            Self::TiltBed => rates.tilt_bed_rate,
            Self::Flatbed => rates.flatbed_rate,
            Self::CustomerPickup | Self::Wholesale => 0.0,
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tilt-bed" => Ok(Self::TiltBed),
            "flatbed" => Ok(Self::Flatbed),
            "customer-pickup" => Ok(Self::CustomerPickup),
            "wholesale" => Ok(Self::Wholesale),
            other => Err(Error::validation(format!("Unknown delivery method: {other}"))),
        }
    }
}

/// What a cart line is for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineKind {
    /// Buying a listed container
    #[serde(rename_all = "camelCase")]
    Purchase {
        /// Listing SKU
        sku: String,
        /// Type as shown when added
        container_type: String,
        /// Condition as shown when added
        condition: String,
    },
    /// A one-way lease record
    #[serde(rename_all = "camelCase")]
    Lease {
        /// Leasing record identifier
        leasing_record_id: String,
        /// Pickup location
        origin: String,
        /// Drop-off location
        destination: String,
    },
}

/// Identity of a cart line; adding the same key again merges quantities
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// Purchase line by SKU
    Sku(String),
    /// Lease line by record id
    Lease(String),
}

/// One cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Purchase or lease details
    #[serde(flatten)]
    pub kind: LineKind,
    /// Unit price in dollars
    pub price: f64,
    /// Units
    pub quantity: u32,
}

impl CartItem {
    /// Key used to merge repeated adds
    #[must_use]
    pub fn key(&self) -> ItemKey {
        match &self.kind {
            LineKind::Purchase { sku, .. } => ItemKey::Sku(sku.clone()),
            LineKind::Lease {
                leasing_record_id, ..
            } => ItemKey::Lease(leasing_record_id.clone()),
        }
    }

    /// Human-readable line description
    #[must_use]
    pub fn description(&self) -> String {
        match &self.kind {
            LineKind::Purchase {
                container_type,
                condition,
                ..
            } => format!("{} {}", container_type.trim(), condition.trim())
                .trim()
                .to_string(),
            LineKind::Lease {
                origin,
                destination,
                ..
            } => format!("Lease {} to {}", origin.trim(), destination.trim()),
        }
    }

    /// `price * quantity`
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    fn validate(&self) -> Result<()> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidAmount { amount: self.price });
        }
        if self.quantity == 0 {
            return Err(Error::validation("Quantity must be at least 1"));
        }
        let identity_blank = match &self.kind {
            LineKind::Purchase { sku, .. } => sku.trim().is_empty(),
            LineKind::Lease {
                leasing_record_id, ..
            } => leasing_record_id.trim().is_empty(),
        };
        if identity_blank {
            return Err(Error::validation("Cart item needs a SKU or leasing record id"));
        }
        Ok(())
    }
}

/// An in-memory cart. Later writes to the same line replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds a line, merging quantity into an existing line with the same key.
    ///
    /// # Errors
    /// Returns an error if the price is invalid, the quantity is zero, or the
    /// line has no SKU or leasing record id.
    pub fn add(&mut self, item: CartItem) -> Result<()> {
        item.validate()?;
        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.key() == key) {
            let quantity = existing.quantity.saturating_add(item.quantity);
            *existing = CartItem { quantity, ..item };
        } else {
            self.items.push(item);
        }
        Ok(())
    }

    /// Sets a line's quantity; zero removes it. Returns false for unknown keys.
    pub fn set_quantity(&mut self, key: &ItemKey, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(key).is_some();
        }
        match self.items.iter_mut().find(|i| &i.key() == key) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes a line
    pub fn remove(&mut self, key: &ItemKey) -> Option<CartItem> {
        let index = self.items.iter().position(|i| &i.key() == key)?;
        Some(self.items.remove(index))
    }

    /// Empties the cart, as after checkout
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Current lines in insertion order
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Prices the cart
    ///
    /// # Errors
    /// See [`quote`].
    pub fn quote(
        &self,
        method: DeliveryMethod,
        miles: Option<f64>,
        rates: &PricingConfig,
    ) -> Result<Quote> {
        quote(&self.items, method, miles, rates)
    }
}

/// A priced cart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Sum of line totals
    pub subtotal: f64,
    /// Flat delivery charge
    pub shipping: f64,
    /// Per-mile charge past the free radius
    pub distance_surcharge: f64,
    /// Grand total
    pub total: f64,
    /// Units across all lines
    pub total_quantity: u32,
    /// Delivery distance used for the surcharge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_miles: Option<f64>,
    /// Delivery method priced
    pub delivery_method: DeliveryMethod,
}

/// Rounds to whole cents
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `Σ price × quantity`
#[must_use]
pub fn subtotal(items: &[CartItem]) -> f64 {
    round_cents(items.iter().map(CartItem::line_total).sum())
}

/// Units across all lines
#[must_use]
pub fn total_quantity(items: &[CartItem]) -> u32 {
    items
        .iter()
        .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
}

/// `flat_rate(method) × total_quantity`; zero for pickup and wholesale.
#[must_use]
pub fn shipping(method: DeliveryMethod, total_quantity: u32, rates: &PricingConfig) -> f64 {
    round_cents(method.flat_rate(rates) * f64::from(total_quantity))
}

/// `max(0, miles − free_miles) × per_mile_rate × total_quantity` for
/// delivered methods; zero otherwise or when the distance is unknown.
#[must_use]
pub fn distance_surcharge(
    method: DeliveryMethod,
    miles: Option<f64>,
    total_quantity: u32,
    rates: &PricingConfig,
) -> f64 {
    if !method.delivers() {
        return 0.0;
    }
    let Some(miles) = miles.filter(|m| m.is_finite()) else {
        return 0.0;
    };
    let billable = (miles - rates.free_miles).max(0.0);
    round_cents(billable * rates.per_mile_rate * f64::from(total_quantity))
}

/// Prices a list of cart lines.
///
/// # Errors
/// Returns an error if any line has an invalid price, zero quantity or no
/// identity.
pub fn quote(
    items: &[CartItem],
    method: DeliveryMethod,
    miles: Option<f64>,
    rates: &PricingConfig,
) -> Result<Quote> {
    for item in items {
        item.validate()?;
    }

    let total_quantity = total_quantity(items);
    let subtotal = subtotal(items);
    let shipping = shipping(method, total_quantity, rates);
    let distance_surcharge = distance_surcharge(method, miles, total_quantity, rates);

    Ok(Quote {
        subtotal,
        shipping,
        distance_surcharge,
        total: round_cents(subtotal + shipping + distance_surcharge),
        total_quantity,
        delivery_miles: miles.map(round_cents),
        delivery_method: method,
    })
}

/// Distance from a depot to a customer's postal code.
///
/// Returns `Ok(None)` when there is nothing to measure: no geocoder, no
/// postal code or no depot.
///
/// # Errors
/// Returns an error if the depot does not exist, the postal code cannot be
/// geocoded, or a lookup fails.
pub async fn delivery_miles(
    db: &DatabaseConnection,
    geocoder: Option<&dyn Geocoder>,
    postal_code: Option<&str>,
    depot_id: Option<i64>,
) -> Result<Option<f64>> {
    let (Some(postal_code), Some(depot_id)) = (
        postal_code.map(str::trim).filter(|p| !p.is_empty()),
        depot_id,
    ) else {
        return Ok(None);
    };
    let Some(geocoder) = geocoder else {
        warn!("No geocoder configured, quoting without a distance surcharge");
        return Ok(None);
    };

    let depot = crate::core::catalog::get_depot_by_id(db, depot_id)
        .await?
        .ok_or_else(|| Error::DepotNotFound {
            name: depot_id.to_string(),
        })?;
    let point = geocoder
        .geocode(postal_code)
        .await?
        .ok_or_else(|| Error::Geocoding {
            message: format!("No location found for postal code {postal_code}"),
        })?;

    let miles = haversine_miles(point.latitude, point.longitude, depot.latitude, depot.longitude);
    debug!("Depot {} is {miles:.1} miles from {postal_code}", depot.name);
    Ok(Some(miles))
}
