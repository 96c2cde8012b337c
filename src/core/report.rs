//! Admin reporting business logic.
//!
//! The back-office dashboard reads one summary of inventory, leasing and
//! sales. Figures come straight from the database; a failed query fails the
//! whole report rather than showing placeholder numbers.

use crate::{
    core::{
        cart::round_cents,
        invoice::InvoiceStatus,
        leasing::{BillingStatus, ContractStatus},
    },
    entities::{
        BillingSchedule, Container, Invoice, LeaseContract, billing_schedule, invoice,
        lease_contract,
    },
    errors::Result,
};
use sea_orm::{PaginatorTrait, prelude::*};
use serde::Serialize;
use std::collections::BTreeMap;

/// Dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    /// Number of listings
    pub total_listings: u64,
    /// Units in stock across listings
    pub total_units: i64,
    /// `Σ price × quantity`
    pub inventory_value: f64,
    /// Listing count per condition grade
    pub listings_by_condition: BTreeMap<String, u64>,
    /// Contracts in `active` status
    pub active_contracts: u64,
    /// Sum of pending billing rows
    pub outstanding_billing: f64,
    /// Invoices issued
    pub invoice_count: u64,
    /// Total of invoices that were not cancelled
    pub invoiced_revenue: f64,
}

/// Builds the admin dashboard summary.
///
/// # Errors
/// Returns an error if any database query fails.
pub async fn admin_summary(db: &DatabaseConnection) -> Result<AdminSummary> {
    let containers = Container::find().all(db).await?;

    let mut listings_by_condition = BTreeMap::new();
    let mut total_units = 0_i64;
    let mut inventory_value = 0.0;
    for listing in &containers {
        *listings_by_condition
            .entry(listing.condition.trim().to_string())
            .or_insert(0_u64) += 1;
        total_units += i64::from(listing.quantity);
        inventory_value += listing.price * f64::from(listing.quantity);
    }

    let active_contracts = LeaseContract::find()
        .filter(lease_contract::Column::Status.eq(ContractStatus::Active.as_str()))
        .count(db)
        .await?;

    let outstanding_billing: f64 = BillingSchedule::find()
        .filter(billing_schedule::Column::Status.eq(BillingStatus::Pending.as_str()))
        .all(db)
        .await?
        .iter()
        .map(|row| row.amount)
        .sum();

    let invoices = Invoice::find().all(db).await?;
    let invoiced_revenue: f64 = invoices
        .iter()
        .filter(|inv| inv.status != InvoiceStatus::Cancelled.as_str())
        .map(|inv: &invoice::Model| inv.total)
        .sum();

    Ok(AdminSummary {
        total_listings: containers.len() as u64,
        total_units,
        inventory_value: round_cents(inventory_value),
        listings_by_condition,
        active_contracts,
        outstanding_billing: round_cents(outstanding_billing),
        invoice_count: invoices.len() as u64,
        invoiced_revenue: round_cents(invoiced_revenue),
    })
}
