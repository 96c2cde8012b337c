//! Invoice entity - The persisted result of a checkout.
//!
//! Totals are frozen at checkout time; later price changes on listings do not
//! alter an issued invoice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing invoice number (e.g., "INV-20260114-00042", numbered from the row id)
    #[sea_orm(unique)]
    pub invoice_number: String,
    /// Buyer name
    pub customer_name: String,
    /// Buyer email
    pub customer_email: String,
    /// Delivery method slug (e.g., "tilt-bed", "customer-pickup")
    pub delivery_method: String,
    /// Delivery postal code, if delivered
    pub postal_code: Option<String>,
    /// Sum of line totals
    pub subtotal: f64,
    /// Flat-rate delivery charge
    pub shipping: f64,
    /// Distance-based delivery surcharge
    pub distance_surcharge: f64,
    /// Grand total
    pub total: f64,
    /// `pending`, `paid` or `cancelled`
    pub status: String,
    /// When the invoice was issued
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One invoice has many line items
    #[sea_orm(has_many = "super::invoice_item::Entity")]
    Items,
}

impl Related<super::invoice_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
