//! Invoice item entity - One priced line of an invoice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Invoice this line belongs to
    pub invoice_id: i64,
    /// Listing SKU for purchases
    pub sku: Option<String>,
    /// Lease record id for lease lines
    pub leasing_record_id: Option<String>,
    /// Human-readable line description
    pub description: String,
    /// Price per unit
    pub unit_price: f64,
    /// Units ordered
    pub quantity: i32,
    /// `unit_price * quantity`
    pub line_total: f64,
}

/// Defines relationships between `InvoiceItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one invoice
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
