//! Container entity - A container listing in the sales catalog.
//!
//! Listings are created by catalog import (or config seeding) and read by
//! search. `container_type`, `condition` and `sku` are free text as supplied
//! by depots; `core::category` classifies them for display without mutating
//! the row. Location columns are copied from the depot so listings without a
//! depot can still be searched by city and postal code.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Container listing database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "containers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the listing
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stock keeping unit, unique per listing
    #[sea_orm(unique)]
    pub sku: String,
    /// Free-text type (e.g., "40' High Cube", "20ft Refrigerated")
    pub container_type: String,
    /// Free-text condition grade (e.g., "Cargo Worthy", "IICL", "Brand New")
    pub condition: String,
    /// Unit sale price in dollars
    pub price: f64,
    /// Depot holding this stock, if known
    pub depot_id: Option<i64>,
    /// City where the stock is located
    pub city: String,
    /// State where the stock is located
    pub state: String,
    /// Postal code where the stock is located
    pub postal_code: String,
    /// Latitude, if geocoded
    pub latitude: Option<f64>,
    /// Longitude, if geocoded
    pub longitude: Option<f64>,
    /// Units available
    pub quantity: i32,
    /// Can be delivered by tilt-bed truck
    pub tilt_bed_delivery: bool,
    /// Can be delivered by flatbed truck
    pub flatbed_delivery: bool,
    /// Can be picked up at the depot
    pub pickup_available: bool,
    /// When the listing was created
    pub created_at: DateTimeUtc,
    /// When the listing was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Container and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each listing may belong to one depot
    #[sea_orm(
        belongs_to = "super::depot::Entity",
        from = "Column::DepotId",
        to = "super::depot::Column::Id"
    )]
    Depot,
}

impl Related<super::depot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Depot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
