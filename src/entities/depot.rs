//! Depot entity - A physical container storage and pickup location.
//!
//! Depots carry geocoordinates so catalog search and delivery pricing can
//! measure distances from a customer's postal code.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Depot database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "depots")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the depot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Houston Port Depot")
    #[sea_orm(unique)]
    pub name: String,
    /// Street address
    pub address: String,
    /// City the depot is located in
    pub city: String,
    /// Two-letter state code
    pub state: String,
    /// Postal code of the depot
    pub postal_code: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Defines relationships between Depot and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One depot stocks many container listings
    #[sea_orm(has_many = "super::container::Entity")]
    Containers,
}

impl Related<super::container::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Containers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
