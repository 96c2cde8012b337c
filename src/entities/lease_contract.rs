//! Lease contract entity - A leasing agreement for one or more containers.
//!
//! Status is stored as text (`pending`, `active`, `completed`, `terminated`);
//! `core::leasing::ContractStatus` validates the values on write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lease contract database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lease_contracts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the contract
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing contract number (e.g., "LC-20260114-00007", numbered from the row id)
    #[sea_orm(unique)]
    pub contract_number: String,
    /// Lessee name
    pub customer_name: String,
    /// Lessee contact email
    pub customer_email: String,
    /// Lifecycle status
    pub status: String,
    /// Depot the containers are released from
    pub origin_depot_id: Option<i64>,
    /// Free-text destination of the leased containers
    pub destination: String,
    /// First day of the lease
    pub start_date: Date,
    /// Last day of the lease
    pub end_date: Date,
    /// Rate billed per month of the term
    pub monthly_rate: f64,
    /// Days a container may stay out past the term before per diem applies
    pub free_days: i32,
    /// Daily fee charged past the free-day allowance
    pub per_diem_rate: f64,
    /// When the contract was created
    pub created_at: DateTimeUtc,
    /// When the contract was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `LeaseContract` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One contract covers many physical containers
    #[sea_orm(has_many = "super::contract_container::Entity")]
    ContractContainers,
    /// One contract has many billing schedule rows
    #[sea_orm(has_many = "super::billing_schedule::Entity")]
    BillingSchedule,
}

impl Related<super::contract_container::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractContainers.def()
    }
}

impl Related<super::billing_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingSchedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
