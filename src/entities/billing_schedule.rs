//! Billing schedule entity - One scheduled charge against a lease contract.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing schedule database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "billing_schedule")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Contract being billed
    pub contract_id: i64,
    /// Day the charge is due
    pub due_date: Date,
    /// Amount due in dollars
    pub amount: f64,
    /// What the charge is for
    pub description: String,
    /// `rent` for generated monthly rows, `charge` for manual entries
    pub kind: String,
    /// `pending` or `paid`
    pub status: String,
}

/// Defines relationships between `BillingSchedule` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each row belongs to one contract
    #[sea_orm(
        belongs_to = "super::lease_contract::Entity",
        from = "Column::ContractId",
        to = "super::lease_contract::Column::Id"
    )]
    Contract,
}

impl Related<super::lease_contract::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contract.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
