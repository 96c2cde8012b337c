//! Contract container entity - A physical container assigned to a lease.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Contract container database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contract_containers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Contract this container is leased under
    pub contract_id: i64,
    /// ISO 6346 container number (e.g., "MSCU1234565")
    pub container_number: String,
    /// Free-text container type
    pub container_type: String,
    /// `assigned`, `picked_up` or `returned`
    pub status: String,
    /// Day the lessee collected the container
    pub picked_up_on: Option<Date>,
    /// Day the container came back
    pub returned_on: Option<Date>,
}

/// Defines relationships between `ContractContainer` and other entities
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
