//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod billing_schedule;
pub mod container;
pub mod contract_container;
pub mod depot;
pub mod invoice;
pub mod invoice_item;
pub mod lease_contract;

// Re-export specific types to avoid conflicts
pub use billing_schedule::{
    Column as BillingScheduleColumn, Entity as BillingSchedule, Model as BillingScheduleModel,
};
pub use container::{Column as ContainerColumn, Entity as Container, Model as ContainerModel};
pub use contract_container::{
    Column as ContractContainerColumn, Entity as ContractContainer,
    Model as ContractContainerModel,
};
pub use depot::{Column as DepotColumn, Entity as Depot, Model as DepotModel};
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use invoice_item::{
    Column as InvoiceItemColumn, Entity as InvoiceItem, Model as InvoiceItemModel,
};
pub use lease_contract::{
    Column as LeaseContractColumn, Entity as LeaseContract, Model as LeaseContractModel,
};
