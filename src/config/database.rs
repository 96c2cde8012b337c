//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! models without hand-written SQL or a migration tool.

use crate::entities::{
    BillingSchedule, Container, ContractContainer, Depot, Invoice, InvoiceItem, LeaseContract,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::TableCreateStatement,
};
use tracing::debug;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/container_market.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

fn table_for<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    table
}

/// Creates all necessary database tables from the entity definitions.
///
/// Existing tables are left untouched, so this is safe to call on every start.
/// Parents are created before children so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        table_for(&schema, Depot),
        table_for(&schema, Container),
        table_for(&schema, LeaseContract),
        table_for(&schema, ContractContainer),
        table_for(&schema, BillingSchedule),
        table_for(&schema, Invoice),
        table_for(&schema, InvoiceItem),
    ];

    for table in &tables {
        db.execute(builder.build(table)).await?;
    }

    Ok(())
}
