//! Catalog business logic - Depots and container listings.
//!
//! This module provides creation, lookup and stock updates for depots and
//! listings, plus the startup seeding of both from config.toml. Search lives
//! in `core::search`.

use crate::{
    config::app::{AppConfig, ContainerSeed, DepotSeed},
    core::geo::is_valid_coordinate,
    entities::{Container, Depot, container, depot},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

/// Fields for a new depot
#[derive(Debug, Clone)]
pub struct NewDepot {
    /// Unique display name
    pub name: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// State code
    pub state: String,
    /// Postal code
    pub postal_code: String,
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

impl From<&DepotSeed> for NewDepot {
    fn from(seed: &DepotSeed) -> Self {
        Self {
            name: seed.name.clone(),
            address: seed.address.clone(),
            city: seed.city.clone(),
            state: seed.state.clone(),
            postal_code: seed.postal_code.clone(),
            latitude: seed.latitude,
            longitude: seed.longitude,
        }
    }
}

/// Fields for a new listing
#[derive(Debug, Clone)]
pub struct NewContainer {
    /// Unique SKU
    pub sku: String,
    /// Free-text type
    pub container_type: String,
    /// Free-text condition
    pub condition: String,
    /// Unit price
    pub price: f64,
    /// Units available
    pub quantity: i32,
    /// Tilt-bed delivery available
    pub tilt_bed_delivery: bool,
    /// Flatbed delivery available
    pub flatbed_delivery: bool,
    /// Depot pickup available
    pub pickup_available: bool,
}

impl From<&ContainerSeed> for NewContainer {
    fn from(seed: &ContainerSeed) -> Self {
        Self {
            sku: seed.sku.clone(),
            container_type: seed.container_type.clone(),
            condition: seed.condition.clone(),
            price: seed.price,
            quantity: seed.quantity,
            tilt_bed_delivery: seed.tilt_bed_delivery,
            flatbed_delivery: seed.flatbed_delivery,
            pickup_available: seed.pickup_available,
        }
    }
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity < 0 {
        return Err(Error::validation(format!(
            "Quantity cannot be negative (got {quantity})"
        )));
    }
    Ok(())
}

/// Retrieves all depots ordered by name.
pub async fn get_all_depots(db: &DatabaseConnection) -> Result<Vec<depot::Model>> {
    Depot::find()
        .order_by_asc(depot::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a depot by its unique ID.
pub async fn get_depot_by_id(db: &DatabaseConnection, depot_id: i64) -> Result<Option<depot::Model>> {
    Depot::find_by_id(depot_id).one(db).await.map_err(Into::into)
}

/// Finds a depot by its unique name.
pub async fn get_depot_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<depot::Model>> {
    Depot::find()
        .filter(depot::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a depot after validating its name and coordinates.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The coordinates are not on the globe
/// - The database insert fails (including a duplicate name)
pub async fn create_depot(db: &DatabaseConnection, new_depot: NewDepot) -> Result<depot::Model> {
    if new_depot.name.trim().is_empty() {
        return Err(Error::validation("Depot name cannot be empty"));
    }
    if !is_valid_coordinate(new_depot.latitude, new_depot.longitude) {
        return Err(Error::validation(format!(
            "Invalid depot coordinates ({}, {})",
            new_depot.latitude, new_depot.longitude
        )));
    }

    let model = depot::ActiveModel {
        name: Set(new_depot.name.trim().to_string()),
        address: Set(new_depot.address.trim().to_string()),
        city: Set(new_depot.city.trim().to_string()),
        state: Set(new_depot.state.trim().to_string()),
        postal_code: Set(new_depot.postal_code.trim().to_string()),
        latitude: Set(new_depot.latitude),
        longitude: Set(new_depot.longitude),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Finds a listing by SKU.
pub async fn get_container_by_sku(
    db: &DatabaseConnection,
    sku: &str,
) -> Result<Option<container::Model>> {
    Container::find()
        .filter(container::Column::Sku.eq(sku.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a listing stocked at `depot`, copying the depot's location.
///
/// # Errors
/// Returns an error if:
/// - The SKU, type or condition is empty
/// - The price is negative or not finite
/// - The quantity is negative
/// - The database insert fails (including a duplicate SKU)
pub async fn create_container(
    db: &DatabaseConnection,
    new_container: NewContainer,
    depot: &depot::Model,
) -> Result<container::Model> {
    if new_container.sku.trim().is_empty() {
        return Err(Error::validation("SKU cannot be empty"));
    }
    if new_container.container_type.trim().is_empty() {
        return Err(Error::validation("Container type cannot be empty"));
    }
    if new_container.condition.trim().is_empty() {
        return Err(Error::validation("Container condition cannot be empty"));
    }
    validate_price(new_container.price)?;
    validate_quantity(new_container.quantity)?;

    let now = chrono::Utc::now();
    let model = container::ActiveModel {
        sku: Set(new_container.sku.trim().to_string()),
        container_type: Set(new_container.container_type.trim().to_string()),
        condition: Set(new_container.condition.trim().to_string()),
        price: Set(new_container.price),
        depot_id: Set(Some(depot.id)),
        city: Set(depot.city.clone()),
        state: Set(depot.state.clone()),
        postal_code: Set(depot.postal_code.clone()),
        latitude: Set(Some(depot.latitude)),
        longitude: Set(Some(depot.longitude)),
        quantity: Set(new_container.quantity),
        tilt_bed_delivery: Set(new_container.tilt_bed_delivery),
        flatbed_delivery: Set(new_container.flatbed_delivery),
        pickup_available: Set(new_container.pickup_available),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Replaces the price and quantity of a listing.
///
/// # Errors
/// Returns an error if the price or quantity is invalid, the SKU does not
/// exist, or the update fails.
pub async fn update_container_stock(
    db: &DatabaseConnection,
    sku: &str,
    price: f64,
    quantity: i32,
) -> Result<container::Model> {
    validate_price(price)?;
    validate_quantity(quantity)?;

    let mut listing: container::ActiveModel = get_container_by_sku(db, sku)
        .await?
        .ok_or_else(|| Error::ContainerNotFound {
            sku: sku.to_string(),
        })?
        .into();

    listing.price = Set(price);
    listing.quantity = Set(quantity);
    listing.updated_at = Set(chrono::Utc::now());

    listing.update(db).await.map_err(Into::into)
}

/// Counts of rows created by [`seed_catalog`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Depots inserted
    pub depots_created: usize,
    /// Listings inserted
    pub containers_created: usize,
}

/// Seeds depots and listings from the configuration.
///
/// Depots are matched by name and listings by SKU; existing rows are left as
/// they are, so repeated startups do not overwrite edited prices or stock.
///
/// # Errors
/// Returns an error if a listing names a depot that neither exists nor is
/// seeded, if a seed entry fails validation, or if a database call fails.
pub async fn seed_catalog(db: &DatabaseConnection, config: &AppConfig) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for seed in &config.depots {
        if get_depot_by_name(db, &seed.name).await?.is_none() {
            create_depot(db, NewDepot::from(seed)).await?;
            summary.depots_created += 1;
        }
    }

    for seed in &config.containers {
        if get_container_by_sku(db, &seed.sku).await?.is_some() {
            debug!("Listing {} already present, skipping seed", seed.sku);
            continue;
        }
        let depot = get_depot_by_name(db, &seed.depot)
            .await?
            .ok_or_else(|| Error::DepotNotFound {
                name: seed.depot.clone(),
            })?;
        create_container(db, NewContainer::from(seed), &depot).await?;
        summary.containers_created += 1;
    }

    info!(
        "Catalog seed created {} depots and {} listings",
        summary.depots_created, summary.containers_created
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_depot_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let mut depot = test_depot("Houston", 29.7, -95.3);
        depot.name = "   ".to_string();
        let result = create_depot(&db, depot).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_depot(&db, test_depot("Nowhere", 95.0, 0.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        assert!(get_all_depots(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_container_validation() -> Result<()> {
        let (db, depot) = setup_with_depot().await?;

        let result = create_container(&db, test_container("", "40HC", "Cargo Worthy", 10.0), &depot).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_container(&db, test_container("SKU-1", "40HC", "  ", 10.0), &depot).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert!(get_container_by_sku(&db, "SKU-1").await?.is_none());

        let result = create_container(
            &db,
            test_container("SKU-1", "40HC", "Cargo Worthy", -5.0),
            &depot,
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount { amount: -5.0 }
        ));

        let result = create_container(
            &db,
            test_container("SKU-1", "40HC", "Cargo Worthy", f64::NAN),
            &depot,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        let mut negative = test_container("SKU-1", "40HC", "Cargo Worthy", 10.0);
        negative.quantity = -1;
        let result = create_container(&db, negative, &depot).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_container_copies_depot_location() -> Result<()> {
        let (db, depot) = setup_with_depot().await?;

        let listing = create_container(
            &db,
            test_container("40HC-CW-1", " 40' High Cube ", "Cargo Worthy", 2850.0),
            &depot,
        )
        .await?;

        assert_eq!(listing.container_type, "40' High Cube");
        assert_eq!(listing.depot_id, Some(depot.id));
        assert_eq!(listing.city, depot.city);
        assert_eq!(listing.postal_code, depot.postal_code);
        assert_eq!(listing.latitude, Some(depot.latitude));

        let found = get_container_by_sku(&db, "40HC-CW-1").await?.unwrap();
        assert_eq!(found.id, listing.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_container_stock() -> Result<()> {
        let (db, depot) = setup_with_depot().await?;
        create_container(&db, test_container("SKU-9", "20'", "WWT", 1500.0), &depot).await?;

        let updated = update_container_stock(&db, "SKU-9", 1400.0, 3).await?;
        assert_eq!(updated.price, 1400.0);
        assert_eq!(updated.quantity, 3);

        let result = update_container_stock(&db, "missing", 1.0, 1).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ContainerNotFound { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_catalog_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config = crate::config::app::parse_config(
            r#"
            [[depots]]
            name = "Houston Port"
            address = "100 Port Rd"
            city = "Houston"
            state = "TX"
            postal_code = "77029"
            latitude = 29.73
            longitude = -95.26

            [[containers]]
            sku = "40HC-CW-HOU"
            container_type = "40' High Cube"
            condition = "Cargo Worthy"
            price = 2850.0
            quantity = 12
            depot = "Houston Port"
            "#,
        )?;

        let first = seed_catalog(&db, &config).await?;
        assert_eq!(
            first,
            SeedSummary {
                depots_created: 1,
                containers_created: 1
            }
        );

        let second = seed_catalog(&db, &config).await?;
        assert_eq!(second, SeedSummary::default());
        assert_eq!(get_all_depots(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_catalog_unknown_depot() -> Result<()> {
        let db = setup_test_db().await?;
        let config = crate::config::app::parse_config(
            r#"
            [[containers]]
            sku = "X"
            container_type = "20'"
            condition = "WWT"
            price = 1.0
            quantity = 1
            depot = "Atlantis"
            "#,
        )?;

        let result = seed_catalog(&db, &config).await;
        assert!(matches!(result.unwrap_err(), Error::DepotNotFound { .. }));
        Ok(())
    }
}
