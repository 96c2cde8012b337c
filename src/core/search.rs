//! Catalog search business logic.
//!
//! Filters map directly onto SQL conditions: case-insensitive substring
//! matches for free text, an IN-list for conditions and an inclusive price
//! range. A postal code is tried as an exact match first; when nothing is
//! stocked there, the code is geocoded and results are ordered by distance
//! instead. If geocoding is unavailable or fails the postal code is dropped
//! and the remaining filters still apply.

use crate::{
    config::app::PhotoConfig,
    core::{
        category::{ListingCategory, categorize},
        geo::{GeoPoint, Geocoder, haversine_miles, longitude_scale},
    },
    entities::{Container, Depot, container, depot},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, Order, PaginatorTrait, QueryOrder, Select,
    prelude::*,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Catalog search filters. Empty strings and lists mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// Free text matched against SKU, type, condition and city
    pub query: Option<String>,
    /// Any-of substrings of the container type
    pub types: Vec<String>,
    /// Any-of condition grades, compared case-insensitively
    pub conditions: Vec<String>,
    /// Substring of the city
    pub city: Option<String>,
    /// Postal code, exact match with a distance fallback
    pub postal_code: Option<String>,
    /// Inclusive lower price bound
    pub price_min: Option<f64>,
    /// Inclusive upper price bound
    pub price_max: Option<f64>,
    /// 1-based page number
    pub page: Option<u64>,
}

/// One listing in a result page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerResult {
    /// The stored listing
    #[serde(flatten)]
    pub container: container::Model,
    /// Resolved title and photos
    pub category: ListingCategory,
    /// Miles from the searched location, for distance searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

impl ContainerResult {
    fn new(container: container::Model, photos: &PhotoConfig, distance_miles: Option<f64>) -> Self {
        let category = categorize(
            &container.container_type,
            &container.condition,
            Some(&container.sku),
            photos,
        );
        Self {
            container,
            category,
            distance_miles,
        }
    }
}

/// The geocoded location a distance search was ordered from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchedLocation {
    /// Postal code as entered
    pub postal_code: String,
    /// Latitude of the geocoded postal code
    pub latitude: f64,
    /// Longitude of the geocoded postal code
    pub longitude: f64,
    /// Address returned by the geocoder
    pub formatted_address: Option<String>,
}

/// The depot closest to a searched location
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestDepotInfo {
    /// Depot id
    pub id: i64,
    /// Depot name
    pub name: String,
    /// Depot city
    pub city: String,
    /// Depot state
    pub state: String,
    /// Depot postal code
    pub postal_code: String,
    /// Miles from the searched location
    pub distance_miles: f64,
}

/// Location details attached to distance searches
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepotInfo {
    /// Where the search was measured from
    pub searched_location: SearchedLocation,
    /// Closest depot, if any depot exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_depot: Option<NearestDepotInfo>,
}

/// A page of search results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// Listings on this page
    pub containers: Vec<ContainerResult>,
    /// Listings matching the filters
    pub total_results: u64,
    /// Pages available at the configured page size
    pub total_pages: u64,
    /// 1-based page returned
    pub current_page: u64,
    /// True when results are ordered by distance from a geocoded postal code
    pub nearest_depot_search: bool,
    /// Present for distance searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depot_info: Option<DepotInfo>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// `%needle%` with LIKE wildcards in the needle escaped, lower-cased.
fn contains_pattern(needle: &str) -> LikeExpr {
    let escaped = needle
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    LikeExpr::new(format!("%{escaped}%")).escape('\\')
}

fn lower_contains(column: container::Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(contains_pattern(needle))
}

/// Builds the filter for everything except the postal code.
fn base_condition(params: &SearchParams) -> Condition {
    let mut condition = Condition::all();

    if let Some(query) = non_blank(params.query.as_ref()) {
        condition = condition.add(
            Condition::any()
                .add(lower_contains(container::Column::Sku, query))
                .add(lower_contains(container::Column::ContainerType, query))
                .add(lower_contains(container::Column::Condition, query))
                .add(lower_contains(container::Column::City, query)),
        );
    }

    let types: Vec<&str> = params
        .types
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !types.is_empty() {
        let any_type = types.into_iter().fold(Condition::any(), |any, t| {
            any.add(lower_contains(container::Column::ContainerType, t))
        });
        condition = condition.add(any_type);
    }

    let conditions: Vec<String> = params
        .conditions
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    if !conditions.is_empty() {
        condition = condition
            .add(Expr::expr(Func::lower(Expr::col(container::Column::Condition))).is_in(conditions));
    }

    if let Some(city) = non_blank(params.city.as_ref()) {
        condition = condition.add(lower_contains(container::Column::City, city));
    }
    if let Some(min) = params.price_min.filter(|p| p.is_finite()) {
        condition = condition.add(container::Column::Price.gte(min));
    }
    if let Some(max) = params.price_max.filter(|p| p.is_finite()) {
        condition = condition.add(container::Column::Price.lte(max));
    }

    condition
}

struct Pagination {
    page_size: u64,
    page: u64,
}

impl Pagination {
    fn new(page_size: u64, requested: Option<u64>) -> Self {
        Self {
            page_size: page_size.max(1),
            page: requested.unwrap_or(1).max(1),
        }
    }
}

async fn fetch_page(
    db: &DatabaseConnection,
    select: Select<Container>,
    pagination: &Pagination,
) -> Result<(Vec<container::Model>, u64, u64)> {
    let paginator = select.paginate(db, pagination.page_size);
    let totals = paginator.num_items_and_pages().await?;
    let rows = paginator.fetch_page(pagination.page - 1).await?;
    Ok((rows, totals.number_of_items, totals.number_of_pages))
}

/// Finds the depot closest to a point.
async fn closest_depot(db: &DatabaseConnection, point: &GeoPoint) -> Result<Option<NearestDepotInfo>> {
    let depots = Depot::find().all(db).await?;
    Ok(depots
        .into_iter()
        .map(|d| {
            let miles = point.miles_to(d.latitude, d.longitude);
            (d, miles)
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(d, distance_miles)| NearestDepotInfo {
            id: d.id,
            name: d.name,
            city: d.city,
            state: d.state,
            postal_code: d.postal_code,
            distance_miles,
        }))
}

/// Searches the catalog.
///
/// # Arguments
/// * `geocoder` - Used for the postal-code distance fallback; `None` disables it
/// * `page_size` - Listings per page
/// * `photos` - Photo locations for category rendering
///
/// # Errors
/// Returns an error if a database query fails. Geocoding problems are logged
/// and never fail the search.
pub async fn search(
    db: &DatabaseConnection,
    geocoder: Option<&dyn Geocoder>,
    params: &SearchParams,
    page_size: u64,
    photos: &PhotoConfig,
) -> Result<SearchPage> {
    let pagination = Pagination::new(page_size, params.page);
    let base = base_condition(params);

    let Some(postal_code) = non_blank(params.postal_code.as_ref()) else {
        return plain_search(db, base, &pagination, photos).await;
    };

    let exact = base.clone().add(container::Column::PostalCode.eq(postal_code));
    let exact_count = Container::find().filter(exact.clone()).count(db).await?;
    if exact_count > 0 {
        debug!("{exact_count} listings stocked at postal code {postal_code}");
        return plain_search(db, exact, &pagination, photos).await;
    }

    let Some(geocoder) = geocoder else {
        debug!("No geocoder configured, ignoring postal code {postal_code}");
        return plain_search(db, base, &pagination, photos).await;
    };

    match geocoder.geocode(postal_code).await {
        Ok(Some(point)) => distance_search(db, base, &pagination, photos, postal_code, point).await,
        Ok(None) => {
            warn!("Postal code {postal_code} could not be geocoded, searching without it");
            plain_search(db, base, &pagination, photos).await
        }
        Err(e) => {
            warn!("Geocoding {postal_code} failed, searching without it: {e}");
            plain_search(db, base, &pagination, photos).await
        }
    }
}

async fn plain_search(
    db: &DatabaseConnection,
    condition: Condition,
    pagination: &Pagination,
    photos: &PhotoConfig,
) -> Result<SearchPage> {
    let select = Container::find()
        .filter(condition)
        .order_by_asc(container::Column::Price)
        .order_by_asc(container::Column::Id);
    let (rows, total_results, total_pages) = fetch_page(db, select, pagination).await?;

    Ok(SearchPage {
        containers: rows
            .into_iter()
            .map(|row| ContainerResult::new(row, photos, None))
            .collect(),
        total_results,
        total_pages,
        current_page: pagination.page,
        nearest_depot_search: false,
        depot_info: None,
    })
}

async fn distance_search(
    db: &DatabaseConnection,
    condition: Condition,
    pagination: &Pagination,
    photos: &PhotoConfig,
    postal_code: &str,
    point: GeoPoint,
) -> Result<SearchPage> {
    let scale = longitude_scale(point.latitude);
    let proximity = Expr::cust_with_values(
        "((latitude - ?) * (latitude - ?)) + ((longitude - ?) * (longitude - ?) * ?)",
        [
            point.latitude,
            point.latitude,
            point.longitude,
            point.longitude,
            scale,
        ],
    );

    let select = Container::find()
        .filter(
            condition
                .add(container::Column::Latitude.is_not_null())
                .add(container::Column::Longitude.is_not_null()),
        )
        .order_by(proximity, Order::Asc)
        .order_by_asc(container::Column::Id);
    let (rows, total_results, total_pages) = fetch_page(db, select, pagination).await?;

    let containers = rows
        .into_iter()
        .map(|row| {
            let miles = match (row.latitude, row.longitude) {
                (Some(lat), Some(lng)) => Some(point.miles_to(lat, lng)),
                _ => None,
            };
            ContainerResult::new(row, photos, miles)
        })
        .collect();

    let nearest_depot = closest_depot(db, &point).await?;
    Ok(SearchPage {
        containers,
        total_results,
        total_pages,
        current_page: pagination.page,
        nearest_depot_search: true,
        depot_info: Some(DepotInfo {
            searched_location: SearchedLocation {
                postal_code: postal_code.to_string(),
                latitude: point.latitude,
                longitude: point.longitude,
                formatted_address: point.formatted_address,
            },
            nearest_depot,
        }),
    })
}

/// Looks up one listing with its category.
///
/// # Errors
/// Returns [`Error::ContainerNotFound`] for an unknown SKU.
pub async fn listing_detail(
    db: &DatabaseConnection,
    sku: &str,
    photos: &PhotoConfig,
) -> Result<ContainerResult> {
    let listing = crate::core::catalog::get_container_by_sku(db, sku)
        .await?
        .ok_or_else(|| Error::ContainerNotFound {
            sku: sku.to_string(),
        })?;
    Ok(ContainerResult::new(listing, photos, None))
}

/// Nearest-depot lookup request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestDepotRequest {
    /// Customer zip code
    pub zip_code: String,
    /// Size substring, e.g. "40"
    pub container_size: String,
    /// Type substring, e.g. "High Cube"; blank matches any
    #[serde(default)]
    pub container_type: String,
    /// Condition grade; blank matches any
    #[serde(default)]
    pub container_condition: String,
}

/// The nearest depot holding matching stock
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestDepotResult {
    /// The depot
    pub depot: depot::Model,
    /// Miles from the customer's zip code
    pub distance_miles: f64,
    /// Matching listings at that depot
    pub containers: Vec<ContainerResult>,
}

/// Finds the closest depot that stocks containers matching the request.
///
/// # Errors
/// Returns an error if:
/// - The zip code or size is blank
/// - The zip code cannot be geocoded
/// - No depot stocks a matching container
/// - A database query fails
pub async fn nearest_depot(
    db: &DatabaseConnection,
    geocoder: &dyn Geocoder,
    request: &NearestDepotRequest,
    photos: &PhotoConfig,
) -> Result<NearestDepotResult> {
    let zip_code = request.zip_code.trim();
    if zip_code.is_empty() {
        return Err(Error::validation("zipCode is required"));
    }
    if request.container_size.trim().is_empty() {
        return Err(Error::validation("containerSize is required"));
    }

    let point = geocoder
        .geocode(zip_code)
        .await?
        .ok_or_else(|| Error::Geocoding {
            message: format!("No location found for zip code {zip_code}"),
        })?;

    let mut condition = Condition::all()
        .add(lower_contains(
            container::Column::ContainerType,
            &request.container_size,
        ))
        .add(container::Column::Quantity.gt(0))
        .add(container::Column::DepotId.is_not_null());
    if !request.container_type.trim().is_empty() {
        condition = condition.add(lower_contains(
            container::Column::ContainerType,
            &request.container_type,
        ));
    }
    if !request.container_condition.trim().is_empty() {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col(container::Column::Condition)))
                .eq(request.container_condition.trim().to_lowercase()),
        );
    }

    let matching = Container::find()
        .filter(condition)
        .order_by_asc(container::Column::Price)
        .all(db)
        .await?;

    let mut by_depot: HashMap<i64, Vec<container::Model>> = HashMap::new();
    for listing in matching {
        if let Some(depot_id) = listing.depot_id {
            by_depot.entry(depot_id).or_default().push(listing);
        }
    }

    let depots = Depot::find()
        .filter(depot::Column::Id.is_in(by_depot.keys().copied()))
        .all(db)
        .await?;

    let (depot, distance_miles) = depots
        .into_iter()
        .map(|d| {
            let miles = haversine_miles(point.latitude, point.longitude, d.latitude, d.longitude);
            (d, miles)
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .ok_or_else(|| Error::DepotNotFound {
            name: format!(
                "no depot stocks {} {} {}",
                request.container_size.trim(),
                request.container_type.trim(),
                request.container_condition.trim()
            )
            .trim()
            .to_string(),
        })?;

    let containers = by_depot
        .remove(&depot.id)
        .unwrap_or_default()
        .into_iter()
        .map(|listing| ContainerResult::new(listing, photos, Some(distance_miles)))
        .collect();

    Ok(NearestDepotResult {
        depot,
        distance_miles,
        containers,
    })
}
