//! Catalog endpoints: search, listing detail and nearest depot.

use super::AppState;
use crate::{
    core::search::{self, ContainerResult, NearestDepotRequest, NearestDepotResult, SearchPage, SearchParams},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;

/// Raw query string for `GET /api/containers`. Lists are comma separated and
/// blank values are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    query: Option<String>,
    types: Option<String>,
    conditions: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    price_min: Option<String>,
    price_max: Option<String>,
    page: Option<String>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_optional<T: std::str::FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::validation(format!("Invalid {name}: {value}"))),
    }
}

impl SearchQuery {
    /// Converts the raw query into search filters.
    ///
    /// # Errors
    /// Returns a validation error for a non-numeric price or page.
    pub fn into_params(self) -> Result<SearchParams> {
        Ok(SearchParams {
            price_min: parse_optional("priceMin", self.price_min.as_deref())?,
            price_max: parse_optional("priceMax", self.price_max.as_deref())?,
            page: parse_optional("page", self.page.as_deref())?,
            types: split_list(self.types.as_deref()),
            conditions: split_list(self.conditions.as_deref()),
            query: self.query,
            city: self.city,
            postal_code: self.postal_code,
        })
    }
}

/// `GET /api/containers`
pub async fn search(
    State(state): State<AppState>,
    query: std::result::Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchPage>> {
    let Query(query) = query?;
    let params = query.into_params()?;
    let page = search::search(
        &state.db,
        state.geocoder(),
        &params,
        state.config.search.page_size,
        &state.config.photos,
    )
    .await?;
    Ok(Json(page))
}

/// `GET /api/containers/:sku`
pub async fn detail(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<ContainerResult>> {
    search::listing_detail(&state.db, &sku, &state.config.photos)
        .await
        .map(Json)
}

/// `POST /api/containers/nearest-depot`
pub async fn nearest_depot(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NearestDepotRequest>, JsonRejection>,
) -> Result<Json<NearestDepotResult>> {
    let Json(request) = payload?;
    let geocoder = state.geocoder().ok_or_else(|| Error::Geocoding {
        message: "Geocoding is not configured".to_string(),
    })?;
    search::nearest_depot(&state.db, geocoder, &request, &state.config.photos)
        .await
        .map(Json)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[test]
    fn test_query_conversion() {
        let query = SearchQuery {
            types: Some("40' High Cube, ,20'".to_string()),
            price_min: Some(" ".to_string()),
            price_max: Some("3000".to_string()),
            page: Some("2".to_string()),
            ..SearchQuery::default()
        };
        let params = query.into_params().unwrap();
        assert_eq!(params.types, vec!["40' High Cube", "20'"]);
        assert!(params.conditions.is_empty());
        assert_eq!(params.price_min, None);
        assert_eq!(params.price_max, Some(3000.0));
        assert_eq!(params.page, Some(2));

        let bad = SearchQuery {
            price_min: Some("cheap".to_string()),
            ..SearchQuery::default()
        };
        assert!(matches!(bad.into_params().unwrap_err(), Error::Validation { .. }));
    }

    async fn stocked_app() -> Result<axum::Router> {
        let state = test_state(StubGeocoder::new().with("77002", 29.75, -95.36)).await?;
        let houston = create_test_depot(&state.db, "Houston", "77029", 29.73, -95.26).await?;
        let dallas = create_test_depot(&state.db, "Dallas", "75212", 32.78, -96.87).await?;
        create_test_listing(&state.db, &houston, "HOU-40HC-CW", "40' High Cube", "Cargo Worthy", 2850.0)
            .await?;
        create_test_listing(&state.db, &dallas, "DAL-20-CW", "20' Standard", "Cargo Worthy", 1900.0)
            .await?;
        Ok(super::super::router(state))
    }

    #[tokio::test]
    async fn test_search_endpoint() -> Result<()> {
        let app = stocked_app().await?;

        let (status, body) = send(&app, Method::GET, "/api/containers?types=20", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalResults"], 1);
        assert_eq!(body["containers"][0]["sku"], "DAL-20-CW");
        assert_eq!(body["nearestDepotSearch"], false);

        let (status, body) =
            send(&app, Method::GET, "/api/containers?postalCode=77002", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nearestDepotSearch"], true);
        assert_eq!(body["containers"][0]["sku"], "HOU-40HC-CW");
        assert_eq!(body["depotInfo"]["searchedLocation"]["postalCode"], "77002");

        let (status, body) = send(&app, Method::GET, "/api/containers?priceMin=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_input");
        Ok(())
    }

    #[tokio::test]
    async fn test_detail_endpoint() -> Result<()> {
        let app = stocked_app().await?;

        let (status, body) = send(&app, Method::GET, "/api/containers/HOU-40HC-CW", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"]["bucket"], "40hc-cargo-worthy");

        let (status, body) = send(&app, Method::GET, "/api/containers/NOPE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn test_nearest_depot_endpoint() -> Result<()> {
        let app = stocked_app().await?;

        let request = serde_json::json!({
            "zipCode": "77002",
            "containerSize": "40",
            "containerType": "High Cube",
            "containerCondition": "cargo worthy"
        });
        let (status, body) =
            send(&app, Method::POST, "/api/containers/nearest-depot", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["depot"]["name"], "Houston");
        assert_eq!(body["containers"][0]["sku"], "HOU-40HC-CW");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/containers/nearest-depot",
            Some(serde_json::json!({ "containerSize": "40" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }
}
