//! Back-office and liveness endpoints.

use super::AppState;
use crate::{
    core::{
        catalog,
        report::{self, AdminSummary},
    },
    entities::{container, depot},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Body of `PATCH /api/admin/containers/:sku`
#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    price: f64,
    quantity: i32,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>> {
    state.db.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// `GET /api/admin/summary`
pub async fn summary(State(state): State<AppState>) -> Result<Json<AdminSummary>> {
    report::admin_summary(&state.db).await.map(Json)
}

/// `GET /api/depots`
pub async fn list_depots(State(state): State<AppState>) -> Result<Json<Vec<depot::Model>>> {
    catalog::get_all_depots(&state.db).await.map(Json)
}

/// `PATCH /api/admin/containers/:sku`
pub async fn update_stock(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    payload: std::result::Result<Json<StockUpdate>, JsonRejection>,
) -> Result<Json<container::Model>> {
    let Json(update) = payload?;
    catalog::update_container_stock(&state.db, &sku, update.price, update.quantity)
        .await
        .map(Json)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use crate::{errors::Result, test_utils::*};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let app = crate::api::router(test_state(StubGeocoder::new()).await?);
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_summary() -> Result<()> {
        let state = test_state(StubGeocoder::new()).await?;
        let depot = create_test_depot(&state.db, "Savannah", "31408", 32.12, -81.15).await?;
        create_test_listing(&state.db, &depot, "SAV-40-IICL", "40' Standard", "IICL", 3100.0).await?;
        let app = crate::api::router(state);

        let (status, body) = send(&app, Method::GET, "/api/admin/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalListings"], 1);
        assert_eq!(body["inventoryValue"], 3100.0);
        assert_eq!(body["listingsByCondition"]["IICL"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_depots_and_stock_update() -> Result<()> {
        let state = test_state(StubGeocoder::new()).await?;
        let depot = create_test_depot(&state.db, "Savannah", "31408", 32.12, -81.15).await?;
        create_test_listing(&state.db, &depot, "SAV-20-WWT", "20' Standard", "WWT", 1700.0).await?;
        let app = crate::api::router(state);

        let (status, body) = send(&app, Method::GET, "/api/depots", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["postalCode"], "31408");

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/api/admin/containers/SAV-20-WWT",
            Some(json!({ "price": 1650.0, "quantity": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 1650.0);
        assert_eq!(body["quantity"], 4);

        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/admin/containers/SAV-20-WWT",
            Some(json!({ "price": -1.0, "quantity": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/admin/containers/NOPE",
            Some(json!({ "price": 1.0, "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
