//! Container tracking endpoint.

use super::AppState;
use crate::{
    core::tracking::{self, TrackingRequest, TrackingResult},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

/// `POST /api/tracking/search`
pub async fn search(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TrackingRequest>, JsonRejection>,
) -> Result<Json<TrackingResult>> {
    let Json(request) = payload?;
    let result = tracking::search_container(state.tracker.as_ref(), &request)
        .await?
        .ok_or_else(|| Error::ShipmentNotFound {
            number: request.tracking_number.trim().to_string(),
        })?;
    info!(
        "Tracked {} via {}: {}",
        result.container_number, result.carrier, result.status
    );
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use crate::{core::tracking::DemoTracker, errors::Result, test_utils::*};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    const URI: &str = "/api/tracking/search";

    fn lookup(number: &str) -> Option<serde_json::Value> {
        Some(json!({ "trackingNumber": number, "shippingLine": "MAEU" }))
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unauthorized() -> Result<()> {
        let app = crate::api::router(test_state(StubGeocoder::new()).await?);
        let (status, body) = send(&app, Method::POST, URI, lookup("CSQU3054383")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "tracking_not_configured");
        Ok(())
    }

    #[tokio::test]
    async fn test_found_and_not_found() -> Result<()> {
        let app = test_app_with_tracker(StubTracker(StubOutcome::Found)).await?;
        let (status, body) = send(&app, Method::POST, URI, lookup("csqu3054383")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["containerNumber"], "CSQU3054383");
        assert_eq!(body["events"][0]["description"], "Discharged");

        let app = test_app_with_tracker(StubTracker(StubOutcome::NotFound)).await?;
        let (status, body) = send(&app, Method::POST, URI, lookup("CSQU3054383")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn test_upstream_failures() -> Result<()> {
        let app = test_app_with_tracker(StubTracker(StubOutcome::RateLimited)).await?;
        let (status, _) = send(&app, Method::POST, URI, lookup("CSQU3054383")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let app = test_app_with_tracker(StubTracker(StubOutcome::NoCredits)).await?;
        let (status, body) = send(&app, Method::POST, URI, lookup("CSQU3054383")).await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(body["error"]["code"], "insufficient_credits");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_number_is_bad_request() -> Result<()> {
        let app = test_app_with_tracker(DemoTracker).await?;
        let (status, _) = send(&app, Method::POST, URI, lookup("CSQU3054384")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::POST, URI, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }
}
