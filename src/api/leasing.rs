//! Leasing endpoints: contracts, assigned containers, billing and per diem.

use super::AppState;
use crate::{
    core::leasing::{self, ContainerStatus, ContractStatus, NewContract, PerDiem},
    entities::{billing_schedule, contract_container, lease_contract},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// Query of `GET /api/leasing/contracts`
#[derive(Debug, Deserialize)]
pub struct ContractFilter {
    status: Option<String>,
}

/// Body of the status PATCH endpoints
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: String,
    /// Effective date for container moves; today when absent
    #[serde(default)]
    date: Option<NaiveDate>,
}

/// Body of `POST /api/leasing/contracts/:id/containers`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignContainer {
    container_number: String,
    container_type: String,
    /// Enforce the ISO 6346 check digit; on unless switched off
    #[serde(default = "strict_by_default")]
    strict: bool,
}

const fn strict_by_default() -> bool {
    true
}

/// Body of `POST /api/leasing/contracts/:id/billing`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBillingEntry {
    due_date: NaiveDate,
    amount: f64,
    description: String,
}

/// Query of `GET /api/leasing/contracts/:id/per-diem`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerDiemQuery {
    days_out: i64,
}

/// A contract with everything attached to it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetail {
    #[serde(flatten)]
    contract: lease_contract::Model,
    containers: Vec<contract_container::Model>,
    billing: Vec<billing_schedule::Model>,
}

async fn require_contract(state: &AppState, id: i64) -> Result<lease_contract::Model> {
    leasing::get_contract(&state.db, id)
        .await?
        .ok_or_else(|| Error::ContractNotFound { id: id.to_string() })
}

/// `GET /api/leasing/contracts`
pub async fn list_contracts(
    State(state): State<AppState>,
    filter: std::result::Result<Query<ContractFilter>, QueryRejection>,
) -> Result<Json<Vec<lease_contract::Model>>> {
    let Query(filter) = filter?;
    let status = filter
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<ContractStatus>)
        .transpose()?;
    leasing::list_contracts(&state.db, status).await.map(Json)
}

/// `POST /api/leasing/contracts`
pub async fn create_contract(
    State(state): State<AppState>,
    payload: JsonBody<NewContract>,
) -> Result<(StatusCode, Json<lease_contract::Model>)> {
    let Json(contract) = payload?;
    let created = leasing::create_contract(&state.db, contract).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /api/leasing/contracts/:id`
pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContractDetail>> {
    let contract = require_contract(&state, id).await?;
    let containers = leasing::list_contract_containers(&state.db, id).await?;
    let billing = leasing::list_billing_schedule(&state.db, id).await?;
    Ok(Json(ContractDetail {
        contract,
        containers,
        billing,
    }))
}

/// `PATCH /api/leasing/contracts/:id/status`
pub async fn update_contract_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: JsonBody<StatusUpdate>,
) -> Result<Json<lease_contract::Model>> {
    let Json(update) = payload?;
    let status: ContractStatus = update.status.parse()?;
    leasing::update_contract_status(&state.db, id, status)
        .await
        .map(Json)
}

/// `GET /api/leasing/contracts/:id/containers`
pub async fn list_containers(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<contract_container::Model>>> {
    require_contract(&state, id).await?;
    leasing::list_contract_containers(&state.db, id)
        .await
        .map(Json)
}

/// `POST /api/leasing/contracts/:id/containers`
pub async fn assign_container(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: JsonBody<AssignContainer>,
) -> Result<(StatusCode, Json<contract_container::Model>)> {
    let Json(body) = payload?;
    let assignment = leasing::assign_container(
        &state.db,
        id,
        &body.container_number,
        &body.container_type,
        body.strict,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// `PATCH /api/leasing/containers/:id/status`
pub async fn update_container_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: JsonBody<StatusUpdate>,
) -> Result<Json<contract_container::Model>> {
    let Json(update) = payload?;
    let status: ContainerStatus = update.status.parse()?;
    let on = update.date.unwrap_or_else(|| Utc::now().date_naive());
    leasing::update_container_status(&state.db, id, status, on)
        .await
        .map(Json)
}

/// `GET /api/leasing/contracts/:id/billing`
pub async fn list_billing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<billing_schedule::Model>>> {
    require_contract(&state, id).await?;
    leasing::list_billing_schedule(&state.db, id)
        .await
        .map(Json)
}

/// `POST /api/leasing/contracts/:id/billing`
pub async fn add_billing_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: JsonBody<NewBillingEntry>,
) -> Result<(StatusCode, Json<billing_schedule::Model>)> {
    let Json(entry) = payload?;
    let created =
        leasing::add_billing_entry(&state.db, id, entry.due_date, entry.amount, &entry.description)
            .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /api/leasing/contracts/:id/billing/generate`
pub async fn generate_billing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<billing_schedule::Model>>> {
    leasing::generate_billing_schedule(&state.db, id)
        .await
        .map(Json)
}

/// `POST /api/leasing/billing/:id/paid`
pub async fn mark_billing_paid(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<billing_schedule::Model>> {
    leasing::mark_billing_paid(&state.db, id).await.map(Json)
}

/// `GET /api/leasing/contracts/:id/per-diem?daysOut=`
pub async fn per_diem(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    query: std::result::Result<Query<PerDiemQuery>, QueryRejection>,
) -> Result<Json<PerDiem>> {
    let Query(query) = query?;
    if query.days_out < 0 {
        return Err(Error::validation("daysOut cannot be negative"));
    }
    let contract = require_contract(&state, id).await?;
    Ok(Json(leasing::per_diem(&contract, query.days_out)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use crate::{errors::Result, test_utils::*};
    use axum::{
        Router,
        http::{Method, StatusCode},
    };
    use serde_json::json;

    async fn app_with_contract() -> Result<(Router, i64)> {
        let app = crate::api::router(test_state(StubGeocoder::new()).await?);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/leasing/contracts",
            Some(json!({
                "customerName": "Gulf Freight LLC",
                "customerEmail": "ops@gulffreight.example",
                "destination": "Denver, CO",
                "startDate": "2026-01-01",
                "endDate": "2026-03-31",
                "monthlyRate": 300.0,
                "freeDays": 7,
                "perDiemRate": 25.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        let id = body["id"].as_i64().unwrap_or_default();
        Ok((app, id))
    }

    #[tokio::test]
    async fn test_contract_endpoints() -> Result<()> {
        let (app, id) = app_with_contract().await?;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/api/leasing/contracts/{id}/status"),
            Some(json!({ "status": "active" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "active");

        let (status, body) =
            send(&app, Method::GET, "/api/leasing/contracts?status=active", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (status, body) =
            send(&app, Method::GET, "/api/leasing/contracts?status=completed", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(0));

        let (status, _) =
            send(&app, Method::GET, "/api/leasing/contracts?status=bogus", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/api/leasing/contracts/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_container_endpoints() -> Result<()> {
        let (app, id) = app_with_contract().await?;
        let uri = format!("/api/leasing/contracts/{id}/containers");

        let (status, assigned) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "containerNumber": "CSQU3054383", "containerType": "40HC" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(assigned["status"], "assigned");

        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "containerNumber": "CSQU3054384", "containerType": "40HC" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "containerNumber": "YARD-7", "containerType": "20", "strict": false })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let assignment = assigned["id"].as_i64().unwrap_or_default();
        let (status, moved) = send(
            &app,
            Method::PATCH,
            &format!("/api/leasing/containers/{assignment}/status"),
            Some(json!({ "status": "picked_up", "date": "2026-01-04" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved["pickedUpOn"], "2026-01-04");

        let (status, listed) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(2));

        let (status, detail) =
            send(&app, Method::GET, &format!("/api/leasing/contracts/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["containers"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_billing_and_per_diem_endpoints() -> Result<()> {
        let (app, id) = app_with_contract().await?;

        let (status, schedule) = send(
            &app,
            Method::POST,
            &format!("/api/leasing/contracts/{id}/billing/generate"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(schedule.as_array().map(Vec::len), Some(3));
        assert_eq!(schedule[0]["amount"], 300.0);

        let (status, extra) = send(
            &app,
            Method::POST,
            &format!("/api/leasing/contracts/{id}/billing"),
            Some(json!({ "dueDate": "2026-02-15", "amount": 75.0, "description": "Repair" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let entry = extra["id"].as_i64().unwrap_or_default();
        let (status, paid) = send(
            &app,
            Method::POST,
            &format!("/api/leasing/billing/{entry}/paid"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "paid");

        let (status, listed) = send(
            &app,
            Method::GET,
            &format!("/api/leasing/contracts/{id}/billing"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(4));

        let (status, charge) = send(
            &app,
            Method::GET,
            &format!("/api/leasing/contracts/{id}/per-diem?daysOut=10"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(charge["billableDays"], 3);
        assert_eq!(charge["charge"], 75.0);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/leasing/contracts/{id}/per-diem?daysOut=-1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        Ok(())
    }
}
