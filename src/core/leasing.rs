//! Leasing business logic - Contracts, assigned containers and billing.
//!
//! Statuses are stored as text and validated through the enums below. There
//! is no transition graph: any contract status may follow any other, which
//! lets operations staff correct mistakes directly.

use crate::{
    core::{cart::round_cents, catalog, container_number},
    entities::{
        BillingSchedule, ContractContainer, LeaseContract, billing_schedule, contract_container,
        lease_contract,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};
use tracing::{debug, info};

macro_rules! text_status {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Stored text form
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_lowercase().replace('-', "_").as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(Error::validation(format!(
                        concat!("Unknown ", $label, ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

/// Contract lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Drafted, containers not yet released
    Pending,
    /// Containers out on lease
    Active,
    /// All containers returned
    Completed,
    /// Ended early
    Terminated,
}

text_status!(ContractStatus, "contract status", {
    Pending => "pending",
    Active => "active",
    Completed => "completed",
    Terminated => "terminated",
});

/// Where an assigned container is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    /// Allocated to the contract, still at the depot
    Assigned,
    /// Collected by the customer
    PickedUp,
    /// Back at a depot
    Returned,
}

text_status!(ContainerStatus, "container status", {
    Assigned => "assigned",
    PickedUp => "picked_up",
    Returned => "returned",
});

/// Billing row state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    /// Not yet paid
    Pending,
    /// Settled
    Paid,
}

text_status!(BillingStatus, "billing status", {
    Pending => "pending",
    Paid => "paid",
});

/// Where a billing row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingKind {
    /// Monthly rent written by [`generate_billing_schedule`]
    Rent,
    /// Entered by hand through [`add_billing_entry`]
    Charge,
}

text_status!(BillingKind, "billing kind", {
    Rent => "rent",
    Charge => "charge",
});

/// Input for [`create_contract`]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    /// Lessee name
    pub customer_name: String,
    /// Lessee email
    pub customer_email: String,
    /// Depot the containers leave from
    #[serde(default)]
    pub origin_depot_id: Option<i64>,
    /// Where the containers are headed
    pub destination: String,
    /// First day of the lease
    pub start_date: NaiveDate,
    /// Last day of the lease
    pub end_date: NaiveDate,
    /// Monthly charge
    pub monthly_rate: f64,
    /// Days before per diem charges start
    #[serde(default)]
    pub free_days: i32,
    /// Charge per day past the free days
    #[serde(default)]
    pub per_diem_rate: f64,
}

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

fn validate_contract(contract: &NewContract) -> Result<()> {
    if contract.customer_name.trim().is_empty() {
        return Err(Error::validation("Customer name cannot be empty"));
    }
    if !contract.customer_email.contains('@') {
        return Err(Error::validation("A valid customer email is required"));
    }
    if contract.destination.trim().is_empty() {
        return Err(Error::validation("Destination cannot be empty"));
    }
    if contract.end_date < contract.start_date {
        return Err(Error::validation("Lease cannot end before it starts"));
    }
    if contract.free_days < 0 {
        return Err(Error::validation("Free days cannot be negative"));
    }
    check_amount(contract.monthly_rate)?;
    check_amount(contract.per_diem_rate)
}

/// Creates a lease contract in `pending` status.
///
/// # Errors
/// Returns an error if the input is invalid, the origin depot does not exist,
/// or the database write fails.
pub async fn create_contract(
    db: &DatabaseConnection,
    contract: NewContract,
) -> Result<lease_contract::Model> {
    validate_contract(&contract)?;

    if let Some(depot_id) = contract.origin_depot_id {
        catalog::get_depot_by_id(db, depot_id)
            .await?
            .ok_or_else(|| Error::DepotNotFound {
                name: depot_id.to_string(),
            })?;
    }

    let now = Utc::now();
    let provisional = format!(
        "LC-PENDING-{}",
        now.timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_micros())
    );
    let model = lease_contract::ActiveModel {
        contract_number: Set(provisional),
        customer_name: Set(contract.customer_name.trim().to_string()),
        customer_email: Set(contract.customer_email.trim().to_string()),
        status: Set(ContractStatus::Pending.as_str().to_string()),
        origin_depot_id: Set(contract.origin_depot_id),
        destination: Set(contract.destination.trim().to_string()),
        start_date: Set(contract.start_date),
        end_date: Set(contract.end_date),
        monthly_rate: Set(contract.monthly_rate),
        free_days: Set(contract.free_days),
        per_diem_rate: Set(contract.per_diem_rate),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    // Numbered from the row id so concurrent creates never collide
    let txn = db.begin().await?;
    let inserted = model.insert(&txn).await?;
    let number = format!("LC-{}-{:05}", now.format("%Y%m%d"), inserted.id);
    let mut numbered: lease_contract::ActiveModel = inserted.into();
    numbered.contract_number = Set(number);
    let created = numbered.update(&txn).await?;
    txn.commit().await?;

    info!(
        "Created lease contract {} for {}",
        created.contract_number, created.customer_email
    );
    Ok(created)
}

/// Looks up a contract by id
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_contract(db: &DatabaseConnection, id: i64) -> Result<Option<lease_contract::Model>> {
    LeaseContract::find_by_id(id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks up a contract by its contract number
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_contract_by_number(
    db: &DatabaseConnection,
    contract_number: &str,
) -> Result<Option<lease_contract::Model>> {
    LeaseContract::find()
        .filter(lease_contract::Column::ContractNumber.eq(contract_number.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_contract(db: &DatabaseConnection, id: i64) -> Result<lease_contract::Model> {
    get_contract(db, id)
        .await?
        .ok_or_else(|| Error::ContractNotFound { id: id.to_string() })
}

/// Lists contracts, newest first, optionally filtered by status
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_contracts(
    db: &DatabaseConnection,
    status: Option<ContractStatus>,
) -> Result<Vec<lease_contract::Model>> {
    let mut query = LeaseContract::find();
    if let Some(status) = status {
        query = query.filter(lease_contract::Column::Status.eq(status.as_str()));
    }
    query
        .order_by_desc(lease_contract::Column::CreatedAt)
        .order_by_desc(lease_contract::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sets a contract's status
///
/// # Errors
/// Returns `ContractNotFound` for an unknown id, or a database error.
pub async fn update_contract_status(
    db: &DatabaseConnection,
    id: i64,
    status: ContractStatus,
) -> Result<lease_contract::Model> {
    let contract = require_contract(db, id).await?;
    let mut active: lease_contract::ActiveModel = contract.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;
    info!("Contract {} is now {status}", updated.contract_number);
    Ok(updated)
}

/// Assigns a physical container to a contract.
///
/// With `strict` set the number must pass the ISO 6346 check digit; otherwise
/// it only needs to be non-empty. Numbers are stored normalized either way.
///
/// # Errors
/// Returns an error if the number or type is invalid, the contract does not
/// exist, or the database write fails.
pub async fn assign_container(
    db: &DatabaseConnection,
    contract_id: i64,
    number: &str,
    container_type: &str,
    strict: bool,
) -> Result<contract_container::Model> {
    let number = if strict {
        container_number::validate(number)?
    } else {
        container_number::normalize(number)
    };
    if number.is_empty() {
        return Err(Error::validation("Container number cannot be empty"));
    }
    if container_type.trim().is_empty() {
        return Err(Error::validation("Container type cannot be empty"));
    }

    let contract = require_contract(db, contract_id).await?;

    let assignment = contract_container::ActiveModel {
        contract_id: Set(contract.id),
        container_number: Set(number),
        container_type: Set(container_type.trim().to_string()),
        status: Set(ContainerStatus::Assigned.as_str().to_string()),
        picked_up_on: Set(None),
        returned_on: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Assigned {} to contract {}",
        assignment.container_number, contract.contract_number
    );
    Ok(assignment)
}

/// Containers assigned to a contract, in assignment order
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_contract_containers(
    db: &DatabaseConnection,
    contract_id: i64,
) -> Result<Vec<contract_container::Model>> {
    ContractContainer::find()
        .filter(contract_container::Column::ContractId.eq(contract_id))
        .order_by_asc(contract_container::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves an assigned container to a new status.
///
/// `picked_up` stamps `picked_up_on` and `returned` stamps `returned_on` with
/// `on`. Going back to `assigned` clears both dates.
///
/// # Errors
/// Returns `ContractContainerNotFound` for an unknown id, or a database error.
pub async fn update_container_status(
    db: &DatabaseConnection,
    assignment_id: i64,
    status: ContainerStatus,
    on: NaiveDate,
) -> Result<contract_container::Model> {
    let assignment = ContractContainer::find_by_id(assignment_id)
        .one(db)
        .await?
        .ok_or(Error::ContractContainerNotFound { id: assignment_id })?;

    let mut active: contract_container::ActiveModel = assignment.into();
    active.status = Set(status.as_str().to_string());
    match status {
        ContainerStatus::Assigned => {
            active.picked_up_on = Set(None);
            active.returned_on = Set(None);
        }
        ContainerStatus::PickedUp => active.picked_up_on = Set(Some(on)),
        ContainerStatus::Returned => active.returned_on = Set(Some(on)),
    }
    let updated = active.update(db).await?;
    debug!("Container {} is now {status}", updated.container_number);
    Ok(updated)
}

/// Adds one pending billing row to a contract
///
/// # Errors
/// Returns an error if the amount or description is invalid, the contract
/// does not exist, or the database write fails.
pub async fn add_billing_entry(
    db: &DatabaseConnection,
    contract_id: i64,
    due_date: NaiveDate,
    amount: f64,
    description: &str,
) -> Result<billing_schedule::Model> {
    check_amount(amount)?;
    if description.trim().is_empty() {
        return Err(Error::validation("Billing description cannot be empty"));
    }
    let contract = require_contract(db, contract_id).await?;

    billing_schedule::ActiveModel {
        contract_id: Set(contract.id),
        due_date: Set(due_date),
        amount: Set(round_cents(amount)),
        description: Set(description.trim().to_string()),
        kind: Set(BillingKind::Charge.as_str().to_string()),
        status: Set(BillingStatus::Pending.as_str().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Billing rows for a contract, by due date
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_billing_schedule(
    db: &DatabaseConnection,
    contract_id: i64,
) -> Result<Vec<billing_schedule::Model>> {
    BillingSchedule::find()
        .filter(billing_schedule::Column::ContractId.eq(contract_id))
        .order_by_asc(billing_schedule::Column::DueDate)
        .order_by_asc(billing_schedule::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a billing row as paid
///
/// # Errors
/// Returns `BillingEntryNotFound` for an unknown id, or a database error.
pub async fn mark_billing_paid(
    db: &DatabaseConnection,
    entry_id: i64,
) -> Result<billing_schedule::Model> {
    let entry = BillingSchedule::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or(Error::BillingEntryNotFound { id: entry_id })?;

    let mut active: billing_schedule::ActiveModel = entry.into();
    active.status = Set(BillingStatus::Paid.as_str().to_string());
    active.update(db).await.map_err(Into::into)
}

/// Monthly due dates from `start` up to, not including, `end`.
///
/// A lease shorter than a month still bills once on its start date.
#[must_use]
pub fn monthly_due_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = vec![start];
    for offset in 1.. {
        match start.checked_add_months(Months::new(offset)) {
            Some(due) if due < end => dates.push(due),
            _ => break,
        }
    }
    dates
}

/// Rebuilds a contract's monthly billing schedule.
///
/// Pending rent rows are deleted and one rent row per month is written at the
/// monthly rate. Months whose rent is already paid are left alone. Manual
/// charges are never touched. Runs in one database transaction.
///
/// # Errors
/// Returns `ContractNotFound` for an unknown id, or a database error.
pub async fn generate_billing_schedule(
    db: &DatabaseConnection,
    contract_id: i64,
) -> Result<Vec<billing_schedule::Model>> {
    let txn = db.begin().await?;

    let contract = LeaseContract::find_by_id(contract_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::ContractNotFound {
            id: contract_id.to_string(),
        })?;

    let removed = BillingSchedule::delete_many()
        .filter(billing_schedule::Column::ContractId.eq(contract.id))
        .filter(billing_schedule::Column::Kind.eq(BillingKind::Rent.as_str()))
        .filter(billing_schedule::Column::Status.eq(BillingStatus::Pending.as_str()))
        .exec(&txn)
        .await?;

    let paid_months: HashSet<(i32, u32)> = BillingSchedule::find()
        .filter(billing_schedule::Column::ContractId.eq(contract.id))
        .filter(billing_schedule::Column::Kind.eq(BillingKind::Rent.as_str()))
        .all(&txn)
        .await?
        .iter()
        .map(|row| (row.due_date.year(), row.due_date.month()))
        .collect();

    let mut created = 0_usize;
    for due in monthly_due_dates(contract.start_date, contract.end_date) {
        if paid_months.contains(&(due.year(), due.month())) {
            continue;
        }
        billing_schedule::ActiveModel {
            contract_id: Set(contract.id),
            due_date: Set(due),
            amount: Set(round_cents(contract.monthly_rate)),
            description: Set(format!("Monthly lease {}", due.format("%B %Y"))),
            kind: Set(BillingKind::Rent.as_str().to_string()),
            status: Set(BillingStatus::Pending.as_str().to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        created += 1;
    }

    txn.commit().await?;
    info!(
        "Regenerated billing for {}: removed {} pending, created {created}",
        contract.contract_number, removed.rows_affected
    );

    list_billing_schedule(db, contract.id).await
}

/// A per diem calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerDiem {
    /// Contract the charge belongs to
    pub contract_number: String,
    /// Days the container has been out
    pub days_out: i64,
    /// Free days on the contract
    pub free_days: i32,
    /// Days past the free allowance
    pub billable_days: i64,
    /// Daily rate
    pub per_diem_rate: f64,
    /// `billable_days × per_diem_rate`
    pub charge: f64,
}

/// `max(0, days_out − free_days) × per_diem_rate`, rounded to cents
#[must_use]
pub fn per_diem_charge(contract: &lease_contract::Model, days_out: i64) -> f64 {
    per_diem(contract, days_out).charge
}

/// Full per diem breakdown for a contract
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_diem(contract: &lease_contract::Model, days_out: i64) -> PerDiem {
    let billable_days = (days_out - i64::from(contract.free_days)).max(0);
    PerDiem {
        contract_number: contract.contract_number.clone(),
        days_out,
        free_days: contract.free_days,
        billable_days,
        per_diem_rate: contract.per_diem_rate,
        charge: round_cents(billable_days as f64 * contract.per_diem_rate),
    }
}
