//! Core business logic - framework-agnostic operations over the database.
//!
//! Everything here takes a `&DatabaseConnection` (or plain values) and
//! returns `errors::Result`, so the same functions back the HTTP API, startup
//! seeding and tests.

pub mod cart;
pub mod catalog;
pub mod category;
pub mod container_number;
pub mod geo;
pub mod invoice;
pub mod leasing;
pub mod report;
pub mod search;
pub mod tracking;
