//! Outbound HTTP adapters.
//!
//! Each adapter owns transport details only: request building, timeouts,
//! status mapping and JSON decoding into core types. Business rules stay in
//! `core`.

pub mod google;
pub mod shipsgo;

pub use google::GoogleGeocoder;
pub use shipsgo::ShipsgoClient;

/// Compacts an upstream body into a short single-line preview for errors
/// and logs.
fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Transport failures and timeouts both surface as upstream errors.
fn map_transport_error(error: reqwest::Error) -> crate::errors::Error {
    let message = if error.is_timeout() {
        format!("request timed out: {error}")
    } else {
        format!("request failed: {error}")
    };
    crate::errors::Error::Upstream { message }
}
