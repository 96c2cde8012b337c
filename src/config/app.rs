//! Application configuration loading from config.toml
//!
//! Non-secret settings (pricing rates, page size, upstream endpoints and the
//! catalog seed) live in a TOML file. Every section has defaults, so an empty
//! or missing file yields a working configuration. API keys are only ever read
//! from the environment, see [`Secrets`].

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Catalog search settings
    pub search: SearchConfig,
    /// Delivery pricing rates
    pub pricing: PricingConfig,
    /// Shipsgo tracking client settings
    pub tracking: TrackingConfig,
    /// Google geocoding client settings
    pub geocoding: GeocodingConfig,
    /// Listing photo locations
    pub photos: PhotoConfig,
    /// Depots to seed on startup
    pub depots: Vec<DepotSeed>,
    /// Container listings to seed on startup
    pub containers: Vec<ContainerSeed>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:3000`
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Catalog search settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Listings per result page
    pub page_size: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { page_size: 12 }
    }
}

/// Delivery pricing rates, in dollars
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PricingConfig {
    /// Flat rate per container delivered by tilt-bed truck
    pub tilt_bed_rate: f64,
    /// Flat rate per container delivered by flatbed truck
    pub flatbed_rate: f64,
    /// Miles included in the flat rate
    pub free_miles: f64,
    /// Surcharge per container per mile past `free_miles`
    pub per_mile_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tilt_bed_rate: 600.0,
            flatbed_rate: 450.0,
            free_miles: 50.0,
            per_mile_rate: 4.0,
        }
    }
}

/// Shipsgo tracking client settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrackingConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Serve canned demo data when no API key is configured
    pub demo_mode: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.shipsgo.com/v2".to_string(),
            timeout_secs: 15,
            demo_mode: false,
        }
    }
}

/// Google geocoding client settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Geocoding endpoint
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Region bias passed to the geocoder
    pub region: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            timeout_secs: 10,
            region: "us".to_string(),
        }
    }
}

/// Where listing photos are served from
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PhotoConfig {
    /// URL prefix for photo buckets
    pub base_url: String,
    /// Image shown when a listing has no photo set
    pub fallback_image: String,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            base_url: "/images/containers".to_string(),
            fallback_image: "/images/containers/default.jpg".to_string(),
        }
    }
}

/// A depot to create on startup if no depot with the same name exists
#[derive(Debug, Deserialize, Clone)]
pub struct DepotSeed {
    /// Unique depot name
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

/// A listing to create on startup if no listing with the same SKU exists
#[derive(Debug, Deserialize, Clone)]
pub struct ContainerSeed {
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
    /// Name of the depot holding the stock; its location is copied to the listing
    pub depot: String,
    /// Tilt-bed delivery available
    #[serde(default = "default_true")]
    pub tilt_bed_delivery: bool,
    /// Flatbed delivery available
    #[serde(default = "default_true")]
    pub flatbed_delivery: bool,
    /// Depot pickup available
    #[serde(default = "default_true")]
    pub pickup_available: bool,
}

const fn default_true() -> bool {
    true
}

/// API credentials, read from the environment only
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// `SHIPSGO_API_KEY`
    pub shipsgo_api_key: Option<String>,
    /// `GOOGLE_MAPS_API_KEY`
    pub google_maps_api_key: Option<String>,
}

impl Secrets {
    /// Reads credentials from the environment. Blank values count as unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            shipsgo_api_key: non_blank_env("SHIPSGO_API_KEY"),
            google_maps_api_key: non_blank_env("GOOGLE_MAPS_API_KEY"),
        }
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses configuration from TOML text
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.search.page_size == 0 {
        return Err(Error::Config {
            message: "search.page_size must be at least 1".to_string(),
        });
    }

    let pricing = &config.pricing;
    for amount in [
        pricing.tilt_bed_rate,
        pricing.flatbed_rate,
        pricing.free_miles,
        pricing.per_mile_rate,
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount { amount });
        }
    }

    Ok(())
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A rate is negative or the page size is zero
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error: defaults are used and a warning is logged.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        warn!("No configuration file at {path}, using defaults");
        Ok(AppConfig::default())
    }
}
