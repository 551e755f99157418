//! Configuration management

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{self, Context, Result};

use crate::defaults::*;
use crate::services::matching::PricingConfig;
use crate::services::retry::RetryPolicy;

/// Which primary geocoder to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocoderBackend {
    Nominatim,
    Mock,
}

impl FromStr for GeocoderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nominatim" => Ok(Self::Nominatim),
            "mock" => Ok(Self::Mock),
            other => anyhow::bail!("Unknown GEOCODER_BACKEND '{}' (expected nominatim or mock)", other),
        }
    }
}

/// Which routing service to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingBackend {
    Osrm,
    Mock,
}

impl FromStr for RoutingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "osrm" => Ok(Self::Osrm),
            "mock" => Ok(Self::Mock),
            other => anyhow::bail!("Unknown ROUTING_BACKEND '{}' (expected osrm or mock)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listening port
    pub port: u16,

    /// Technician roster CSV, re-read on every request
    pub roster_path: PathBuf,

    /// Header of the roster column holding the residential address
    pub roster_address_column: String,

    /// Frontend directory served at `/` (optional)
    pub static_dir: Option<PathBuf>,

    pub geocoder_backend: GeocoderBackend,
    pub routing_backend: RoutingBackend,

    /// Nominatim API URL (primary geocoder)
    pub nominatim_url: String,

    /// Photon API URL (fallback geocoder). `None` disables the fallback.
    pub photon_url: Option<String>,

    /// OSRM routing engine URL
    pub osrm_url: String,

    /// User-Agent sent to geocoders (required by the Nominatim usage policy)
    pub user_agent: String,

    pub http_timeout: Duration,

    /// Backoff for `429 Too Many Requests` from Nominatim
    pub rate_limit_retry: RetryPolicy,

    /// Minimum interval between Nominatim requests. Zero disables throttling.
    pub nominatim_min_interval: Duration,

    /// Keep resolved addresses in memory across requests
    pub geocode_cache: bool,

    pub pricing: PricingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            roster_path: PathBuf::from(DEFAULT_ROSTER_FILE),
            roster_address_column: DEFAULT_ADDRESS_COLUMN.to_string(),
            static_dir: None,
            geocoder_backend: GeocoderBackend::Nominatim,
            routing_backend: RoutingBackend::Osrm,
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            photon_url: Some(DEFAULT_PHOTON_URL.to_string()),
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            rate_limit_retry: RetryPolicy::default(),
            nominatim_min_interval: Duration::ZERO,
            geocode_cache: false,
            pricing: PricingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unset or empty keys use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = parse_or(&get, "PORT", defaults.port)?;

        let roster_path = get("TECNICOS_FILE").map(PathBuf::from).unwrap_or(defaults.roster_path);
        let roster_address_column = get("ROSTER_ADDRESS_COLUMN").unwrap_or(defaults.roster_address_column);
        let static_dir = get("STATIC_DIR").map(PathBuf::from);

        let geocoder_backend = parse_or(&get, "GEOCODER_BACKEND", defaults.geocoder_backend)?;
        let routing_backend = parse_or(&get, "ROUTING_BACKEND", defaults.routing_backend)?;

        let nominatim_url = get("NOMINATIM_URL").unwrap_or(defaults.nominatim_url);
        // PHOTON_URL set but empty turns the fallback off
        let photon_url = match lookup("PHOTON_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url.trim().to_string()),
            None => defaults.photon_url,
        };
        let osrm_url = get("OSRM_URL").unwrap_or(defaults.osrm_url);
        let user_agent = get("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent);

        let http_timeout = Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?);

        let rate_limit_retry = RetryPolicy::new(
            parse_or(&get, "RATE_LIMIT_RETRY_ATTEMPTS", DEFAULT_RATE_LIMIT_RETRY_ATTEMPTS)?,
            Duration::from_millis(parse_or(&get, "RATE_LIMIT_RETRY_DELAY_MS", DEFAULT_RATE_LIMIT_RETRY_DELAY_MS)?),
        );
        let nominatim_min_interval = Duration::from_millis(parse_or(&get, "NOMINATIM_MIN_INTERVAL_MS", 0u64)?);

        let geocode_cache = match get("GEOCODE_CACHE").as_deref() {
            None | Some("none") => false,
            Some("memory") => true,
            Some(other) => anyhow::bail!("Unknown GEOCODE_CACHE '{}' (expected none or memory)", other),
        };

        let pricing = PricingConfig {
            round_trip_factor: parse_or(&get, "PRICE_ROUND_TRIP_FACTOR", defaults.pricing.round_trip_factor)?,
            rate_per_km: parse_or(&get, "PRICE_RATE_PER_KM", defaults.pricing.rate_per_km)?,
        };

        Ok(Self {
            port,
            roster_path,
            roster_address_column,
            static_dir,
            geocoder_backend,
            routing_backend,
            nominatim_url,
            photon_url,
            osrm_url,
            user_agent,
            http_timeout,
            rate_limit_retry,
            nominatim_min_interval,
            geocode_cache,
            pricing,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
