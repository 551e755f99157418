//! Geocoding abstraction layer
//!
//! Providers are hidden behind two narrow traits so the resolution chain can
//! run against deterministic stubs:
//! - [`FreeTextSearch`]: a single free-text lookup (enough for Photon)
//! - [`GeocodingProvider`]: free-text, structured and bounded search plus
//!   reverse lookup (Nominatim)
//!
//! Configuration via GEOCODER_BACKEND env variable:
//! - "nominatim" → NominatimClient, with Photon as the secondary provider
//! - "mock" → MockGeocoder (tests, offline development)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{Config, GeocoderBackend};
use crate::defaults::DEFAULT_COUNTRY;
use crate::services::nominatim::NominatimClient;
use crate::services::photon::PhotonClient;
use crate::types::{BoundingBox, Coordinates};

/// One geocoder hit
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub coordinates: Coordinates,
    /// City extent, only reported for area-level hits
    pub bounding_box: Option<BoundingBox>,
}

impl Place {
    pub fn at(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            bounding_box: None,
        }
    }
}

/// Structured search fields. Without a street this is a city-level query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredQuery {
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl StructuredQuery {
    pub fn street(street: impl Into<String>, city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            street: Some(street.into()),
            city: city.into(),
            state: state.into(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }

    pub fn city(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            street: None,
            city: city.into(),
            state: state.into(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

/// Reverse geocoding output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocodeOutput {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub display_name: String,
}

/// Free-text lookup, the minimum a geocoder must offer
#[async_trait]
pub trait FreeTextSearch: Send + Sync {
    /// Search for `query`, best hit first. An empty vec means "not found".
    async fn search(&self, query: &str) -> Result<Vec<Place>>;

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

/// Full-featured geocoding provider
#[async_trait]
pub trait GeocodingProvider: FreeTextSearch {
    async fn search_structured(&self, query: &StructuredQuery) -> Result<Vec<Place>>;

    /// Free-text search restricted to `bbox`
    async fn search_bounded(&self, query: &str, bbox: &BoundingBox) -> Result<Vec<Place>>;

    async fn reverse(&self, at: Coordinates) -> Result<Option<ReverseGeocodeOutput>>;
}

// ==========================================================================
// MockGeocoder Implementation
// ==========================================================================

/// Mock geocoder for testing - returns deterministic fake coordinates
pub struct MockGeocoder;

/// Inner bounds of Brazil, away from borders and coastline
const MOCK_LAT_MIN: f64 = -25.0;
const MOCK_LAT_MAX: f64 = -5.0;
const MOCK_LON_MIN: f64 = -52.0;
const MOCK_LON_MAX: f64 = -38.0;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    fn hash_parts(parts: &[&str]) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        for part in parts {
            part.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Map a hash into `bbox`, using different halves for lat and lon
    fn hash_into(hash: u64, bbox: &BoundingBox) -> Coordinates {
        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lon_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        Coordinates {
            lat: bbox.lat_min + lat_normalized * (bbox.lat_max - bbox.lat_min),
            lon: bbox.lon_min + lon_normalized * (bbox.lon_max - bbox.lon_min),
        }
    }

    fn country_box() -> BoundingBox {
        BoundingBox {
            lat_min: MOCK_LAT_MIN,
            lat_max: MOCK_LAT_MAX,
            lon_min: MOCK_LON_MIN,
            lon_max: MOCK_LON_MAX,
        }
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FreeTextSearch for MockGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        if query.trim().is_empty() {
            return Ok(vec![]);
        }
        let hash = Self::hash_parts(&[&query.to_lowercase()]);
        Ok(vec![Place::at(Self::hash_into(hash, &Self::country_box()))])
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[async_trait]
impl GeocodingProvider for MockGeocoder {
    async fn search_structured(&self, query: &StructuredQuery) -> Result<Vec<Place>> {
        let street = query.street.as_deref().unwrap_or_default();
        let hash = Self::hash_parts(&[street, &query.city, &query.state]);
        let coordinates = Self::hash_into(hash, &Self::country_box());

        // City-level hits carry a small box around the city centre
        let bounding_box = query.street.is_none().then(|| BoundingBox {
            lat_min: coordinates.lat - 0.1,
            lat_max: coordinates.lat + 0.1,
            lon_min: coordinates.lon - 0.1,
            lon_max: coordinates.lon + 0.1,
        });

        Ok(vec![Place {
            coordinates,
            bounding_box,
        }])
    }

    async fn search_bounded(&self, query: &str, bbox: &BoundingBox) -> Result<Vec<Place>> {
        let hash = Self::hash_parts(&[&query.to_lowercase()]);
        Ok(vec![Place::at(Self::hash_into(hash, bbox))])
    }

    async fn reverse(&self, at: Coordinates) -> Result<Option<ReverseGeocodeOutput>> {
        Ok(Some(ReverseGeocodeOutput {
            display_name: format!("{:.5}, {:.5}", at.lat, at.lon),
            ..Default::default()
        }))
    }
}

// ==========================================================================
// RateLimiter Implementation
// ==========================================================================

/// Rate limiter that enforces minimum interval between calls
pub struct RateLimiter {
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait until it's safe to make another call
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

// ==========================================================================
// Geocode cache seam
// ==========================================================================

/// Optional store for resolved addresses, keyed by the trimmed raw address
pub trait GeocodeCache: Send + Sync {
    fn get(&self, address: &str) -> Option<Coordinates>;
    fn insert(&self, address: &str, coordinates: Coordinates);
}

/// Process-local cache. Lost on restart.
#[derive(Default)]
pub struct InMemoryGeocodeCache {
    entries: parking_lot::Mutex<HashMap<String, Coordinates>>,
}

impl InMemoryGeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeocodeCache for InMemoryGeocodeCache {
    fn get(&self, address: &str) -> Option<Coordinates> {
        self.entries.lock().get(address).copied()
    }

    fn insert(&self, address: &str, coordinates: Coordinates) {
        self.entries.lock().insert(address.to_string(), coordinates);
    }
}

// ==========================================================================
// Factory functions
// ==========================================================================

/// Create the primary geocoder based on `GEOCODER_BACKEND`
pub fn create_geocoder(config: &Config) -> Result<Arc<dyn GeocodingProvider>> {
    match config.geocoder_backend {
        GeocoderBackend::Mock => {
            info!("Using MockGeocoder");
            Ok(Arc::new(MockGeocoder::new()))
        }
        GeocoderBackend::Nominatim => {
            info!("Using NominatimClient at {}", config.nominatim_url);
            let client = NominatimClient::new(&config.nominatim_url, &config.user_agent, config.http_timeout)?
                .with_retry_policy(config.rate_limit_retry)
                .with_min_interval(config.nominatim_min_interval);
            Ok(Arc::new(client))
        }
    }
}

/// Create the secondary (fallback) geocoder, if one is configured
pub fn create_secondary_geocoder(config: &Config) -> Result<Option<Arc<dyn FreeTextSearch>>> {
    if config.geocoder_backend == GeocoderBackend::Mock {
        return Ok(None);
    }
    match &config.photon_url {
        Some(url) => {
            info!("Using PhotonClient at {} as fallback geocoder", url);
            let client = PhotonClient::new(url, &config.user_agent, config.http_timeout)?;
            Ok(Some(Arc::new(client)))
        }
        None => {
            info!("No fallback geocoder configured");
            Ok(None)
        }
    }
}

pub fn create_geocode_cache(config: &Config) -> Option<Arc<dyn GeocodeCache>> {
    if config.geocode_cache {
        info!("Geocode results are cached in memory");
        Some(Arc::new(InMemoryGeocodeCache::new()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // MockGeocoder Tests
    // ==========================================================================

    #[tokio::test]
    async fn mock_geocoder_returns_coordinates_for_any_address() {
        let geocoder = MockGeocoder::new();

        let places = geocoder.search("Avenida Paulista 1000, São Paulo").await.unwrap();

        assert_eq!(places.len(), 1, "MockGeocoder should always return one hit");
    }

    #[tokio::test]
    async fn mock_geocoder_returns_nothing_for_blank_query() {
        let geocoder = MockGeocoder::new();
        assert!(geocoder.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mock_geocoder_returns_deterministic_coordinates() {
        let geocoder = MockGeocoder::new();

        let a = geocoder.search("Rua Augusta 1500").await.unwrap();
        let b = geocoder.search("Rua Augusta 1500").await.unwrap();

        assert_eq!(a[0].coordinates, b[0].coordinates);
    }

    #[tokio::test]
    async fn mock_geocoder_returns_different_coordinates_for_different_addresses() {
        let geocoder = MockGeocoder::new();

        let sp = geocoder.search("Praça da Sé, São Paulo").await.unwrap();
        let rj = geocoder.search("Praça XV, Rio de Janeiro").await.unwrap();

        assert_ne!(sp[0].coordinates, rj[0].coordinates);
    }

    #[tokio::test]
    async fn mock_geocoder_returns_coordinates_within_brazil() {
        let geocoder = MockGeocoder::new();

        for address in ["Rua 1", "Rua 2", "Avenida Brasil", "Estrada Velha"] {
            let place = &geocoder.search(address).await.unwrap()[0];
            assert!(
                MockGeocoder::country_box().contains(&place.coordinates),
                "{:?} out of bounds for {}",
                place.coordinates,
                address
            );
        }
    }

    #[tokio::test]
    async fn mock_geocoder_city_query_carries_bounding_box() {
        let geocoder = MockGeocoder::new();

        let city = geocoder
            .search_structured(&StructuredQuery::city("Campinas", "SP"))
            .await
            .unwrap();
        let street = geocoder
            .search_structured(&StructuredQuery::street("Rua A", "Campinas", "SP"))
            .await
            .unwrap();

        assert!(city[0].bounding_box.is_some());
        assert!(street[0].bounding_box.is_none());
    }

    #[tokio::test]
    async fn mock_geocoder_bounded_search_stays_inside_box() {
        let geocoder = MockGeocoder::new();
        let bbox = BoundingBox {
            lat_min: -23.0,
            lat_max: -22.8,
            lon_min: -47.2,
            lon_max: -47.0,
        };

        let places = geocoder.search_bounded("Rua das Flores", &bbox).await.unwrap();

        assert!(bbox.contains(&places[0].coordinates));
    }

    #[test]
    fn mock_geocoder_name_is_mock() {
        assert_eq!(MockGeocoder::new().name(), "mock");
    }

    #[test]
    fn structured_query_defaults_country() {
        let q = StructuredQuery::street("Rua A", "Santos", "SP");
        assert_eq!(q.country, "Brasil");
        assert_eq!(q.street.as_deref(), Some("Rua A"));
        assert!(StructuredQuery::city("Santos", "SP").street.is_none());
    }

    // ==========================================================================
    // RateLimiter Tests
    // ==========================================================================

    #[tokio::test]
    async fn rate_limiter_enforces_minimum_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let start = Instant::now();

        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50), "First call should be immediate");

        limiter.wait().await;
        let after_second = start.elapsed();
        assert!(
            after_second >= Duration::from_millis(100),
            "Second call should wait at least 100ms, took {:?}",
            after_second
        );
    }

    #[tokio::test]
    async fn rate_limiter_allows_call_after_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(50));

        limiter.wait().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    // ==========================================================================
    // Cache Tests
    // ==========================================================================

    #[test]
    fn in_memory_cache_round_trip() {
        let cache = InMemoryGeocodeCache::new();
        assert!(cache.get("Rua A").is_none());

        cache.insert("Rua A", Coordinates { lat: -23.0, lon: -46.0 });

        assert!(cache.get("Rua B").is_none());
        assert_eq!(cache.get("Rua A"), Some(Coordinates { lat: -23.0, lon: -46.0 }));
    }

    // ==========================================================================
    // Factory Tests
    // ==========================================================================

    #[test]
    fn factory_creates_mock_geocoder_without_fallback() {
        let config = Config {
            geocoder_backend: GeocoderBackend::Mock,
            ..Config::default()
        };

        assert_eq!(create_geocoder(&config).unwrap().name(), "mock");
        assert!(create_secondary_geocoder(&config).unwrap().is_none());
    }

    #[test]
    fn factory_creates_nominatim_with_photon_fallback() {
        let config = Config::default();

        assert_eq!(create_geocoder(&config).unwrap().name(), "nominatim");
        let secondary = create_secondary_geocoder(&config).unwrap();
        assert_eq!(secondary.map(|s| s.name()), Some("photon"));
    }

    #[test]
    fn factory_cache_is_opt_in() {
        assert!(create_geocode_cache(&Config::default()).is_none());

        let config = Config {
            geocode_cache: true,
            ..Config::default()
        };
        assert!(create_geocode_cache(&config).is_some());
    }
}
