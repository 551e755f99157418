//! Nominatim geocoding client
//!
//! API documentation: https://nominatim.org/release-docs/latest/api/Search/
//!
//! Public Nominatim answers `429 Too Many Requests` when its fair-use limit
//! is hit. Those responses are retried according to a [`RetryPolicy`]; if the
//! final attempt is still rate-limited the call reports "no result" so the
//! resolver can move on to its next strategy. Any other non-success status
//! is an outage and surfaces as an error.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::services::geocoding::{
    FreeTextSearch, GeocodingProvider, Place, RateLimiter, ReverseGeocodeOutput, StructuredQuery,
};
use crate::services::retry::RetryPolicy;
use crate::types::{BoundingBox, Coordinates};

/// Nominatim search hit
#[derive(Debug, Deserialize)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub boundingbox: Option<Vec<String>>,
}

impl NominatimResult {
    fn into_place(self) -> Result<Place> {
        let coordinates = Coordinates::parse(&self.lat, &self.lon).with_context(|| {
            format!("Invalid coordinates in geocoding response: {}, {}", self.lat, self.lon)
        })?;
        let bounding_box = self
            .boundingbox
            .as_deref()
            .and_then(BoundingBox::from_nominatim);

        Ok(Place {
            coordinates,
            bounding_box,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct NominatimReverseAddress {
    pub road: Option<String>,
    pub house_number: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NominatimReverseResult {
    pub display_name: String,
    pub address: Option<NominatimReverseAddress>,
}

/// Nominatim geocoding client
pub struct NominatimClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
    throttle: Option<RateLimiter>,
}

impl NominatimClient {
    /// Create a new client
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry: RetryPolicy::default(),
            throttle: None,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enforce a minimum interval between requests. Zero disables throttling.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.throttle = (!interval.is_zero()).then(|| RateLimiter::new(interval));
        self
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/{}?{}", self.base_url, endpoint, query)
    }

    /// GET with rate-limit backoff. `None` means the last attempt was still rate-limited.
    async fn get_with_backoff(&self, url: &str) -> Result<Option<reqwest::Response>> {
        let mut attempt = 1;
        loop {
            if let Some(throttle) = &self.throttle {
                throttle.wait().await;
            }

            let response = self
                .client
                .get(url)
                .send()
                .await
                .context("Failed to send geocoding request")?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(Some(response));
            }

            if !self.retry.should_retry(attempt) {
                warn!("Nominatim still rate-limited after {} attempts, giving up on this query", attempt);
                return Ok(None);
            }

            warn!("Nominatim rate-limited, retrying in {:?}", self.retry.backoff);
            tokio::time::sleep(self.retry.backoff).await;
            attempt += 1;
        }
    }

    async fn fetch_places(&self, url: &str) -> Result<Vec<Place>> {
        debug!("Nominatim request: {}", url);

        let Some(response) = self.get_with_backoff(url).await? else {
            return Ok(vec![]);
        };

        if !response.status().is_success() {
            anyhow::bail!("Nominatim returned status {}", response.status());
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        // A hit with unusable coordinates counts as a miss for this query
        Ok(results
            .into_iter()
            .take(1)
            .filter_map(|result| match result.into_place() {
                Ok(place) => Some(place),
                Err(e) => {
                    warn!("Ignoring Nominatim hit: {:#}", e);
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl FreeTextSearch for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let url = self.url(
            "search",
            &[("q", query), ("format", "json"), ("limit", "1"), ("addressdetails", "1")],
        );
        self.fetch_places(&url).await
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

#[async_trait]
impl GeocodingProvider for NominatimClient {
    async fn search_structured(&self, query: &StructuredQuery) -> Result<Vec<Place>> {
        let url = match &query.street {
            Some(street) => self.url(
                "search",
                &[
                    ("street", street.as_str()),
                    ("city", query.city.as_str()),
                    ("state", query.state.as_str()),
                    ("country", query.country.as_str()),
                    ("format", "json"),
                    ("limit", "1"),
                    ("addressdetails", "1"),
                ],
            ),
            None => self.url(
                "search",
                &[
                    ("city", query.city.as_str()),
                    ("state", query.state.as_str()),
                    ("country", query.country.as_str()),
                    ("format", "json"),
                    ("limit", "1"),
                    ("polygon_geojson", "0"),
                    ("addressdetails", "0"),
                ],
            ),
        };
        self.fetch_places(&url).await
    }

    async fn search_bounded(&self, query: &str, bbox: &BoundingBox) -> Result<Vec<Place>> {
        let viewbox = bbox.viewbox();
        let url = self.url(
            "search",
            &[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("bounded", "1"),
                ("viewbox", viewbox.as_str()),
            ],
        );
        self.fetch_places(&url).await
    }

    /// Reverse geocode coordinates to address
    async fn reverse(&self, at: Coordinates) -> Result<Option<ReverseGeocodeOutput>> {
        let lat = at.lat.to_string();
        let lon = at.lon.to_string();
        let url = self.url(
            "reverse",
            &[("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "json"), ("addressdetails", "1")],
        );

        let Some(response) = self.get_with_backoff(&url).await? else {
            return Ok(None);
        };

        if !response.status().is_success() {
            anyhow::bail!("Nominatim reverse returned status {}", response.status());
        }

        let result: NominatimReverseResult = response
            .json()
            .await
            .context("Failed to parse reverse geocoding response")?;

        let Some(address) = result.address else {
            return Ok(Some(ReverseGeocodeOutput {
                display_name: result.display_name,
                ..Default::default()
            }));
        };

        let city = address.city.or(address.town).or(address.village).unwrap_or_default();
        let street = match (address.road, address.house_number) {
            (Some(road), Some(number)) => format!("{}, {}", road, number),
            (Some(road), None) => road,
            _ => String::new(),
        };

        Ok(Some(ReverseGeocodeOutput {
            street,
            city,
            state: address.state.unwrap_or_default(),
            postal_code: address.postcode.unwrap_or_default(),
            display_name: result.display_name,
        }))
    }
}
