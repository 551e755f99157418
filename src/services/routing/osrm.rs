//! OSRM routing engine client
//!
//! OSRM API documentation:
//! http://project-osrm.org/docs/v5.24.0/api/#route-service

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::RoutingService;
use crate::defaults::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_OSRM_URL};
use crate::types::Coordinates;

/// OSRM client configuration
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of OSRM server (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Routing profile, part of the request path
    pub profile: String,
    pub timeout: Duration,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OSRM_URL.to_string(),
            profile: "driving".to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    /// Meters
    distance: f64,
}

/// OSRM routing client
pub struct OsrmClient {
    client: Client,
    config: OsrmConfig,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Route URL; OSRM takes `lon,lat` pairs separated by `;`
    fn route_url(&self, origin: &Coordinates, destination: &Coordinates) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=false",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            origin.lon,
            origin.lat,
            destination.lon,
            destination.lat
        )
    }
}

#[async_trait]
impl RoutingService for OsrmClient {
    async fn distance_km(&self, origin: Coordinates, destination: Coordinates) -> Result<f64> {
        let url = self.route_url(&origin, &destination);
        debug!("Requesting route from OSRM: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to OSRM")?;

        // OSRM reports "NoRoute" with a 4xx status and a JSON body; only the body matters
        let status = response.status();
        let body = response.text().await.context("Failed to read OSRM response")?;
        let route: RouteResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OSRM response (status {})", status))?;

        match route.routes.first() {
            Some(r) => Ok(r.distance / 1000.0),
            None => {
                warn!("No route between {:?} and {:?}", origin, destination);
                Ok(f64::INFINITY)
            }
        }
    }

    fn name(&self) -> &str {
        "OSRM"
    }
}
