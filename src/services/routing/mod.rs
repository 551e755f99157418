//! Routing service for road distances
//!
//! Uses OSRM for production, mock for tests.

mod osrm;

pub use osrm::{OsrmClient, OsrmConfig};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, RoutingBackend};
use crate::types::Coordinates;

/// Routing service trait for abstraction (OSRM, mock, etc.)
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Driving distance in kilometers. `f64::INFINITY` when no route exists.
    async fn distance_km(&self, origin: Coordinates, destination: Coordinates) -> Result<f64>;

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Mock routing service for tests
/// Uses Haversine distance × coefficient for estimation
pub struct MockRoutingService {
    /// Coefficient for converting straight-line to road distance (default: 1.3)
    road_coefficient: f64,
}

impl Default for MockRoutingService {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
        }
    }
}

impl MockRoutingService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoutingService for MockRoutingService {
    async fn distance_km(&self, origin: Coordinates, destination: Coordinates) -> Result<f64> {
        use crate::services::geo::haversine_distance;

        Ok(haversine_distance(&origin, &destination) * self.road_coefficient)
    }

    fn name(&self) -> &str {
        "MockRouting"
    }
}

/// Create routing service based on configuration
pub fn create_routing_service(config: &Config) -> Result<Box<dyn RoutingService>> {
    match config.routing_backend {
        RoutingBackend::Osrm => {
            info!("Using OSRM routing at {}", config.osrm_url);
            let osrm = OsrmConfig {
                base_url: config.osrm_url.clone(),
                timeout: config.http_timeout,
                ..Default::default()
            };
            Ok(Box::new(OsrmClient::new(osrm)?))
        }
        RoutingBackend::Mock => {
            info!("Using mock routing service");
            Ok(Box::new(MockRoutingService::new()))
        }
    }
}
