//! Nearest-technician matching
//!
//! Resolves the service address, resolves every roster entry in order,
//! measures the road distance from each technician to the service address
//! and picks the closest one. Ties keep the technician listed first.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::defaults::{DEFAULT_RATE_PER_KM, DEFAULT_ROUND_TRIP_FACTOR};
use crate::error::MatchError;
use crate::services::geocoding::{create_geocode_cache, create_geocoder, create_secondary_geocoder};
use crate::services::resolver::GeocodeResolver;
use crate::services::roster::{CsvRosterProvider, RosterProvider};
use crate::services::routing::{create_routing_service, RoutingService};
use crate::types::{Coordinates, Technician, TechnicianRecord};

/// Price = distance × round-trip factor × rate per km
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingConfig {
    pub round_trip_factor: f64,
    pub rate_per_km: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            round_trip_factor: DEFAULT_ROUND_TRIP_FACTOR,
            rate_per_km: DEFAULT_RATE_PER_KM,
        }
    }
}

impl PricingConfig {
    pub fn price_for(&self, distance_km: f64) -> f64 {
        distance_km * self.round_trip_factor * self.rate_per_km
    }
}

/// Index of the smallest distance. Only a strictly smaller distance replaces
/// the current best, so the earliest of equal distances wins.
pub fn select_nearest<I>(distances: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, distance) in distances.into_iter().enumerate() {
        match best {
            Some((_, best_distance)) if !(distance < best_distance) => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub technician: Technician,
    /// Technicians that resolved to coordinates and were compared
    pub candidates: usize,
}

pub struct MatchEngine {
    resolver: Arc<GeocodeResolver>,
    routing: Arc<dyn RoutingService>,
    roster: Arc<dyn RosterProvider>,
    pricing: PricingConfig,
}

impl MatchEngine {
    pub fn new(
        resolver: Arc<GeocodeResolver>,
        routing: Arc<dyn RoutingService>,
        roster: Arc<dyn RosterProvider>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            resolver,
            routing,
            roster,
            pricing,
        }
    }

    /// Wire geocoders, routing and roster from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let resolver = GeocodeResolver::new(create_geocoder(config)?)
            .with_secondary(create_secondary_geocoder(config)?)
            .with_cache(create_geocode_cache(config));
        let routing: Arc<dyn RoutingService> = Arc::from(create_routing_service(config)?);
        let roster = CsvRosterProvider::new(&config.roster_path, &config.roster_address_column);

        Ok(Self::new(
            Arc::new(resolver),
            routing,
            Arc::new(roster),
            config.pricing,
        ))
    }

    pub fn resolver(&self) -> &GeocodeResolver {
        &self.resolver
    }

    /// Find the nearest technician to `target`.
    pub async fn match_address(&self, target: &str) -> Result<MatchResult, MatchError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(MatchError::InvalidInput);
        }

        let destination = self
            .resolver
            .resolve(target)
            .await
            .map_err(MatchError::Upstream)?
            .ok_or(MatchError::UnresolvableAddress)?;
        info!("Service address '{}' resolved to {:?}", target, destination);

        let records = self.roster.load().await.map_err(MatchError::Roster)?;
        let located = self.locate_roster(records).await?;
        if located.is_empty() {
            return Err(MatchError::EmptyRoster);
        }

        let mut technicians = Vec::with_capacity(located.len());
        for (record, coords) in located {
            let distance_km = self
                .routing
                .distance_km(coords, destination)
                .await
                .map_err(MatchError::Upstream)?;
            technicians.push(Technician {
                record,
                coords,
                distance_km,
                price: self.pricing.price_for(distance_km),
            });
        }

        let candidates = technicians.len();
        let best = select_nearest(technicians.iter().map(|t| t.distance_km))
            .ok_or(MatchError::EmptyRoster)?;
        let technician = technicians.swap_remove(best);

        if !technician.distance_km.is_finite() {
            return Err(MatchError::NoRoute);
        }

        info!(
            "Selected technician #{} of {} at {:.2} km",
            best + 1,
            candidates,
            technician.distance_km
        );
        Ok(MatchResult {
            technician,
            candidates,
        })
    }

    /// Geocode roster entries one at a time, dropping those that do not resolve
    async fn locate_roster(
        &self,
        records: Vec<TechnicianRecord>,
    ) -> Result<Vec<(TechnicianRecord, Coordinates)>, MatchError> {
        let mut located = Vec::with_capacity(records.len());
        for record in records {
            let Some(address) = record.address.as_deref() else {
                debug!("Skipping roster entry without address");
                continue;
            };
            match self.resolver.resolve(address).await.map_err(MatchError::Upstream)? {
                Some(coords) => located.push((record, coords)),
                None => warn!("Technician address not located: {}", address),
            }
        }
        Ok(located)
    }
}
