//! Address resolution chain
//!
//! Brazilian addresses arrive abbreviated, accented, with house numbers
//! geocoders do not know, or with the city glued to the state code. The
//! resolver tries progressively looser strategies and stops at the first hit:
//!
//! 1. direct free-text query (", Brasil" appended when missing)
//! 2. the same query, normalized
//! 3. structured street/city/state query for `<street>, <city> - <UF>, Brasil`,
//!    then without house numbers, then a search bounded to the city's extent
//! 4. the secondary provider, whose failures never propagate
//!
//! Calls run strictly one after another.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::defaults::DEFAULT_COUNTRY;
use crate::services::address::{parse_structured, strip_house_numbers, ParsedAddress, StructuredAddress};
use crate::services::geocoding::{FreeTextSearch, GeocodeCache, GeocodingProvider, Place, StructuredQuery};
use crate::services::normalize::normalize_address;
use crate::types::Coordinates;

/// Which step of the chain produced a coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Cached,
    Direct,
    Normalized,
    Structured,
    StructuredWithoutNumber,
    CityBounded,
    Secondary,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Cached => "cached",
            Strategy::Direct => "direct",
            Strategy::Normalized => "normalized",
            Strategy::Structured => "structured",
            Strategy::StructuredWithoutNumber => "structured_without_number",
            Strategy::CityBounded => "city_bounded",
            Strategy::Secondary => "secondary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub coordinates: Coordinates,
    pub strategy: Strategy,
}

/// Append ", Brasil" unless the text already mentions the country.
pub fn with_country_suffix(raw: &str) -> String {
    if raw.to_lowercase().contains(&DEFAULT_COUNTRY.to_lowercase()) {
        raw.to_string()
    } else {
        format!("{}, {}", raw, DEFAULT_COUNTRY)
    }
}

fn first_hit(places: &[Place]) -> Option<Coordinates> {
    places.first().map(|p| p.coordinates)
}

pub struct GeocodeResolver {
    primary: Arc<dyn GeocodingProvider>,
    secondary: Option<Arc<dyn FreeTextSearch>>,
    cache: Option<Arc<dyn GeocodeCache>>,
}

impl GeocodeResolver {
    pub fn new(primary: Arc<dyn GeocodingProvider>) -> Self {
        Self {
            primary,
            secondary: None,
            cache: None,
        }
    }

    pub fn with_secondary(mut self, secondary: Option<Arc<dyn FreeTextSearch>>) -> Self {
        self.secondary = secondary;
        self
    }

    pub fn with_cache(mut self, cache: Option<Arc<dyn GeocodeCache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn primary(&self) -> &Arc<dyn GeocodingProvider> {
        &self.primary
    }

    /// Resolve an address to coordinates. `Ok(None)` when every strategy misses.
    pub async fn resolve(&self, raw: &str) -> Result<Option<Coordinates>> {
        Ok(self.resolve_with_strategy(raw).await?.map(|r| r.coordinates))
    }

    pub async fn resolve_with_strategy(&self, raw: &str) -> Result<Option<Resolution>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        if let Some(coordinates) = self.cache.as_ref().and_then(|c| c.get(raw)) {
            return Ok(Some(Resolution {
                coordinates,
                strategy: Strategy::Cached,
            }));
        }

        let resolution = self.run_chain(raw).await?;

        match &resolution {
            Some(r) => {
                debug!("Resolved '{}' via {} strategy", raw, r.strategy.as_str());
                if let Some(cache) = &self.cache {
                    cache.insert(raw, r.coordinates);
                }
            }
            None => info!("Could not resolve '{}'", raw),
        }

        Ok(resolution)
    }

    async fn run_chain(&self, raw: &str) -> Result<Option<Resolution>> {
        let with_country = with_country_suffix(raw);
        let normalized = normalize_address(&with_country);

        if let Some(c) = first_hit(&self.primary.search(&with_country).await?) {
            return Ok(Some(found(c, Strategy::Direct)));
        }

        if let Some(c) = first_hit(&self.primary.search(&normalized).await?) {
            return Ok(Some(found(c, Strategy::Normalized)));
        }

        if let ParsedAddress::Matched(address) = parse_structured(&normalized) {
            if let Some(r) = self.structured_strategies(&address, &normalized).await? {
                return Ok(Some(r));
            }
        }

        Ok(self
            .secondary_fallback(&normalized)
            .await
            .map(|c| found(c, Strategy::Secondary)))
    }

    async fn structured_strategies(
        &self,
        address: &StructuredAddress,
        normalized: &str,
    ) -> Result<Option<Resolution>> {
        let query = StructuredQuery::street(&address.street, &address.city, &address.state);
        if let Some(c) = first_hit(&self.primary.search_structured(&query).await?) {
            return Ok(Some(found(c, Strategy::Structured)));
        }

        let without_number = strip_house_numbers(&address.street);
        if !without_number.is_empty() && without_number != address.street {
            let query = StructuredQuery::street(without_number, &address.city, &address.state);
            if let Some(c) = first_hit(&self.primary.search_structured(&query).await?) {
                return Ok(Some(found(c, Strategy::StructuredWithoutNumber)));
            }
        }

        let city = self
            .primary
            .search_structured(&StructuredQuery::city(&address.city, &address.state))
            .await?;
        let Some(bbox) = city.first().and_then(|p| p.bounding_box) else {
            return Ok(None);
        };

        let text = if address.street.is_empty() {
            normalized
        } else {
            address.street.as_str()
        };
        Ok(first_hit(&self.primary.search_bounded(text, &bbox).await?)
            .map(|c| found(c, Strategy::CityBounded)))
    }

    async fn secondary_fallback(&self, normalized: &str) -> Option<Coordinates> {
        let secondary = self.secondary.as_ref()?;
        match secondary.search(normalized).await {
            Ok(places) => first_hit(&places),
            Err(e) => {
                debug!("Fallback geocoder {} failed: {:#}", secondary.name(), e);
                None
            }
        }
    }
}

fn found(coordinates: Coordinates, strategy: Strategy) -> Resolution {
    Resolution {
        coordinates,
        strategy,
    }
}
