//! Geographic value types

use serde::{Deserialize, Serialize};

/// Coordinates (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the valid lat/lon ranges.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    /// Parse the string pair most geocoders return (`"lat": "-23.55"`).
    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lon = lon.trim().parse::<f64>().ok()?;
        Self::new(lat, lon)
    }
}

/// Rectangular lat/lon region, usually the extent of a city
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Parse Nominatim's `boundingbox` array: `[latMin, latMax, lonMin, lonMax]`.
    pub fn from_nominatim(values: &[String]) -> Option<Self> {
        let [lat_min, lat_max, lon_min, lon_max] = values else {
            return None;
        };
        Some(Self {
            lat_min: lat_min.trim().parse().ok()?,
            lat_max: lat_max.trim().parse().ok()?,
            lon_min: lon_min.trim().parse().ok()?,
            lon_max: lon_max.trim().parse().ok()?,
        })
    }

    /// Viewbox parameter in the `lonMin,latMax,lonMax,latMin` order Nominatim expects.
    pub fn viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lon_min, self.lat_max, self.lon_max, self.lat_min
        )
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.lat)
            && (self.lon_min..=self.lon_max).contains(&point.lon)
    }
}
