//! Technician roster types

use std::collections::BTreeMap;

use serde::Serialize;

use super::Coordinates;

/// One roster row as read from the source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnicianRecord {
    /// Every column of the row, keyed by header. Passed through untouched.
    pub fields: BTreeMap<String, String>,
    /// Residential address, `None` when the address column is missing or blank
    pub address: Option<String>,
}

impl TechnicianRecord {
    pub fn new(fields: BTreeMap<String, String>, address: Option<String>) -> Self {
        Self { fields, address }
    }
}

/// A roster entry resolved for the current request
#[derive(Debug, Clone)]
pub struct Technician {
    pub record: TechnicianRecord,
    pub coords: Coordinates,
    pub distance_km: f64,
    pub price: f64,
}

/// Serialized technician: roster columns plus derived display values
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianPayload {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub coords: Coordinates,
    /// Kilometres, two decimals
    pub distance_km: String,
    /// Price, two decimals
    pub price: String,
}

/// Keys the payload computes itself. Roster columns with these names are dropped.
pub const RESERVED_PAYLOAD_KEYS: [&str; 3] = ["coords", "distanceKm", "price"];

impl From<&Technician> for TechnicianPayload {
    fn from(t: &Technician) -> Self {
        let fields = t
            .record
            .fields
            .iter()
            .filter(|(key, _)| !RESERVED_PAYLOAD_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            fields,
            coords: t.coords,
            distance_km: format!("{:.2}", t.distance_km),
            price: format!("{:.2}", t.price),
        }
    }
}
