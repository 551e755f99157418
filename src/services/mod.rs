//! Business logic services

pub mod address;
pub mod geo;
pub mod geocoding;
pub mod matching;
pub mod nominatim;
pub mod normalize;
pub mod photon;
pub mod resolver;
pub mod retry;
pub mod roster;
pub mod routing;
