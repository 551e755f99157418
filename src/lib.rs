//! Controle Tecnicos - nearest technician dispatch
//!
//! Geocodes a service address, geocodes every technician on the roster,
//! measures road distance to each and quotes a price for the closest one.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod handlers;
pub mod services;
pub mod types;
