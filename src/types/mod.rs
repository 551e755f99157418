//! Type definitions

pub mod geo;
pub mod messages;
pub mod technician;

pub use geo::*;
pub use messages::*;
pub use technician::*;
