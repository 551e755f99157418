//! Built-in defaults for configuration values

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_ROSTER_FILE: &str = "./tecnicos.csv";
pub const DEFAULT_ADDRESS_COLUMN: &str = "ENDEREÇO/RESIDENCIA";

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_PHOTON_URL: &str = "https://photon.komoot.io";
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_USER_AGENT: &str = "controle-tecnicos/1.0";

/// Country name appended to queries and used for structured search
pub const DEFAULT_COUNTRY: &str = "Brasil";

pub const DEFAULT_RATE_LIMIT_RETRY_ATTEMPTS: u32 = 2;
pub const DEFAULT_RATE_LIMIT_RETRY_DELAY_MS: u64 = 1000;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_ROUND_TRIP_FACTOR: f64 = 2.0;
pub const DEFAULT_RATE_PER_KM: f64 = 1.3;
