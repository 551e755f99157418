//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_sao_paulo_campinas() {
        let sao_paulo = Coordinates { lat: -23.5505, lon: -46.6333 };
        let campinas = Coordinates { lat: -22.9056, lon: -47.0608 };

        let distance = haversine_distance(&sao_paulo, &campinas);

        // Sao Paulo to Campinas is approximately 84 km in a straight line
        assert!((distance - 84.0).abs() < 5.0, "got {} km", distance);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinates { lat: -23.0, lon: -46.0 };
        assert!(haversine_distance(&point, &point).abs() < 0.001);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = Coordinates { lat: -23.5505, lon: -46.6333 };
        let b = Coordinates { lat: -22.9068, lon: -43.1729 };
        assert!((haversine_distance(&a, &b) - haversine_distance(&b, &a)).abs() < 1e-9);
    }
}
