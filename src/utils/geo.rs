/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_bangalore_mysore() {
        // Bangalore center
        let bangalore = (12.9716, 77.5946);
        // Mysore center
        let mysore = (12.2958, 76.6394);

        let distance = haversine_distance(bangalore.0, bangalore.1, mysore.0, mysore.1);
        // Should be approximately 125-135 km
        assert!(distance > 100.0 && distance < 160.0);
    }

    #[test]
    fn test_haversine_zero_distance() {
        let d = haversine_distance(12.9716, 77.5946, 12.9716, 77.5946);
        assert!(d.abs() < 1e-9);
    }
}
