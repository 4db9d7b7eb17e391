//! Great-circle distance helpers

use crate::data::Coordinates;

/// Mean Earth radius in kilometers (IUGG)
const EARTH_RADIUS_KM: f64 = 6371.0088;

const KM_PER_MILE: f64 = 1.609344;

/// Great-circle distance between two points in miles
///
/// Uses the Haversine formula on a spherical Earth.
pub fn distance_miles(from: Coordinates, to: Coordinates) -> f64 {
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c / KM_PER_MILE
}

/// Rounds to 3 decimal places
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let miles = round3(distance_miles(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0)));
        assert_eq!(miles, 69.093);
    }

    #[test]
    fn test_same_point_is_zero() {
        let here = Coordinates::new(40.72797292, -73.98678763);
        assert_eq!(distance_miles(here, here), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(40.7280, -73.9868);
        let b = Coordinates::new(40.7306, -73.9866);
        assert!((distance_miles(a, b) - distance_miles(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_manhattan_blocks() {
        // Astor Place to Union Square is roughly 0.4 miles
        let astor = Coordinates::new(40.7300, -73.9910);
        let union_square = Coordinates::new(40.7359, -73.9911);
        let miles = distance_miles(astor, union_square);
        assert!(miles > 0.3 && miles < 0.6, "got {}", miles);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(0.0004), 0.0);
        assert_eq!(round3(-2.0005), -2.001);
    }
}
