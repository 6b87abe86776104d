//! Great-circle distance helpers for partner store listings.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two WGS84 coordinates.
pub fn haversine_distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Short display form, metres under one kilometre.
pub fn distance_label(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1}km", km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points() {
        assert!(haversine_distance_km(37.0, 127.0, 37.0, 127.0).abs() < 1e-9);
    }

    #[test]
    fn test_seoul_to_busan() {
        let d = haversine_distance_km(37.5665, 126.978, 35.1796, 129.0756);
        assert!(d > 320.0 && d < 450.0, "got {d}");
    }

    #[test]
    fn test_distance_label() {
        assert_eq!(distance_label(0.4), "400m");
        assert_eq!(distance_label(1.26), "1.3km");
    }
}
