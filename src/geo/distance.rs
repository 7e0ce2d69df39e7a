//! Great-circle distance over decoded routes.

use super::types::{Coordinate, RoutePath};

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Sum of consecutive segment distances along `path`.
///
/// Paths with fewer than two points have length 0.
pub fn total_distance_km(path: &RoutePath) -> f64 {
    path.points()
        .windows(2)
        .map(|pair| haversine_km(&pair[0], &pair[1]))
        .sum()
}

/// Round a distance to one decimal place for display.
pub fn round_km(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}
