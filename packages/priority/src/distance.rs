//! Great-circle distance on a spherical Earth.

use sahaayak_report_models::Coordinates;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in decimal
/// degrees.
///
/// Inputs are not validated. Use [`Coordinates::new`] to reject non-finite
/// or out-of-range values first.
#[must_use]
pub fn distance(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let lat_a = lat_a.to_radians();
    let lat_b = lat_b.to_radians();
    let dlat = lat_b - lat_a;
    let dlon = (lon_b - lon_a).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Haversine distance in meters between two validated positions.
#[must_use]
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    distance(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}
