//! Geometry kernel — great-circle math on a spherical earth.
//!
//! All functions are total: NaN input propagates NaN, no panics.

pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Great-circle distance in nautical miles (haversine).
pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_NM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing from point 1 to point 2, degrees in [0, 360).
pub fn bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Forward geodesic projection: destination point after traveling
/// `distance_nm` along `bearing` from (lat, lon). Returns (lat, lon).
pub fn destination(lat: f64, lon: f64, bearing: f64, distance_nm: f64) -> (f64, f64) {
    let delta = distance_nm / EARTH_RADIUS_NM;
    let theta = bearing.to_radians();
    let phi1 = lat.to_radians();
    let lam1 = lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lam2 = lam1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    (phi2.to_degrees(), ((lam2.to_degrees() + 540.0) % 360.0) - 180.0)
}

const COMPASS_LABELS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Nearest 16-point compass label, ties rounding toward the next sector.
pub fn direction_name(bearing: f64) -> &'static str {
    let idx = ((bearing / 22.5).round() as i64).rem_euclid(16) as usize;
    COMPASS_LABELS[idx]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
