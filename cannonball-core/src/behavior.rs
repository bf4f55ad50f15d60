//! Behavior detection — circling and loitering patterns from track history.
//!
//! Circling looks for a low-variance orbit around a stable centroid with
//! enough angular sweep to rule out a gentle course change. Loitering flags
//! an aircraft that has hung around its first-seen position past a time
//! threshold.

use crate::geo;
use crate::history::{FirstSeen, TrackPoint};

/// Default number of trailing samples examined for circling.
pub const CIRCLING_SAMPLES: usize = 10;

/// std/mean of centroid distances below this means a tight orbit.
const MAX_RADIUS_COEFFICIENT: f64 = 0.3;

/// Plausible orbit radius band, nm. Tighter than 0.5nm is GPS noise,
/// wider than 5nm is just flying around the area.
const MIN_ORBIT_RADIUS_NM: f64 = 0.5;
const MAX_ORBIT_RADIUS_NM: f64 = 5.0;

/// Angular sweep required before an orbit is confirmed (fraction of 360).
const MIN_CIRCLE_COMPLETION: f64 = 0.5;

/// Detect a circling pattern over the last `min_samples` track points.
/// Returns (is_circling, confidence in [0, 1]).
pub fn detect_circling(samples: &[TrackPoint], min_samples: usize) -> (bool, f64) {
    if samples.len() < min_samples {
        return (false, 0.0);
    }
    let window = &samples[samples.len() - min_samples..];

    let n = window.len() as f64;
    let centroid_lat = window.iter().map(|p| p.lat).sum::<f64>() / n;
    let centroid_lon = window.iter().map(|p| p.lon).sum::<f64>() / n;

    let radii: Vec<f64> = window
        .iter()
        .map(|p| geo::distance_nm(centroid_lat, centroid_lon, p.lat, p.lon))
        .collect();
    let mean = radii.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return (false, 0.0);
    }
    let variance = radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let coefficient = variance.sqrt() / mean;

    if coefficient >= MAX_RADIUS_COEFFICIENT
        || mean <= MIN_ORBIT_RADIUS_NM
        || mean >= MAX_ORBIT_RADIUS_NM
    {
        return (false, 0.0);
    }

    // Total angular sweep around the centroid.
    let mut sweep = 0.0;
    let mut prev_bearing: Option<f64> = None;
    for p in window {
        let b = geo::bearing_deg(centroid_lat, centroid_lon, p.lat, p.lon);
        if let Some(prev) = prev_bearing {
            let mut delta = b - prev;
            while delta > 180.0 {
                delta -= 360.0;
            }
            while delta < -180.0 {
                delta += 360.0;
            }
            sweep += delta.abs();
        }
        prev_bearing = Some(b);
    }

    let completion = sweep / 360.0;
    if completion <= MIN_CIRCLE_COMPLETION {
        return (false, 0.0);
    }

    let confidence = ((1.0 - coefficient) * completion).min(1.0);
    (true, confidence)
}

/// Detect loitering: still within 1.5x the first-seen distance after the
/// threshold has elapsed. Returns (is_loitering, elapsed minutes).
pub fn detect_loitering(
    first_seen: &FirstSeen,
    current_distance_nm: Option<f64>,
    now: f64,
    threshold_min: i64,
) -> (bool, i64) {
    let elapsed_min = ((now - first_seen.timestamp) / 60.0) as i64;
    if elapsed_min < threshold_min {
        return (false, elapsed_min);
    }
    let (first_dist, curr_dist) = match (first_seen.distance_nm, current_distance_nm) {
        (Some(f), Some(c)) => (f, c),
        _ => return (false, elapsed_min),
    };
    (curr_dist <= first_dist * 1.5, elapsed_min)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
