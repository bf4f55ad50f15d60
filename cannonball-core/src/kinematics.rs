//! Kinematics — trend classification, closing speed, and ETA/CPA prediction.
//!
//! Trend compares aircraft-to-observer distance across ticks with a small
//! hysteresis band so GPS jitter doesn't flap the label. Closing speed uses
//! both the observer's and the aircraft's previous positions; the two
//! signals are intentionally independent and can disagree under fast
//! observer movement.

use crate::geo;
use crate::types::{ObserverPosition, PredictionResult, Trend};

/// Distance deltas inside this band count as holding, nm.
pub const TREND_HYSTERESIS_NM: f64 = 0.05;

/// ETAs beyond this are numerically unstable, not real predictions.
const MAX_ETA_SEC: f64 = 1800.0;

/// Intercept flag threshold on predicted CPA, nm.
const INTERCEPT_CPA_NM: f64 = 1.0;

/// Classify trend from the current and previous-tick distances.
pub fn trend(current_nm: f64, previous_nm: Option<f64>) -> Trend {
    let prev = match previous_nm {
        Some(p) => p,
        None => return Trend::Unknown,
    };
    let delta = prev - current_nm;
    if delta > TREND_HYSTERESIS_NM {
        Trend::Approaching
    } else if delta < -TREND_HYSTERESIS_NM {
        Trend::Departing
    } else {
        Trend::Holding
    }
}

/// Closing speed in knots from consecutive observer and aircraft fixes.
/// Positive means the gap is shrinking. `None` without a full previous
/// observation or zero elapsed time.
pub fn closing_speed_kt(
    prev_observer: &ObserverPosition,
    curr_observer: &ObserverPosition,
    prev_aircraft: (f64, f64),
    curr_aircraft: (f64, f64),
    elapsed_sec: f64,
) -> Option<f64> {
    if elapsed_sec <= 0.0 {
        return None;
    }
    let prev_dist = geo::distance_nm(
        prev_observer.lat,
        prev_observer.lon,
        prev_aircraft.0,
        prev_aircraft.1,
    );
    let curr_dist = geo::distance_nm(
        curr_observer.lat,
        curr_observer.lon,
        curr_aircraft.0,
        curr_aircraft.1,
    );
    Some((prev_dist - curr_dist) / elapsed_sec * 3600.0)
}

/// ETA/CPA under linear extrapolation. Only meaningful for an approaching
/// aircraft with positive closing speed; anything else yields no prediction.
pub fn predict(distance_nm: f64, trend: Trend, closing_speed_kt: Option<f64>) -> PredictionResult {
    let closing = match closing_speed_kt {
        Some(c) if c > 0.0 && trend == Trend::Approaching => c,
        _ => return PredictionResult::default(),
    };

    let eta_hours = distance_nm / closing;
    let eta_sec = eta_hours * 3600.0;
    if eta_sec < 0.0 || eta_sec > MAX_ETA_SEC {
        return PredictionResult::default();
    }

    let cpa = (distance_nm - closing * eta_hours).max(0.0);
    PredictionResult {
        eta_seconds: Some(eta_sec as i64),
        cpa_distance_nm: cpa,
        will_intercept: cpa < INTERCEPT_CPA_NM,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn observer(lat: f64, lon: f64, ts: f64) -> ObserverPosition {
        ObserverPosition {
            lat,
            lon,
            heading_deg: None,
            speed_kt: None,
            accuracy_m: 10.0,
            timestamp: ts,
        }
    }

    #[test]
    fn test_trend_unknown_without_previous() {
        assert_eq!(trend(5.0, None), Trend::Unknown);
    }

    #[test]
    fn test_trend_hysteresis_band() {
        // Deltas within +-0.05nm are jitter, not movement.
        assert_eq!(trend(4.96, Some(5.0)), Trend::Holding);
        assert_eq!(trend(5.04, Some(5.0)), Trend::Holding);
    }

    #[test]
    fn test_trend_approaching() {
        assert_eq!(trend(4.80, Some(5.0)), Trend::Approaching);
    }

    #[test]
    fn test_trend_departing() {
        assert_eq!(trend(5.30, Some(5.0)), Trend::Departing);
    }

    #[test]
    fn test_closing_speed_positive_when_converging() {
        let prev_obs = observer(34.0, -118.0, 0.0);
        let curr_obs = observer(34.0, -118.0, 60.0);
        // Aircraft moved 1nm closer in 60s -> 60 kt closing.
        let speed =
            closing_speed_kt(&prev_obs, &curr_obs, (34.0, -117.9), (34.0, -117.92), 60.0).unwrap();
        assert!(speed > 30.0, "converging speed should be large, got {speed}");
    }

    #[test]
    fn test_closing_speed_zero_elapsed_guarded() {
        let obs = observer(34.0, -118.0, 0.0);
        assert!(closing_speed_kt(&obs, &obs, (34.0, -117.9), (34.0, -117.9), 0.0).is_none());
    }

    #[test]
    fn test_predict_requires_approaching() {
        let p = predict(5.0, Trend::Departing, Some(100.0));
        assert!(p.eta_seconds.is_none());
        assert!(!p.will_intercept);
    }

    #[test]
    fn test_predict_requires_positive_closing() {
        let p = predict(5.0, Trend::Approaching, Some(-50.0));
        assert!(p.eta_seconds.is_none());
    }

    #[test]
    fn test_predict_eta_and_intercept() {
        // 5nm away closing at 120kt: ETA 150s, CPA 0 -> intercept.
        let p = predict(5.0, Trend::Approaching, Some(120.0));
        assert_eq!(p.eta_seconds, Some(150));
        assert!(p.cpa_distance_nm < 1.0);
        assert!(p.will_intercept);
    }

    #[test]
    fn test_predict_rejects_distant_eta() {
        // 20nm at 10kt: ETA 7200s > 30min cap -> no prediction.
        let p = predict(20.0, Trend::Approaching, Some(10.0));
        assert!(p.eta_seconds.is_none());
    }
}
