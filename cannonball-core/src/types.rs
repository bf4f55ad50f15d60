//! Shared types and error enum for cannonball-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by cannonball-core.
#[derive(Debug, Error)]
pub enum CannonballError {
    #[error("feed error: {0}")]
    Feed(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CannonballError>;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One aircraft state report from the feed. Immutable per tick; a new report
/// for the same `id` supersedes the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftReport {
    /// Transponder hex address — the stable key for this aircraft.
    pub id: String,
    pub callsign: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_ft: Option<i32>,
    pub ground_speed_kt: Option<f64>,
    /// Aircraft's own heading over the ground, degrees.
    pub track_deg: Option<f64>,
    pub vertical_rate_fpm: Option<i32>,
    pub type_code: Option<String>,
    pub category_code: Option<String>,
    /// Unix seconds.
    pub timestamp: f64,
}

impl AircraftReport {
    pub fn has_position(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }

    /// A report is usable when it has a non-empty id and, if position fields
    /// are present, they are finite. Malformed reports are skipped silently.
    pub fn is_valid(&self) -> bool {
        if self.id.trim().is_empty() {
            return false;
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => lat.is_finite() && lon.is_finite(),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Most recent observer fix. At most one current value; absent in degraded mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverPosition {
    pub lat: f64,
    pub lon: f64,
    pub heading_deg: Option<f64>,
    pub speed_kt: Option<f64>,
    pub accuracy_m: f64,
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
// Derived types
// ---------------------------------------------------------------------------

/// Approaching/departing/holding relative to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Unknown,
    Approaching,
    Departing,
    Holding,
}

/// Categorical severity, ordered info < warning < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Info,
    Warning,
    Critical,
}

/// How sure the classifier is about its identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Low,
    High,
}

/// Circling/loitering flags from the behavior detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorFlags {
    pub is_circling: bool,
    pub circle_confidence: f64,
    pub is_loitering: bool,
    pub loiter_duration_min: i64,
}

impl Default for BehaviorFlags {
    fn default() -> Self {
        BehaviorFlags {
            is_circling: false,
            circle_confidence: 0.0,
            is_loitering: false,
            loiter_duration_min: 0,
        }
    }
}

/// ETA/CPA estimate under linear extrapolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub eta_seconds: Option<i64>,
    pub cpa_distance_nm: f64,
    pub will_intercept: bool,
}

impl Default for PredictionResult {
    fn default() -> Self {
        PredictionResult {
            eta_seconds: None,
            cpa_distance_nm: 0.0,
            will_intercept: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Threat record (per-tick output)
// ---------------------------------------------------------------------------

/// Per-aircraft engine output for one tick. Built fresh each tick; the
/// previous tick's record is only read for trend/closing-speed comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatRecord {
    pub id: String,
    pub callsign: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_ft: Option<i32>,
    pub ground_speed_kt: Option<f64>,
    pub track_deg: Option<f64>,
    pub vertical_rate_fpm: Option<i32>,

    /// None iff the observer position was unavailable this tick.
    pub distance_nm: Option<f64>,
    pub bearing_deg: Option<f64>,
    pub direction: Option<&'static str>,

    pub trend: Trend,
    pub closing_speed_kt: Option<f64>,
    pub classification: crate::classify::Classification,
    pub behavior: BehaviorFlags,
    pub prediction: PredictionResult,
    /// Always clamped to 0..=100.
    pub urgency_score: u32,
    pub threat_level: ThreatLevel,
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: &str) -> AircraftReport {
        AircraftReport {
            id: id.into(),
            callsign: None,
            lat: None,
            lon: None,
            altitude_ft: None,
            ground_speed_kt: None,
            track_deg: None,
            vertical_rate_fpm: None,
            type_code: None,
            category_code: None,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_report_valid_without_position() {
        assert!(report("A1B2C3").is_valid());
    }

    #[test]
    fn test_report_invalid_empty_id() {
        assert!(!report("").is_valid());
        assert!(!report("   ").is_valid());
    }

    #[test]
    fn test_report_invalid_nonfinite_position() {
        let mut r = report("A1B2C3");
        r.lat = Some(f64::NAN);
        r.lon = Some(-118.0);
        assert!(!r.is_valid());
    }

    #[test]
    fn test_report_invalid_half_position() {
        let mut r = report("A1B2C3");
        r.lat = Some(34.0);
        assert!(!r.is_valid());
    }

    #[test]
    fn test_threat_level_ordering() {
        assert!(ThreatLevel::Critical > ThreatLevel::Warning);
        assert!(ThreatLevel::Warning > ThreatLevel::Info);
    }
}
