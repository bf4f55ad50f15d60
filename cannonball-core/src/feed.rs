//! Feed adapters — normalize external schemas into internal types.
//!
//! Two sources feed the engine: a local dump1090-style aircraft snapshot,
//! and a backend service that ships pre-classified, pre-scored threats.
//! Each source gets one explicit adapter so the rest of the pipeline only
//! ever sees `AircraftReport` / `ThreatRecord`.

use serde::Deserialize;

use crate::classify::Classification;
use crate::geo;
use crate::types::{
    AircraftReport, BehaviorFlags, Confidence, PredictionResult, ThreatLevel, ThreatRecord, Trend,
};

// ---------------------------------------------------------------------------
// Local feed (dump1090 aircraft.json schema)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LocalFeedDoc {
    pub now: f64,
    #[serde(default)]
    pub aircraft: Vec<LocalFeedAircraft>,
}

#[derive(Debug, Deserialize)]
pub struct LocalFeedAircraft {
    pub hex: String,
    pub flight: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt_baro: Option<i32>,
    pub gs: Option<f64>,
    pub track: Option<f64>,
    pub baro_rate: Option<i32>,
    pub category: Option<String>,
    /// Type designator, when the feed has it.
    pub t: Option<String>,
}

/// Convert a local feed snapshot into reports. Malformed entries are
/// skipped silently; the tick continues with the rest.
pub fn from_local_feed(doc: &LocalFeedDoc) -> Vec<AircraftReport> {
    doc.aircraft
        .iter()
        .filter_map(|a| {
            let report = AircraftReport {
                id: a.hex.trim().to_ascii_uppercase(),
                callsign: a
                    .flight
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
                lat: a.lat,
                lon: a.lon,
                altitude_ft: a.alt_baro,
                ground_speed_kt: a.gs,
                track_deg: a.track,
                vertical_rate_fpm: a.baro_rate,
                type_code: a.t.clone(),
                category_code: a.category.clone(),
                timestamp: doc.now,
            };
            report.is_valid().then_some(report)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Backend threat feed (alternate schema)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BackendThreat {
    pub icao_hex: String,
    pub callsign: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_ft: Option<i32>,
    pub distance_nm: Option<f64>,
    pub bearing: Option<f64>,
    pub urgency_score: Option<u32>,
    pub threat_level: Option<String>,
    #[serde(default)]
    pub known_le: bool,
    pub agency_name: Option<String>,
    #[serde(default)]
    pub patterns: Vec<BackendPattern>,
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendPattern {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub confidence_score: f64,
}

/// Normalize backend threats into the local record shape. The backend has
/// already classified and scored, so local computation is skipped; pattern
/// tags map onto the behavior flags.
pub fn from_backend(threats: &[BackendThreat], now: f64) -> Vec<ThreatRecord> {
    threats
        .iter()
        .filter(|t| !t.icao_hex.trim().is_empty())
        .map(|t| {
            let mut behavior = BehaviorFlags::default();
            for p in &t.patterns {
                match p.kind.as_str() {
                    "circling" => {
                        behavior.is_circling = true;
                        behavior.circle_confidence = p.confidence_score.clamp(0.0, 1.0);
                    }
                    "loitering" => behavior.is_loitering = true,
                    _ => {}
                }
            }

            let classification = Classification {
                is_law_enforcement: t.known_le,
                is_helicopter: false,
                is_surveillance_type: false,
                is_interest: t.known_le,
                category: None,
                description: None,
                confidence: if t.known_le {
                    Confidence::High
                } else {
                    Confidence::None
                },
            };

            let threat_level = match t.threat_level.as_deref() {
                Some("critical") => ThreatLevel::Critical,
                Some("warning") => ThreatLevel::Warning,
                _ => ThreatLevel::Info,
            };

            ThreatRecord {
                id: t.icao_hex.trim().to_ascii_uppercase(),
                callsign: t.callsign.clone().or_else(|| t.agency_name.clone()),
                lat: t.lat,
                lon: t.lon,
                altitude_ft: t.altitude_ft,
                ground_speed_kt: None,
                track_deg: None,
                vertical_rate_fpm: None,
                distance_nm: t.distance_nm,
                bearing_deg: t.bearing,
                direction: t.bearing.map(geo::direction_name),
                trend: Trend::Unknown,
                closing_speed_kt: None,
                classification,
                behavior,
                prediction: PredictionResult::default(),
                urgency_score: t.urgency_score.unwrap_or(0).min(100),
                threat_level,
                timestamp: t.timestamp.unwrap_or(now),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_feed_parse_and_adapt() {
        let json = r#"{
            "now": 1700000000.0,
            "aircraft": [
                {"hex": "a1b2c3", "flight": "CHP7   ", "lat": 34.05, "lon": -118.24,
                 "alt_baro": 1500, "gs": 110.0, "track": 270.0, "baro_rate": 0,
                 "category": "A7", "t": "AS50"},
                {"hex": "d4e5f6"}
            ]
        }"#;
        let doc: LocalFeedDoc = serde_json::from_str(json).unwrap();
        let reports = from_local_feed(&doc);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, "A1B2C3");
        assert_eq!(reports[0].callsign.as_deref(), Some("CHP7"));
        assert_eq!(reports[0].timestamp, 1700000000.0);
        assert!(!reports[1].has_position());
    }

    #[test]
    fn test_local_feed_skips_malformed() {
        let doc = LocalFeedDoc {
            now: 1.0,
            aircraft: vec![
                LocalFeedAircraft {
                    hex: "".into(),
                    flight: None,
                    lat: None,
                    lon: None,
                    alt_baro: None,
                    gs: None,
                    track: None,
                    baro_rate: None,
                    category: None,
                    t: None,
                },
                LocalFeedAircraft {
                    hex: "AAA111".into(),
                    flight: None,
                    lat: Some(f64::NAN),
                    lon: Some(-118.0),
                    alt_baro: None,
                    gs: None,
                    track: None,
                    baro_rate: None,
                    category: None,
                    t: None,
                },
            ],
        };
        assert!(from_local_feed(&doc).is_empty());
    }

    #[test]
    fn test_backend_normalization() {
        let json = r#"[{
            "icao_hex": "ab12cd",
            "distance_nm": 3.2,
            "bearing": 90.0,
            "urgency_score": 72,
            "threat_level": "warning",
            "known_le": true,
            "agency_name": "LAPD Air Support",
            "patterns": [
                {"type": "circling", "confidence_score": 0.8},
                {"type": "loitering"}
            ]
        }]"#;
        let threats: Vec<BackendThreat> = serde_json::from_str(json).unwrap();
        let records = from_backend(&threats, 100.0);
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.id, "AB12CD");
        assert!(r.classification.is_law_enforcement);
        assert_eq!(r.callsign.as_deref(), Some("LAPD Air Support"));
        assert!(r.behavior.is_circling);
        assert_eq!(r.behavior.circle_confidence, 0.8);
        assert!(r.behavior.is_loitering);
        assert_eq!(r.urgency_score, 72);
        assert_eq!(r.threat_level, ThreatLevel::Warning);
        assert_eq!(r.direction, Some("E"));
        assert_eq!(r.trend, Trend::Unknown);
        assert_eq!(r.timestamp, 100.0);
    }

    #[test]
    fn test_backend_score_clamped() {
        let threats = vec![BackendThreat {
            icao_hex: "FFFFFF".into(),
            callsign: None,
            lat: None,
            lon: None,
            altitude_ft: None,
            distance_nm: None,
            bearing: None,
            urgency_score: Some(250),
            threat_level: None,
            known_le: false,
            agency_name: None,
            patterns: vec![],
            timestamp: None,
        }];
        assert_eq!(from_backend(&threats, 0.0)[0].urgency_score, 100);
    }

    #[test]
    fn test_backend_empty_hex_dropped() {
        let threats = vec![BackendThreat {
            icao_hex: " ".into(),
            callsign: None,
            lat: None,
            lon: None,
            altitude_ft: None,
            distance_nm: None,
            bearing: None,
            urgency_score: None,
            threat_level: None,
            known_le: false,
            agency_name: None,
            patterns: vec![],
            timestamp: None,
        }];
        assert!(from_backend(&threats, 0.0).is_empty());
    }
}
