//! Aircraft classification — law enforcement, helicopter, and surveillance
//! platform identification from callsign and ADS-B type/category codes.
//!
//! Pure lookup tables, no I/O — cheap enough to run every tick for every
//! aircraft.

use serde::Serialize;

use crate::types::{Confidence, ThreatLevel};

// ---------------------------------------------------------------------------
// Callsign prefix rules
// ---------------------------------------------------------------------------

struct CallsignRule {
    prefix: &'static str,
    category: &'static str,
    description: &'static str,
    law_enforcement: bool,
}

/// Ordered — first match wins. News media is flagged as interest but is
/// explicitly not law enforcement.
const CALLSIGN_RULES: &[CallsignRule] = &[
    CallsignRule { prefix: "LAPD", category: "Police Aviation", description: "LAPD Air Support", law_enforcement: true },
    CallsignRule { prefix: "LASD", category: "Police Aviation", description: "LA County Sheriff Aero Bureau", law_enforcement: true },
    CallsignRule { prefix: "NYPD", category: "Police Aviation", description: "NYPD Aviation Unit", law_enforcement: true },
    CallsignRule { prefix: "POLICE", category: "Police Aviation", description: "Police aviation unit", law_enforcement: true },
    CallsignRule { prefix: "SHERIFF", category: "Sheriff Aviation", description: "Sheriff aviation unit", law_enforcement: true },
    CallsignRule { prefix: "STAR", category: "Sheriff Aviation", description: "Sheriff STAR unit", law_enforcement: true },
    CallsignRule { prefix: "CHP", category: "State Patrol", description: "California Highway Patrol Air Operations", law_enforcement: true },
    CallsignRule { prefix: "DPS", category: "State Patrol", description: "Dept. of Public Safety air unit", law_enforcement: true },
    CallsignRule { prefix: "TROOPER", category: "State Patrol", description: "State trooper air unit", law_enforcement: true },
    CallsignRule { prefix: "JENA", category: "Federal", description: "FBI surveillance flight", law_enforcement: true },
    CallsignRule { prefix: "CBP", category: "Federal", description: "Customs and Border Protection", law_enforcement: true },
    CallsignRule { prefix: "OMAHA", category: "Federal", description: "CBP Air and Marine Operations", law_enforcement: true },
    CallsignRule { prefix: "DEA", category: "Federal", description: "Drug Enforcement Administration", law_enforcement: true },
    CallsignRule { prefix: "NEWS", category: "News Media", description: "News helicopter", law_enforcement: false },
    CallsignRule { prefix: "SKY", category: "News Media", description: "News helicopter", law_enforcement: false },
    CallsignRule { prefix: "CHOPPER", category: "News Media", description: "News helicopter", law_enforcement: false },
];

// ---------------------------------------------------------------------------
// Type code tables
// ---------------------------------------------------------------------------

/// ADS-B emitter category for rotorcraft.
const ROTORCRAFT_CATEGORY: &str = "A7";

/// ICAO type designator prefixes for common rotorcraft.
const ROTORCRAFT_TYPE_PREFIXES: &[&str] = &[
    "R22", "R44", "R66", "EC20", "EC30", "EC35", "EC45", "AS35", "AS50", "B06", "B407", "B412",
    "B429", "A109", "A119", "A139", "H500", "H60", "UH1", "MD50", "MD52", "S76",
];

/// Fixed-wing platforms commonly operated as surveillance aircraft.
const SURVEILLANCE_TYPES: &[&str] = &[
    "C182", "C206", "C210", "P68", "BN2P", "PC12", "AC50", "B350", "C208",
];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Result of classifying one aircraft. Pure function of
/// (callsign, category code, type code) — no identity, recomputed per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub is_law_enforcement: bool,
    pub is_helicopter: bool,
    pub is_surveillance_type: bool,
    pub is_interest: bool,
    pub category: Option<&'static str>,
    pub description: Option<&'static str>,
    pub confidence: Confidence,
}

impl Classification {
    pub fn none() -> Self {
        Classification {
            is_law_enforcement: false,
            is_helicopter: false,
            is_surveillance_type: false,
            is_interest: false,
            category: None,
            description: None,
            confidence: Confidence::None,
        }
    }
}

/// Classify an aircraft from its callsign, emitter category, and type code.
pub fn classify(
    callsign: Option<&str>,
    category_code: Option<&str>,
    type_code: Option<&str>,
) -> Classification {
    let mut result = Classification::none();

    if let Some(cs) = callsign {
        let cs = cs.trim().to_ascii_uppercase();
        if let Some(rule) = CALLSIGN_RULES.iter().find(|r| cs.starts_with(r.prefix)) {
            result.is_law_enforcement = rule.law_enforcement;
            result.category = Some(rule.category);
            result.description = Some(rule.description);
            result.confidence = Confidence::High;
        }
    }

    if let Some(cat) = category_code {
        if cat.trim().eq_ignore_ascii_case(ROTORCRAFT_CATEGORY) {
            result.is_helicopter = true;
        }
    }
    if let Some(tc) = type_code {
        let tc = tc.trim().to_ascii_uppercase();
        if ROTORCRAFT_TYPE_PREFIXES.iter().any(|p| tc.starts_with(p)) {
            result.is_helicopter = true;
        }
        if SURVEILLANCE_TYPES.contains(&tc.as_str()) {
            result.is_surveillance_type = true;
        }
    }

    result.is_interest =
        result.is_law_enforcement || result.is_helicopter || result.is_surveillance_type;
    if result.is_interest && result.confidence == Confidence::None {
        result.confidence = Confidence::Low;
    }
    result
}

// ---------------------------------------------------------------------------
// Threat level
// ---------------------------------------------------------------------------

/// Fallback distance used when no observer fix exists, for the threat-level
/// decision only.
pub const DEFAULT_DISTANCE_NM: f64 = 10.0;

/// Categorical severity from classification + distance bands.
pub fn threat_level(classification: &Classification, distance_nm: Option<f64>) -> ThreatLevel {
    let dist = distance_nm.unwrap_or(DEFAULT_DISTANCE_NM);

    if classification.is_law_enforcement {
        if dist < 2.0 {
            return ThreatLevel::Critical;
        }
        if dist < 5.0 {
            return ThreatLevel::Warning;
        }
        return ThreatLevel::Info;
    }
    if classification.is_helicopter && dist < 3.0 {
        return ThreatLevel::Warning;
    }
    if classification.is_surveillance_type && dist < 5.0 {
        return ThreatLevel::Warning;
    }
    ThreatLevel::Info
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lapd_is_law_enforcement() {
        let c = classify(Some("LAPD12"), None, None);
        assert!(c.is_law_enforcement);
        assert_eq!(c.category, Some("Police Aviation"));
        assert_eq!(c.confidence, Confidence::High);
    }

    #[test]
    fn test_chp_is_law_enforcement() {
        let c = classify(Some("CHP7"), None, None);
        assert!(c.is_law_enforcement);
        assert_eq!(c.category, Some("State Patrol"));
    }

    #[test]
    fn test_news_is_interest_not_le() {
        let c = classify(Some("NEWS4"), None, None);
        assert!(!c.is_law_enforcement);
        assert!(c.is_interest);
        assert_eq!(c.category, Some("News Media"));
    }

    #[test]
    fn test_first_match_wins() {
        // SKY matches before anything weaker would.
        let c = classify(Some("SKY9"), None, None);
        assert_eq!(c.category, Some("News Media"));
    }

    #[test]
    fn test_rotorcraft_category() {
        let c = classify(None, Some("A7"), None);
        assert!(c.is_helicopter);
        assert!(c.is_interest);
        assert_eq!(c.confidence, Confidence::Low);
    }

    #[test]
    fn test_rotorcraft_type_prefix() {
        let c = classify(None, None, Some("AS50"));
        assert!(c.is_helicopter);
    }

    #[test]
    fn test_surveillance_type() {
        let c = classify(None, None, Some("C182"));
        assert!(c.is_surveillance_type);
        assert!(!c.is_helicopter);
    }

    #[test]
    fn test_airliner_is_nothing() {
        let c = classify(Some("UAL123"), Some("A3"), Some("B738"));
        assert!(!c.is_interest);
        assert_eq!(c.confidence, Confidence::None);
    }

    #[test]
    fn test_deterministic() {
        let a = classify(Some("CHP7"), Some("A7"), Some("AS50"));
        let b = classify(Some("CHP7"), Some("A7"), Some("AS50"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_threat_level_le_bands() {
        let le = classify(Some("LAPD12"), None, None);
        assert_eq!(threat_level(&le, Some(1.0)), ThreatLevel::Critical);
        assert_eq!(threat_level(&le, Some(4.0)), ThreatLevel::Warning);
        assert_eq!(threat_level(&le, Some(8.0)), ThreatLevel::Info);
    }

    #[test]
    fn test_threat_level_helicopter() {
        let heli = classify(None, Some("A7"), None);
        assert_eq!(threat_level(&heli, Some(2.5)), ThreatLevel::Warning);
        assert_eq!(threat_level(&heli, Some(4.0)), ThreatLevel::Info);
    }

    #[test]
    fn test_threat_level_surveillance() {
        let surv = classify(None, None, Some("C206"));
        assert_eq!(threat_level(&surv, Some(4.0)), ThreatLevel::Warning);
        assert_eq!(threat_level(&surv, Some(6.0)), ThreatLevel::Info);
    }

    #[test]
    fn test_threat_level_no_distance_uses_fallback() {
        // Fallback 10nm: LE at unknown distance is info, not critical.
        let le = classify(Some("CHP7"), None, None);
        assert_eq!(threat_level(&le, None), ThreatLevel::Info);
    }

    #[test]
    fn test_threat_level_plain_aircraft() {
        let c = classify(Some("SWA100"), None, None);
        assert_eq!(threat_level(&c, Some(0.5)), ThreatLevel::Info);
    }
}
