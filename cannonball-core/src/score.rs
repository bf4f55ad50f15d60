//! Composite urgency scoring — the primary sort key for the threat list.
//!
//! Weighted sum of independent terms, clamped to 0..=100. Absent inputs
//! contribute nothing; no term subtracts.

use crate::classify::Classification;
use crate::types::{BehaviorFlags, PredictionResult, ThreatLevel, Trend};

/// Score one aircraft for this tick.
pub fn urgency_score(
    distance_nm: Option<f64>,
    classification: &Classification,
    trend: Trend,
    prediction: &PredictionResult,
    behavior: &BehaviorFlags,
    threat_level: ThreatLevel,
) -> u32 {
    let mut score = 0u32;

    if let Some(dist) = distance_nm {
        score += if dist < 1.0 {
            40
        } else if dist < 2.0 {
            30
        } else if dist < 5.0 {
            20
        } else if dist < 10.0 {
            10
        } else {
            0
        };
    }

    if classification.is_law_enforcement {
        score += 25;
    }
    if trend == Trend::Approaching {
        score += 15;
    }

    if let Some(eta) = prediction.eta_seconds {
        score += if eta < 60 {
            15
        } else if eta < 180 {
            10
        } else if eta < 300 {
            5
        } else {
            0
        };
    }
    if prediction.will_intercept {
        score += 10;
    }

    if behavior.is_circling {
        score += 15;
    }
    if behavior.is_loitering {
        score += 10;
    }

    score += match threat_level {
        ThreatLevel::Critical => 10,
        ThreatLevel::Warning => 5,
        ThreatLevel::Info => 0,
    };

    score.min(100)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify;

    fn le() -> Classification {
        classify::classify(Some("LAPD12"), None, None)
    }

    fn max_behavior() -> BehaviorFlags {
        BehaviorFlags {
            is_circling: true,
            circle_confidence: 1.0,
            is_loitering: true,
            loiter_duration_min: 30,
        }
    }

    fn max_prediction() -> PredictionResult {
        PredictionResult {
            eta_seconds: Some(30),
            cpa_distance_nm: 0.0,
            will_intercept: true,
        }
    }

    #[test]
    fn test_score_clamped_at_100() {
        // Every term maxed: 40+25+15+15+10+15+10+10 = 140 -> clamped.
        let s = urgency_score(
            Some(0.5),
            &le(),
            Trend::Approaching,
            &max_prediction(),
            &max_behavior(),
            ThreatLevel::Critical,
        );
        assert_eq!(s, 100);
    }

    #[test]
    fn test_score_zero_with_nothing() {
        let s = urgency_score(
            None,
            &Classification::none(),
            Trend::Unknown,
            &PredictionResult::default(),
            &BehaviorFlags::default(),
            ThreatLevel::Info,
        );
        assert_eq!(s, 0);
    }

    #[test]
    fn test_distance_bands_monotonic() {
        let mut last = u32::MAX;
        for dist in [0.5, 1.5, 3.0, 7.0, 15.0] {
            let s = urgency_score(
                Some(dist),
                &le(),
                Trend::Unknown,
                &PredictionResult::default(),
                &BehaviorFlags::default(),
                ThreatLevel::Info,
            );
            assert!(s <= last, "score should not rise as distance grows");
            last = s;
        }
    }

    #[test]
    fn test_eta_bands() {
        let pred = |eta| PredictionResult {
            eta_seconds: Some(eta),
            cpa_distance_nm: 2.0,
            will_intercept: false,
        };
        let base = |eta| {
            urgency_score(
                None,
                &Classification::none(),
                Trend::Unknown,
                &pred(eta),
                &BehaviorFlags::default(),
                ThreatLevel::Info,
            )
        };
        assert_eq!(base(30), 15);
        assert_eq!(base(120), 10);
        assert_eq!(base(250), 5);
        assert_eq!(base(400), 0);
    }

    #[test]
    fn test_fuzz_never_exceeds_bounds() {
        for dist in [None, Some(0.1), Some(3.0), Some(50.0)] {
            for trend in [Trend::Unknown, Trend::Approaching, Trend::Departing] {
                for level in [ThreatLevel::Info, ThreatLevel::Warning, ThreatLevel::Critical] {
                    let s = urgency_score(
                        dist,
                        &le(),
                        trend,
                        &max_prediction(),
                        &max_behavior(),
                        level,
                    );
                    assert!(s <= 100);
                }
            }
        }
    }
}
