//! Threat assembler — per-tick orchestration of the whole engine.
//!
//! Pure state machine: call `tick()` with a snapshot, get back the ranked
//! threat list plus `ThreatEvent` outputs. The caller decides what to do
//! with events (voice announce, haptics, database log). One engine instance
//! per observer session; no shared mutable state.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::behavior;
use crate::classify;
use crate::config::FilterConfig;
use crate::geo;
use crate::history::TrackHistory;
use crate::kinematics;
use crate::score;
use crate::types::{
    AircraftReport, BehaviorFlags, ObserverPosition, PredictionResult, ThreatRecord, Trend,
};

/// Local recomputation is skipped when ticks arrive closer than this.
pub const DEBOUNCE_SEC: f64 = 0.25;

/// An id stays in the announced set this long before it can alert again.
pub const ANNOUNCE_TTL_SEC: f64 = 300.0;

/// Near-equal urgency scores let threat level and distance decide order.
const SCORE_TIE_BAND: u32 = 5;

// ---------------------------------------------------------------------------
// Threat events (output)
// ---------------------------------------------------------------------------

/// Side-effect triggers emitted by the engine for the caller to dispatch.
#[derive(Debug, Clone)]
pub enum ThreatEvent {
    /// An aircraft entered the threat list this tick (announce/haptic).
    NewThreat { record: ThreatRecord },
    /// The list emptied out after being non-empty.
    AllClear,
    /// A qualifying threat should be written to the history log.
    LogThreat { record: ThreatRecord },
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Per-session threat engine. Single-writer: one tick at a time.
pub struct ThreatEngine {
    config: FilterConfig,
    history: TrackHistory,
    previous: HashMap<String, ThreatRecord>,
    previous_list: Vec<ThreatRecord>,
    prev_observer: Option<ObserverPosition>,
    last_compute: Option<f64>,
    /// id -> announce time; evicted lazily each tick, no timers.
    announced: HashMap<String, f64>,

    // Counters
    pub ticks: u64,
    pub ticks_debounced: u64,
    pub reports_skipped: u64,
}

impl ThreatEngine {
    pub fn new(config: FilterConfig) -> Self {
        ThreatEngine {
            config,
            history: TrackHistory::new(),
            previous: HashMap::new(),
            previous_list: Vec::new(),
            prev_observer: None,
            last_compute: None,
            announced: HashMap::new(),
            ticks: 0,
            ticks_debounced: 0,
            reports_skipped: 0,
        }
    }

    /// Replace the filter config wholesale. Takes effect next tick; the
    /// current output is never re-filtered retroactively.
    pub fn set_config(&mut self, config: FilterConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run one local-computation tick over an aircraft snapshot.
    ///
    /// A missing observer position degrades the output (geometry fields
    /// become `None`, distance filters admit everything) — never an error.
    pub fn tick(
        &mut self,
        reports: &[AircraftReport],
        observer: Option<&ObserverPosition>,
        now: f64,
    ) -> (Vec<ThreatRecord>, Vec<ThreatEvent>) {
        // Debounce gate: stale-data short-circuit, not an error.
        if let Some(last) = self.last_compute {
            if now - last < DEBOUNCE_SEC {
                self.ticks_debounced += 1;
                return (self.previous_list.clone(), Vec::new());
            }
        }
        self.last_compute = Some(now);
        self.ticks += 1;

        self.announced.retain(|_, t| now - *t <= ANNOUNCE_TTL_SEC);
        self.history.prune(now);

        let mut records = Vec::new();
        for report in reports {
            // Position-less reports cannot be placed or tracked; they are
            // skipped like malformed ones.
            if !report.is_valid() || !report.has_position() {
                self.reports_skipped += 1;
                continue;
            }
            if let Some(record) = self.assess(report, observer, now) {
                records.push(record);
            }
        }

        sort_threats(&mut records);
        let events = self.diff_and_store(records.clone(), now);
        self.prev_observer = observer.copied();
        (records, events)
    }

    /// Run one backend-fed tick: the backend already classified and scored,
    /// so the normalized records enter the sort/diff pipeline directly.
    pub fn tick_backend(
        &mut self,
        mut records: Vec<ThreatRecord>,
        now: f64,
    ) -> (Vec<ThreatRecord>, Vec<ThreatEvent>) {
        self.ticks += 1;
        self.announced.retain(|_, t| now - *t <= ANNOUNCE_TTL_SEC);

        sort_threats(&mut records);
        let events = self.diff_and_store(records.clone(), now);
        (records, events)
    }

    /// Classify, filter, and score a single report. `None` means the
    /// aircraft was dropped by a filter, not scored low.
    fn assess(
        &mut self,
        report: &AircraftReport,
        observer: Option<&ObserverPosition>,
        now: f64,
    ) -> Option<ThreatRecord> {
        let classification = classify::classify(
            report.callsign.as_deref(),
            report.category_code.as_deref(),
            report.type_code.as_deref(),
        );

        // Geometry is null iff the observer fix is unavailable.
        let (distance_nm, bearing_deg) = match (observer, report.lat, report.lon) {
            (Some(obs), Some(lat), Some(lon)) => (
                Some(geo::distance_nm(obs.lat, obs.lon, lat, lon)),
                Some(geo::bearing_deg(obs.lat, obs.lon, lat, lon)),
            ),
            _ => (None, None),
        };

        if !self.passes_filters(report, &classification, distance_nm) {
            return None;
        }

        if let (Some(lat), Some(lon)) = (report.lat, report.lon) {
            self.history.record(&report.id, lat, lon, distance_nm, now);
        }

        let behavior = self.detect_behavior(&report.id, distance_nm, now);

        let previous = self.previous.get(&report.id);
        let trend = match distance_nm {
            Some(d) => kinematics::trend(d, previous.and_then(|p| p.distance_nm)),
            None => Trend::Unknown,
        };

        let closing_speed_kt = match (self.prev_observer.as_ref(), observer, previous) {
            (Some(prev_obs), Some(obs), Some(prev)) => {
                match (prev.lat, prev.lon, report.lat, report.lon) {
                    (Some(plat), Some(plon), Some(lat), Some(lon)) => kinematics::closing_speed_kt(
                        prev_obs,
                        obs,
                        (plat, plon),
                        (lat, lon),
                        now - prev.timestamp,
                    ),
                    _ => None,
                }
            }
            _ => None,
        };

        let prediction = match distance_nm {
            Some(d) => kinematics::predict(d, trend, closing_speed_kt),
            None => PredictionResult::default(),
        };

        let threat_level = classify::threat_level(&classification, distance_nm);
        let urgency_score = score::urgency_score(
            distance_nm,
            &classification,
            trend,
            &prediction,
            &behavior,
            threat_level,
        );

        Some(ThreatRecord {
            id: report.id.clone(),
            callsign: report.callsign.clone(),
            lat: report.lat,
            lon: report.lon,
            altitude_ft: report.altitude_ft,
            ground_speed_kt: report.ground_speed_kt,
            track_deg: report.track_deg,
            vertical_rate_fpm: report.vertical_rate_fpm,
            distance_nm,
            bearing_deg,
            direction: bearing_deg.map(geo::direction_name),
            trend,
            closing_speed_kt,
            classification,
            behavior,
            prediction,
            urgency_score,
            threat_level,
            timestamp: now,
        })
    }

    /// Failing any filter drops the aircraft entirely. Filters that cannot
    /// be evaluated (unknown distance or altitude) admit the aircraft.
    fn passes_filters(
        &self,
        report: &AircraftReport,
        classification: &classify::Classification,
        distance_nm: Option<f64>,
    ) -> bool {
        if self.config.whitelist.iter().any(|w| w == &report.id) {
            return false;
        }
        if let Some(dist) = distance_nm {
            if dist > self.config.radius_nm {
                return false;
            }
        }
        if let Some(alt) = report.altitude_ft {
            if let Some(max) = self.config.ignore_above_ft {
                if alt > max {
                    return false;
                }
            }
            if let Some(floor) = self.config.altitude_floor_ft {
                if alt < floor {
                    return false;
                }
            }
            if let Some(ceiling) = self.config.altitude_ceiling_ft {
                if alt > ceiling {
                    return false;
                }
            }
        }
        if self.config.le_only
            && !classification.is_law_enforcement
            && !(self.config.show_all_helicopters && classification.is_helicopter)
        {
            return false;
        }
        true
    }

    fn detect_behavior(&self, id: &str, distance_nm: Option<f64>, now: f64) -> BehaviorFlags {
        let mut flags = BehaviorFlags::default();
        if self.config.detect_circling {
            let samples = self.history.samples(id);
            let (circling, confidence) =
                behavior::detect_circling(&samples, self.config.circling_min_samples);
            flags.is_circling = circling;
            flags.circle_confidence = confidence;
        }
        if self.config.detect_loitering {
            if let Some(first_seen) = self.history.first_seen(id) {
                let (loitering, minutes) = behavior::detect_loitering(
                    &first_seen,
                    distance_nm,
                    now,
                    self.config.loiter_threshold_min,
                );
                flags.is_loitering = loitering;
                flags.loiter_duration_min = minutes;
            }
        }
        flags
    }

    /// Diff the new list against the previous tick, emit events, and store
    /// the list for the next tick. No side effects happen before this point,
    /// so an abandoned tick leaves the session consistent.
    fn diff_and_store(&mut self, records: Vec<ThreatRecord>, now: f64) -> Vec<ThreatEvent> {
        let mut events = Vec::new();

        for record in &records {
            if !self.previous.contains_key(&record.id) && !self.announced.contains_key(&record.id)
            {
                self.announced.insert(record.id.clone(), now);
                events.push(ThreatEvent::NewThreat {
                    record: record.clone(),
                });
            }
        }

        if records.is_empty() && !self.previous.is_empty() {
            events.push(ThreatEvent::AllClear);
        }

        if self.config.log_threats {
            for record in &records {
                // Interest covers law enforcement plus flagged helicopters
                // and surveillance types.
                if record.classification.is_interest
                    || record.threat_level == crate::types::ThreatLevel::Critical
                {
                    events.push(ThreatEvent::LogThreat {
                        record: record.clone(),
                    });
                }
            }
        }

        self.previous = records
            .iter()
            .map(|r| (r.id.clone(), r.clone()))
            .collect();
        self.previous_list = records;
        events
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Urgency score dominates. Scores within the tie band form a run that is
/// re-ordered by threat level, then raw distance.
fn sort_threats(records: &mut [ThreatRecord]) {
    records.sort_by(|a, b| b.urgency_score.cmp(&a.urgency_score));

    let mut start = 0;
    for i in 1..=records.len() {
        let boundary = i == records.len()
            || records[i - 1].urgency_score - records[i].urgency_score > SCORE_TIE_BAND;
        if boundary {
            records[start..i].sort_by(compare_near_equal);
            start = i;
        }
    }
}

fn compare_near_equal(a: &ThreatRecord, b: &ThreatRecord) -> Ordering {
    b.threat_level
        .cmp(&a.threat_level)
        .then_with(|| {
            let da = a.distance_nm.unwrap_or(f64::INFINITY);
            let db = b.distance_nm.unwrap_or(f64::INFINITY);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        })
        .then_with(|| b.urgency_score.cmp(&a.urgency_score))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
