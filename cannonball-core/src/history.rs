//! Track history store — bounded per-aircraft position buffers.
//!
//! Each aircraft keeps a short trail of recent positions for the behavior
//! detector, plus a first-seen record for loiter detection. Aircraft that
//! drop out of the feed are retained for a grace period to tolerate
//! transient gaps, then evicted.

use std::collections::HashMap;
use std::collections::VecDeque;

/// Maximum samples retained per aircraft.
pub const MAX_SAMPLES: usize = 20;

/// Samples older than this are pruned from the behavior window.
pub const WINDOW_SEC: f64 = 300.0;

/// Aircraft unseen for this long are evicted entirely.
pub const GRACE_SEC: f64 = 120.0;

/// One recorded position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: f64,
}

/// When and how far away an aircraft was first observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstSeen {
    pub timestamp: f64,
    pub distance_nm: Option<f64>,
}

#[derive(Debug, Clone)]
struct Entry {
    samples: VecDeque<TrackPoint>,
    first_seen: FirstSeen,
    last_update: f64,
}

/// Per-aircraft position history, keyed by transponder id.
#[derive(Debug, Default)]
pub struct TrackHistory {
    entries: HashMap<String, Entry>,
}

impl TrackHistory {
    pub fn new() -> Self {
        TrackHistory {
            entries: HashMap::new(),
        }
    }

    /// Append a position sample, pruning by age and capping at
    /// [`MAX_SAMPLES`]. First call for an id records its first-seen state.
    pub fn record(&mut self, id: &str, lat: f64, lon: f64, distance_nm: Option<f64>, now: f64) {
        let entry = self.entries.entry(id.to_string()).or_insert_with(|| Entry {
            samples: VecDeque::with_capacity(MAX_SAMPLES),
            first_seen: FirstSeen {
                timestamp: now,
                distance_nm,
            },
            last_update: now,
        });

        entry.samples.push_back(TrackPoint {
            lat,
            lon,
            timestamp: now,
        });
        while entry.samples.len() > MAX_SAMPLES {
            entry.samples.pop_front();
        }
        while entry
            .samples
            .front()
            .is_some_and(|p| now - p.timestamp > WINDOW_SEC)
        {
            entry.samples.pop_front();
        }
        entry.last_update = now;
    }

    /// Recent samples for an aircraft, oldest first.
    pub fn samples(&self, id: &str) -> Vec<TrackPoint> {
        match self.entries.get(id) {
            Some(e) => e.samples.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn first_seen(&self, id: &str) -> Option<FirstSeen> {
        self.entries.get(id).map(|e| e.first_seen)
    }

    /// Evict aircraft unseen for longer than the grace period.
    /// Returns count removed. Called lazily each tick, no timers.
    pub fn prune(&mut self, now: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.last_update <= GRACE_SEC);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_read_back() {
        let mut h = TrackHistory::new();
        h.record("A", 34.0, -118.0, Some(5.0), 1.0);
        h.record("A", 34.01, -118.0, Some(4.9), 2.0);
        assert_eq!(h.samples("A").len(), 2);
        assert_eq!(h.samples("A")[0].timestamp, 1.0);
    }

    #[test]
    fn test_capacity_cap() {
        let mut h = TrackHistory::new();
        for i in 0..40 {
            h.record("A", 34.0, -118.0, None, i as f64);
        }
        assert_eq!(h.samples("A").len(), MAX_SAMPLES);
        // Oldest were dropped
        assert_eq!(h.samples("A")[0].timestamp, 20.0);
    }

    #[test]
    fn test_age_pruning() {
        let mut h = TrackHistory::new();
        h.record("A", 34.0, -118.0, None, 0.0);
        h.record("A", 34.0, -118.0, None, WINDOW_SEC + 10.0);
        assert_eq!(h.samples("A").len(), 1, "stale sample should be pruned");
    }

    #[test]
    fn test_first_seen_is_stable() {
        let mut h = TrackHistory::new();
        h.record("A", 34.0, -118.0, Some(6.0), 10.0);
        h.record("A", 34.0, -118.0, Some(2.0), 20.0);
        let fs = h.first_seen("A").unwrap();
        assert_eq!(fs.timestamp, 10.0);
        assert_eq!(fs.distance_nm, Some(6.0));
    }

    #[test]
    fn test_grace_eviction() {
        let mut h = TrackHistory::new();
        h.record("A", 34.0, -118.0, None, 0.0);
        h.record("B", 34.0, -118.0, None, 100.0);
        assert_eq!(h.prune(100.0), 0, "within grace, nothing evicted");
        assert_eq!(h.prune(GRACE_SEC + 50.0), 1, "A past grace");
        assert!(h.first_seen("A").is_none());
        assert!(h.first_seen("B").is_some());
    }

    #[test]
    fn test_unknown_id_empty() {
        let h = TrackHistory::new();
        assert!(h.samples("NOPE").is_empty());
        assert!(h.first_seen("NOPE").is_none());
    }
}
