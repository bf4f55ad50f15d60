//! SQLite threat history — WAL mode, one table, indexed queries.
//!
//! Qualifying threats (flagged as of interest, or critical) are appended
//! on `LogThreat` events; nothing else persists between sessions.

use rusqlite::{params, Connection, Result as SqlResult};
use std::path::Path;

use cannonball_core::types::ThreatRecord;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS threats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    aircraft_id TEXT NOT NULL,
    callsign TEXT,
    category TEXT,
    lat REAL,
    lon REAL,
    altitude_ft INTEGER,
    distance_nm REAL,
    bearing_deg REAL,
    urgency_score INTEGER NOT NULL,
    threat_level TEXT NOT NULL,
    is_law_enforcement INTEGER NOT NULL,
    is_circling INTEGER NOT NULL,
    is_loitering INTEGER NOT NULL,
    timestamp REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_threats_aircraft ON threats(aircraft_id);
CREATE INDEX IF NOT EXISTS idx_threats_timestamp ON threats(timestamp);
CREATE INDEX IF NOT EXISTS idx_threats_level ON threats(threat_level);
"#;

/// Counts for the `stats` command.
#[derive(Debug, Clone, Copy)]
pub struct DbStats {
    pub threats: u64,
    pub aircraft: u64,
    pub law_enforcement: u64,
}

/// SQLite database for logged threats.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &str) -> SqlResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            Connection::open(path)?
        };

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    /// Append one threat record to the log.
    pub fn log_threat(&self, record: &ThreatRecord) -> SqlResult<()> {
        let level = serde_json::to_value(record.threat_level)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| "info".into());

        self.conn.execute(
            "INSERT INTO threats (aircraft_id, callsign, category, lat, lon, altitude_ft,
                distance_nm, bearing_deg, urgency_score, threat_level,
                is_law_enforcement, is_circling, is_loitering, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                record.id,
                record.callsign,
                record.classification.category,
                record.lat,
                record.lon,
                record.altitude_ft,
                record.distance_nm,
                record.bearing_deg,
                record.urgency_score,
                level,
                record.classification.is_law_enforcement,
                record.behavior.is_circling,
                record.behavior.is_loitering,
                record.timestamp,
            ],
        )?;
        Ok(())
    }

    pub fn stats(&self) -> DbStats {
        let count = |sql: &str| -> u64 {
            self.conn
                .query_row(sql, [], |row| row.get::<_, i64>(0))
                .unwrap_or(0) as u64
        };
        DbStats {
            threats: count("SELECT COUNT(*) FROM threats"),
            aircraft: count("SELECT COUNT(DISTINCT aircraft_id) FROM threats"),
            law_enforcement: count("SELECT COUNT(*) FROM threats WHERE is_law_enforcement = 1"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use cannonball_core::classify;
    use cannonball_core::types::{BehaviorFlags, PredictionResult, ThreatLevel, Trend};

    fn record(id: &str) -> ThreatRecord {
        ThreatRecord {
            id: id.into(),
            callsign: Some("CHP7".into()),
            lat: Some(34.05),
            lon: Some(-118.24),
            altitude_ft: Some(1500),
            ground_speed_kt: None,
            track_deg: None,
            vertical_rate_fpm: None,
            distance_nm: Some(0.9),
            bearing_deg: Some(45.0),
            direction: Some("NE"),
            trend: Trend::Unknown,
            closing_speed_kt: None,
            classification: classify::classify(Some("CHP7"), None, None),
            behavior: BehaviorFlags::default(),
            prediction: PredictionResult::default(),
            urgency_score: 85,
            threat_level: ThreatLevel::Critical,
            timestamp: 1700000000.0,
        }
    }

    #[test]
    fn test_log_and_stats() {
        let db = Database::open(":memory:").unwrap();
        db.log_threat(&record("A1B2C3")).unwrap();
        db.log_threat(&record("A1B2C3")).unwrap();
        db.log_threat(&record("D4E5F6")).unwrap();

        let stats = db.stats();
        assert_eq!(stats.threats, 3);
        assert_eq!(stats.aircraft, 2);
        assert_eq!(stats.law_enforcement, 3);
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("threats.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();
        db.log_threat(&record("A1B2C3")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_stats() {
        let db = Database::open(":memory:").unwrap();
        let stats = db.stats();
        assert_eq!(stats.threats, 0);
        assert_eq!(stats.aircraft, 0);
    }
}
