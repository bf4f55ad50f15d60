//! Backend threat feed — WebSocket client for pre-scored threats.
//!
//! The backend runs the pattern-detection pipeline server-side and streams
//! ready-made threats. Connection lifecycle is an explicit typed state
//! machine; the engine itself never retries anything. A feed older than
//! [`STALE_SEC`] counts as absent and the tick falls back to local
//! computation — a mode transition, not an error.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use cannonball_core::feed::{self, BackendThreat};
use cannonball_core::types::ThreatRecord;

/// Backend data older than this falls back to local mode.
pub const STALE_SEC: f64 = 5.0;

const MAX_BACKOFF_SEC: u64 = 30;

// ---------------------------------------------------------------------------
// Connection state machine
// ---------------------------------------------------------------------------

/// Lifecycle of the backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Idle,
    Connecting,
    Connected,
    Backoff { attempt: u32 },
}

impl BackendState {
    pub fn connect(self) -> Self {
        match self {
            BackendState::Idle | BackendState::Backoff { .. } => BackendState::Connecting,
            other => other,
        }
    }

    pub fn established(self) -> Self {
        match self {
            BackendState::Connecting => BackendState::Connected,
            other => other,
        }
    }

    /// Any failure moves to backoff with an incremented attempt count.
    pub fn failed(self) -> Self {
        let attempt = match self {
            BackendState::Backoff { attempt } => attempt + 1,
            _ => 1,
        };
        BackendState::Backoff { attempt }
    }

    /// Exponential delay before the next connect, capped.
    pub fn retry_delay_sec(self) -> u64 {
        match self {
            BackendState::Backoff { attempt } => {
                (2u64.saturating_pow(attempt.min(8))).min(MAX_BACKOFF_SEC)
            }
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared feed state
// ---------------------------------------------------------------------------

/// Latest normalized backend threats plus receipt time.
#[derive(Debug, Clone, Default)]
pub struct BackendFeed {
    pub threats: Vec<ThreatRecord>,
    pub received: f64,
    pub state: Option<BackendState>,
}

impl BackendFeed {
    /// Threats for this tick, or `None` when stale/absent.
    pub fn fresh_threats(&self, now: f64) -> Option<Vec<ThreatRecord>> {
        if self.threats.is_empty() || now - self.received > STALE_SEC {
            return None;
        }
        Some(self.threats.clone())
    }
}

pub type SharedBackendFeed = Arc<Mutex<BackendFeed>>;

/// Backend message envelope: either a bare threat array or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackendMessage {
    Bare(Vec<BackendThreat>),
    Wrapped { threats: Vec<BackendThreat> },
}

fn now_sec() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Parse one WebSocket text payload into normalized records.
fn parse_payload(text: &str, now: f64) -> Option<Vec<ThreatRecord>> {
    let msg: BackendMessage = serde_json::from_str(text).ok()?;
    let threats = match msg {
        BackendMessage::Bare(t) => t,
        BackendMessage::Wrapped { threats } => threats,
    };
    Some(feed::from_backend(&threats, now))
}

/// Run the backend client until the process exits, publishing into `shared`.
pub async fn run(url: String, shared: SharedBackendFeed) {
    let mut state = BackendState::Idle;

    loop {
        state = state.connect();
        set_state(&shared, state);

        match connect_async(&url).await {
            Ok((mut ws, _)) => {
                state = state.established();
                set_state(&shared, state);
                eprintln!("  [backend] connected to {url}");

                while let Some(msg) = ws.next().await {
                    match msg {
                        Ok(Message::Text(text)) => {
                            let now = now_sec();
                            if let Some(threats) = parse_payload(&text, now) {
                                let mut feed = shared.lock().unwrap();
                                feed.threats = threats;
                                feed.received = now;
                            }
                        }
                        Ok(Message::Close(_)) | Err(_) => break,
                        _ => {}
                    }
                }
            }
            Err(e) => {
                eprintln!("  [backend] connect failed: {e}");
            }
        }

        state = state.failed();
        set_state(&shared, state);
        tokio::time::sleep(Duration::from_secs(state.retry_delay_sec())).await;
    }
}

fn set_state(shared: &SharedBackendFeed, state: BackendState) {
    shared.lock().unwrap().state = Some(state);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_happy_path() {
        let s = BackendState::Idle.connect();
        assert_eq!(s, BackendState::Connecting);
        assert_eq!(s.established(), BackendState::Connected);
    }

    #[test]
    fn test_backoff_increments() {
        let s = BackendState::Connecting.failed();
        assert_eq!(s, BackendState::Backoff { attempt: 1 });
        let s = s.failed();
        assert_eq!(s, BackendState::Backoff { attempt: 2 });
        assert!(s.retry_delay_sec() > BackendState::Backoff { attempt: 1 }.retry_delay_sec());
    }

    #[test]
    fn test_backoff_capped() {
        let s = BackendState::Backoff { attempt: 20 };
        assert_eq!(s.retry_delay_sec(), MAX_BACKOFF_SEC);
    }

    #[test]
    fn test_backoff_reconnects() {
        let s = BackendState::Backoff { attempt: 3 }.connect();
        assert_eq!(s, BackendState::Connecting);
    }

    #[test]
    fn test_fresh_threats_staleness() {
        let mut feed = BackendFeed::default();
        assert!(feed.fresh_threats(100.0).is_none(), "empty feed is absent");

        feed.threats = parse_payload(
            r#"[{"icao_hex": "AB12CD", "urgency_score": 50, "known_le": true}]"#,
            100.0,
        )
        .unwrap();
        feed.received = 100.0;
        assert!(feed.fresh_threats(102.0).is_some());
        assert!(feed.fresh_threats(100.0 + STALE_SEC + 1.0).is_none());
    }

    #[test]
    fn test_parse_bare_and_wrapped() {
        let bare = r#"[{"icao_hex": "AB12CD"}]"#;
        let wrapped = r#"{"threats": [{"icao_hex": "AB12CD"}]}"#;
        assert_eq!(parse_payload(bare, 0.0).unwrap().len(), 1);
        assert_eq!(parse_payload(wrapped, 0.0).unwrap().len(), 1);
        assert!(parse_payload("not json", 0.0).is_none());
    }
}
