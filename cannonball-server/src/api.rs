//! JSON API — read-only view of the latest threat list for the dashboard.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use cannonball_core::assembler::ThreatEngine;
use cannonball_core::gps::PositionTracker;
use cannonball_core::types::ThreatRecord;

/// Shared server state: the engine, its latest output, and the position
/// source state machine.
pub struct AppState {
    pub engine: ThreatEngine,
    pub latest: Vec<ThreatRecord>,
    /// "local" or "backend" depending on which path produced the list.
    pub mode: &'static str,
    pub gps: PositionTracker,
}

impl AppState {
    pub fn new(engine: ThreatEngine, gps: PositionTracker) -> Self {
        AppState {
            engine,
            latest: Vec::new(),
            mode: "local",
            gps,
        }
    }
}

pub type SharedState = Arc<Mutex<AppState>>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/threats", get(get_threats))
        .route("/api/status", get(get_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_threats(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let state = state.lock().unwrap();
    Json(serde_json::json!({
        "mode": state.mode,
        "count": state.latest.len(),
        "threats": state.latest,
    }))
}

async fn get_status(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let state = state.lock().unwrap();
    Json(serde_json::json!({
        "mode": state.mode,
        "gps_state": format!("{:?}", state.gps.state()).to_lowercase(),
        "observer": state.gps.current_position(),
        "ticks": state.engine.ticks,
        "ticks_debounced": state.engine.ticks_debounced,
        "reports_skipped": state.engine.reports_skipped,
        "radius_nm": state.engine.config().radius_nm,
        "le_only": state.engine.config().le_only,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cannonball_core::config::FilterConfig;

    #[test]
    fn test_state_starts_local_and_empty() {
        let state = AppState::new(
            ThreatEngine::new(FilterConfig::default()),
            PositionTracker::new(),
        );
        assert_eq!(state.mode, "local");
        assert!(state.latest.is_empty());
        assert!(state.gps.current_position().is_none());
    }
}
