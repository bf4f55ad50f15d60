//! Observer position acquisition state machine.
//!
//! Permission UX and the actual position source live outside the engine;
//! this models their lifecycle with typed states and transitions so the
//! core only ever sees `Option<ObserverPosition>`. The engine never
//! retries anything itself — retry is an explicit caller-driven
//! transition.

use crate::types::ObserverPosition;

/// Permission/acquisition lifecycle for the observer position source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsState {
    Unknown,
    Checking,
    Prompt,
    Unavailable,
    Requesting,
    Granted,
    Denied,
}

/// Owns the GPS state plus the most-recent-wins position fix.
#[derive(Debug)]
pub struct PositionTracker {
    state: GpsState,
    current: Option<ObserverPosition>,
}

impl PositionTracker {
    pub fn new() -> Self {
        PositionTracker {
            state: GpsState::Unknown,
            current: None,
        }
    }

    pub fn state(&self) -> GpsState {
        self.state
    }

    /// Permission check started.
    pub fn begin_check(&mut self) {
        if self.state == GpsState::Unknown {
            self.state = GpsState::Checking;
        }
    }

    /// Check resolved: user must be prompted.
    pub fn prompt(&mut self) {
        if self.state == GpsState::Checking {
            self.state = GpsState::Prompt;
        }
    }

    /// Check resolved: no position source on this platform.
    pub fn unavailable(&mut self) {
        if self.state == GpsState::Checking {
            self.state = GpsState::Unavailable;
            self.current = None;
        }
    }

    /// Acquisition requested (from prompt, or granted re-request).
    pub fn request(&mut self) {
        if matches!(self.state, GpsState::Checking | GpsState::Prompt | GpsState::Granted) {
            self.state = GpsState::Requesting;
        }
    }

    /// A fix arrived. Most recent wins.
    pub fn grant(&mut self, position: ObserverPosition) {
        if matches!(self.state, GpsState::Requesting | GpsState::Granted) {
            self.state = GpsState::Granted;
            self.current = Some(position);
        }
    }

    /// Permission denied; fix is dropped.
    pub fn deny(&mut self) {
        if self.state == GpsState::Requesting {
            self.state = GpsState::Denied;
            self.current = None;
        }
    }

    /// Denied and prompt are re-enterable via retry.
    pub fn retry(&mut self) {
        if matches!(self.state, GpsState::Denied | GpsState::Prompt) {
            self.state = GpsState::Requesting;
        }
    }

    /// The current fix, only while granted.
    pub fn current_position(&self) -> Option<&ObserverPosition> {
        match self.state {
            GpsState::Granted => self.current.as_ref(),
            _ => None,
        }
    }
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
