//! cannonball-core: aerial surveillance threat detection engine.
//!
//! No async, no I/O — just algorithms. Turns a stream of aircraft state
//! reports and an observer position into a ranked, classified list of
//! threats: law-enforcement identification, closing-speed kinematics,
//! circling/loitering detection, and composite urgency scoring. Shared by
//! `cannonball-server` (CLI + web server).

pub mod assembler;
pub mod behavior;
pub mod classify;
pub mod config;
pub mod feed;
pub mod geo;
pub mod gps;
pub mod history;
pub mod kinematics;
pub mod score;
pub mod types;

// Re-export commonly used types at crate root
pub use assembler::{ThreatEngine, ThreatEvent};
pub use classify::{classify, threat_level, Classification};
pub use config::{Config, FilterConfig};
pub use types::*;
