//! Alert dispatch — console announcements and webhook notifications.
//!
//! The engine emits `ThreatEvent`s; this module is the seam where the
//! voice/haptic collaborators would hang. Here they become formatted
//! console lines and fire-and-forget HTTP POSTs.

use cannonball_core::assembler::ThreatEvent;
use cannonball_core::types::ThreatRecord;

/// Format one announcement line for a new threat.
pub fn announce_line(record: &ThreatRecord) -> String {
    let who = record
        .classification
        .description
        .map(String::from)
        .or_else(|| record.callsign.clone())
        .unwrap_or_else(|| record.id.clone());

    match (record.distance_nm, record.direction) {
        (Some(dist), Some(dir)) => {
            format!("ALERT: {who} {dist:.1}nm to the {dir} [urgency {}]", record.urgency_score)
        }
        _ => format!("ALERT: {who} detected, range unknown [urgency {}]", record.urgency_score),
    }
}

/// Print threat events to the console.
pub struct ConsoleAlerts;

impl ConsoleAlerts {
    pub fn dispatch(&self, event: &ThreatEvent) {
        match event {
            ThreatEvent::NewThreat { record } => println!("  {}", announce_line(record)),
            ThreatEvent::AllClear => println!("  All clear: no threats in range"),
            ThreatEvent::LogThreat { .. } => {}
        }
    }
}

/// Dispatches threat events to a webhook URL via HTTP POST.
#[derive(Clone)]
pub struct WebhookDispatcher {
    url: String,
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new(url: &str) -> Self {
        WebhookDispatcher {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Fire-and-forget POST of a threat event as JSON.
    pub fn notify(&self, event: &ThreatEvent) {
        let payload = match event {
            ThreatEvent::NewThreat { record } => serde_json::json!({
                "event": "new_threat",
                "threat": record,
            }),
            ThreatEvent::AllClear => serde_json::json!({ "event": "all_clear" }),
            ThreatEvent::LogThreat { .. } => return,
        };

        let client = self.client.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            if let Err(e) = client.post(&url).json(&payload).send().await {
                eprintln!("  [webhook] POST failed: {e}");
            }
        });
    }
}
