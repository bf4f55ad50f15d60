//! Configuration — threat filter settings and app config file management.
//!
//! Reads/writes `~/.cannonball/config.yaml` with observer fallback position,
//! feed/backend URLs, server settings, and the filter section. The filter
//! config is replaced wholesale on change and takes effect next tick.

use std::path::PathBuf;

use crate::types::CannonballError;

// ---------------------------------------------------------------------------
// Filter config
// ---------------------------------------------------------------------------

/// Settings-driven filtering applied by the assembler each tick.
/// A full replacement object, never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// Only aircraft within this range are scored. Unknown distance passes.
    pub radius_nm: f64,
    pub altitude_floor_ft: Option<i32>,
    pub altitude_ceiling_ft: Option<i32>,
    /// Drop anything above this altitude regardless of the band.
    pub ignore_above_ft: Option<i32>,
    /// Only law-enforcement aircraft (plus helicopters when
    /// `show_all_helicopters` is set).
    pub le_only: bool,
    pub show_all_helicopters: bool,
    /// Ids never shown regardless of classification.
    pub whitelist: Vec<String>,
    pub detect_circling: bool,
    pub detect_loitering: bool,
    pub loiter_threshold_min: i64,
    pub circling_min_samples: usize,
    /// Log qualifying threats to the history database.
    pub log_threats: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            radius_nm: 15.0,
            altitude_floor_ft: None,
            altitude_ceiling_ft: None,
            ignore_above_ft: Some(10000),
            le_only: false,
            show_all_helicopters: true,
            whitelist: Vec::new(),
            detect_circling: true,
            detect_loitering: true,
            loiter_threshold_min: 5,
            circling_min_samples: 10,
            log_threats: false,
        }
    }
}

// ---------------------------------------------------------------------------
// App config
// ---------------------------------------------------------------------------

/// Full configuration structure.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub observer: ObserverConfig,
    pub server: ServerConfig,
    pub feed_url: Option<String>,
    pub backend_url: Option<String>,
    pub webhook: Option<String>,
    pub db_path: Option<String>,
    pub filter: FilterConfig,
}

/// Fallback observer position used when no live fix is available.
#[derive(Debug, Clone, Default)]
pub struct ObserverConfig {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// Get the config directory path (`~/.cannonball/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".cannonball")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.cannonball/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let path = config_file();
    if !path.exists() {
        return Config::default();
    }
    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };
    parse_config(&text).unwrap_or_default()
}

/// Save config to `~/.cannonball/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, CannonballError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| CannonballError::Config(e.to_string()))?;

    let path = config_file();
    std::fs::write(&path, serialize_config(config))
        .map_err(|e| CannonballError::Config(e.to_string()))?;
    Ok(path)
}

/// Parse simple YAML-like config text.
fn parse_config(text: &str) -> Option<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        if let Some((key, val)) = stripped.split_once(':') {
            let key = key.trim();
            let val = val.trim();

            if !is_indented {
                if val.is_empty() {
                    current_section = Some(key.to_string());
                } else {
                    current_section = None;
                    match key {
                        "feed_url" => config.feed_url = parse_string_value(val),
                        "backend_url" => config.backend_url = parse_string_value(val),
                        "webhook" => config.webhook = parse_string_value(val),
                        "db_path" => config.db_path = parse_string_value(val),
                        _ => {}
                    }
                }
            } else if let Some(ref section) = current_section {
                match section.as_str() {
                    "observer" => match key {
                        "lat" => config.observer.lat = parse_float_value(val),
                        "lon" => config.observer.lon = parse_float_value(val),
                        _ => {}
                    },
                    "server" => match key {
                        "host" => {
                            if let Some(v) = parse_string_value(val) {
                                config.server.host = v;
                            }
                        }
                        "port" => {
                            if let Ok(v) = val.parse::<u16>() {
                                config.server.port = v;
                            }
                        }
                        _ => {}
                    },
                    "filter" => match key {
                        "radius_nm" => {
                            if let Some(v) = parse_float_value(val) {
                                config.filter.radius_nm = v;
                            }
                        }
                        "ignore_above_ft" => {
                            config.filter.ignore_above_ft =
                                parse_float_value(val).map(|v| v as i32)
                        }
                        "altitude_floor_ft" => {
                            config.filter.altitude_floor_ft =
                                parse_float_value(val).map(|v| v as i32)
                        }
                        "altitude_ceiling_ft" => {
                            config.filter.altitude_ceiling_ft =
                                parse_float_value(val).map(|v| v as i32)
                        }
                        "whitelist" => config.filter.whitelist = parse_list_value(val),
                        "le_only" => config.filter.le_only = val == "true",
                        "show_all_helicopters" => {
                            config.filter.show_all_helicopters = val != "false"
                        }
                        "detect_circling" => config.filter.detect_circling = val != "false",
                        "detect_loitering" => config.filter.detect_loitering = val != "false",
                        "loiter_threshold_min" => {
                            if let Ok(v) = val.parse::<i64>() {
                                config.filter.loiter_threshold_min = v;
                            }
                        }
                        "circling_min_samples" => {
                            if let Ok(v) = val.parse::<usize>() {
                                config.filter.circling_min_samples = v;
                            }
                        }
                        "log_threats" => config.filter.log_threats = val == "true",
                        _ => {}
                    },
                    _ => {}
                }
            }
        }
    }

    Some(config)
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    if (val.starts_with('"') && val.ends_with('"'))
        || (val.starts_with('\'') && val.ends_with('\''))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

fn parse_float_value(val: &str) -> Option<f64> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    val.parse().ok()
}

/// Flow-style list: `[A1B2C3, D4E5F6]` or a bare comma-separated string.
fn parse_list_value(val: &str) -> Vec<String> {
    let inner = val.trim_start_matches('[').trim_end_matches(']');
    inner
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\''))
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Serialize config to YAML-like text.
fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# cannonball configuration".to_string(), String::new()];

    lines.push("observer:".into());
    match config.observer.lat {
        Some(v) => lines.push(format!("  lat: {v}")),
        None => lines.push("  lat: null".into()),
    }
    match config.observer.lon {
        Some(v) => lines.push(format!("  lon: {v}")),
        None => lines.push("  lon: null".into()),
    }
    lines.push(String::new());

    lines.push("server:".into());
    lines.push(format!("  host: \"{}\"", config.server.host));
    lines.push(format!("  port: {}", config.server.port));
    lines.push(String::new());

    lines.push("filter:".into());
    lines.push(format!("  radius_nm: {}", config.filter.radius_nm));
    match config.filter.ignore_above_ft {
        Some(v) => lines.push(format!("  ignore_above_ft: {v}")),
        None => lines.push("  ignore_above_ft: null".into()),
    }
    match config.filter.altitude_floor_ft {
        Some(v) => lines.push(format!("  altitude_floor_ft: {v}")),
        None => lines.push("  altitude_floor_ft: null".into()),
    }
    match config.filter.altitude_ceiling_ft {
        Some(v) => lines.push(format!("  altitude_ceiling_ft: {v}")),
        None => lines.push("  altitude_ceiling_ft: null".into()),
    }
    lines.push(format!("  whitelist: [{}]", config.filter.whitelist.join(", ")));
    lines.push(format!("  le_only: {}", config.filter.le_only));
    lines.push(format!(
        "  show_all_helicopters: {}",
        config.filter.show_all_helicopters
    ));
    lines.push(format!("  detect_circling: {}", config.filter.detect_circling));
    lines.push(format!("  detect_loitering: {}", config.filter.detect_loitering));
    lines.push(format!(
        "  loiter_threshold_min: {}",
        config.filter.loiter_threshold_min
    ));
    lines.push(format!(
        "  circling_min_samples: {}",
        config.filter.circling_min_samples
    ));
    lines.push(format!("  log_threats: {}", config.filter.log_threats));
    lines.push(String::new());

    for (key, val) in [
        ("feed_url", &config.feed_url),
        ("backend_url", &config.backend_url),
        ("webhook", &config.webhook),
        ("db_path", &config.db_path),
    ] {
        match val {
            Some(v) => lines.push(format!("{key}: \"{v}\"")),
            None => lines.push(format!("{key}: null")),
        }
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let f = FilterConfig::default();
        assert_eq!(f.radius_nm, 15.0);
        assert!(!f.le_only);
        assert!(f.detect_circling);
        assert_eq!(f.circling_min_samples, 10);
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
observer:
  lat: 34.05
  lon: -118.24

server:
  host: "0.0.0.0"
  port: 9090

filter:
  radius_nm: 10
  le_only: true
  loiter_threshold_min: 8

feed_url: "http://localhost:8090/data/aircraft.json"
webhook: null
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.observer.lat, Some(34.05));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.filter.radius_nm, 10.0);
        assert!(config.filter.le_only);
        assert_eq!(config.filter.loiter_threshold_min, 8);
        assert_eq!(
            config.feed_url.as_deref(),
            Some("http://localhost:8090/data/aircraft.json")
        );
        assert!(config.webhook.is_none());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.observer.lat = Some(34.05);
        config.observer.lon = Some(-118.24);
        config.filter.le_only = true;
        config.filter.radius_nm = 25.0;
        config.filter.altitude_floor_ft = Some(500);
        config.filter.altitude_ceiling_ft = Some(8000);
        config.filter.whitelist = vec!["A1B2C3".into(), "D4E5F6".into()];
        config.filter.circling_min_samples = 12;
        config.backend_url = Some("ws://localhost:9000/threats".into());

        let text = serialize_config(&config);
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.observer.lat, Some(34.05));
        assert!(parsed.filter.le_only);
        assert_eq!(parsed.filter.radius_nm, 25.0);
        assert_eq!(parsed.filter.altitude_floor_ft, Some(500));
        assert_eq!(parsed.filter.altitude_ceiling_ft, Some(8000));
        assert_eq!(parsed.filter.whitelist, vec!["A1B2C3", "D4E5F6"]);
        assert_eq!(parsed.filter.circling_min_samples, 12);
        assert_eq!(
            parsed.backend_url.as_deref(),
            Some("ws://localhost:9000/threats")
        );
    }

    #[test]
    fn test_parse_whitelist_forms() {
        let flow = parse_list_value("[A1B2C3, D4E5F6]");
        assert_eq!(flow, vec!["A1B2C3", "D4E5F6"]);
        let bare = parse_list_value("A1B2C3,D4E5F6");
        assert_eq!(bare, vec!["A1B2C3", "D4E5F6"]);
        assert!(parse_list_value("[]").is_empty());
    }

    #[test]
    fn test_parse_null_values() {
        let text = "observer:\n  lat: null\n  lon: ~\n\nwebhook: null\n";
        let config = parse_config(text).unwrap();
        assert!(config.observer.lat.is_none());
        assert!(config.webhook.is_none());
    }
}
