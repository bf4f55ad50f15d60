//! cannonball: CLI + web server for aerial surveillance threat detection.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};

use cannonball_core::assembler::{ThreatEngine, ThreatEvent};
use cannonball_core::config::{self, FilterConfig};
use cannonball_core::feed::{self, LocalFeedDoc};
use cannonball_core::gps::PositionTracker;
use cannonball_core::types::{ObserverPosition, ThreatRecord};

mod alert;
mod api;
mod backend;
mod db;

use alert::{ConsoleAlerts, WebhookDispatcher};

#[derive(Parser)]
#[command(name = "cannonball", version, about = "Aerial surveillance threat detector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan over an aircraft snapshot file and print the threat table
    Scan {
        /// Path to a dump1090-style aircraft.json snapshot
        file: PathBuf,

        /// Observer latitude
        #[arg(long)]
        lat: Option<f64>,

        /// Observer longitude
        #[arg(long)]
        lon: Option<f64>,

        /// Detection radius in nautical miles
        #[arg(long)]
        radius: Option<f64>,

        /// Only show law-enforcement aircraft (and helicopters)
        #[arg(long)]
        le_only: bool,
    },

    /// Serve the JSON API, polling the aircraft feed continuously
    Serve {
        /// Aircraft feed URL (dump1090 aircraft.json endpoint)
        #[arg(long, env = "CANNONBALL_FEED_URL")]
        feed_url: Option<String>,

        /// Backend threat feed WebSocket URL (optional)
        #[arg(long, env = "CANNONBALL_BACKEND_URL")]
        backend_url: Option<String>,

        /// Observer latitude
        #[arg(long)]
        lat: Option<f64>,

        /// Observer longitude
        #[arg(long)]
        lon: Option<f64>,

        /// Listen port
        #[arg(long)]
        port: Option<u16>,

        /// Webhook URL for alert notifications
        #[arg(long)]
        webhook: Option<String>,

        /// SQLite threat log path (enables logging)
        #[arg(long)]
        db_path: Option<String>,

        /// Feed poll interval in seconds
        #[arg(long, default_value = "1.0")]
        interval: f64,
    },

    /// Show threat log statistics
    Stats {
        /// SQLite threat log path
        #[arg(long, default_value = "data/threats.db")]
        db_path: String,
    },

    /// Write a default config file to ~/.cannonball/config.yaml
    Init {
        /// Observer latitude to record as the fallback position
        #[arg(long)]
        lat: Option<f64>,

        /// Observer longitude to record as the fallback position
        #[arg(long)]
        lon: Option<f64>,
    },
}

fn now_sec() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn observer_from(lat: Option<f64>, lon: Option<f64>, cfg: &config::Config) -> Option<ObserverPosition> {
    let lat = lat.or(cfg.observer.lat)?;
    let lon = lon.or(cfg.observer.lon)?;
    Some(ObserverPosition {
        lat,
        lon,
        heading_deg: None,
        speed_kt: None,
        accuracy_m: 0.0,
        timestamp: now_sec(),
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            file,
            lat,
            lon,
            radius,
            le_only,
        } => cmd_scan(file, lat, lon, radius, le_only),
        Commands::Serve {
            feed_url,
            backend_url,
            lat,
            lon,
            port,
            webhook,
            db_path,
            interval,
        } => cmd_serve(feed_url, backend_url, lat, lon, port, webhook, db_path, interval).await,
        Commands::Stats { db_path } => cmd_stats(&db_path),
        Commands::Init { lat, lon } => cmd_init(lat, lon),
    }
}

// ---------------------------------------------------------------------------
// scan
// ---------------------------------------------------------------------------

fn cmd_scan(file: PathBuf, lat: Option<f64>, lon: Option<f64>, radius: Option<f64>, le_only: bool) {
    let cfg = config::load_config();

    let text = std::fs::read_to_string(&file).unwrap_or_else(|e| {
        eprintln!("Error opening {}: {e}", file.display());
        std::process::exit(1);
    });
    let doc: LocalFeedDoc = serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing {}: {e}", file.display());
        std::process::exit(1);
    });

    let mut filter = cfg.filter.clone();
    if let Some(r) = radius {
        filter.radius_nm = r;
    }
    if le_only {
        filter.le_only = true;
    }

    let observer = observer_from(lat, lon, &cfg);
    if observer.is_none() {
        eprintln!("No observer position: pass --lat/--lon or set one in the config.");
        eprintln!("Continuing in degraded mode (no distances).");
    }

    let mut engine = ThreatEngine::new(filter);
    let reports = feed::from_local_feed(&doc);
    let (records, events) = engine.tick(&reports, observer.as_ref(), doc.now);

    println!();
    println!(
        "Scan: {} aircraft in snapshot, {} threats in range",
        doc.aircraft.len(),
        records.len()
    );

    let console = ConsoleAlerts;
    for event in &events {
        console.dispatch(event);
    }

    if !records.is_empty() {
        println!();
        print_threat_table(&records);
    }
}

fn print_threat_table(records: &[ThreatRecord]) {
    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Callsign", "Category", "Dist (nm)", "Dir", "Alt (ft)", "Trend", "Urgency", "Level",
    ]);

    for r in records {
        table.add_row(vec![
            Cell::new(&r.id),
            Cell::new(r.callsign.as_deref().unwrap_or("-")),
            Cell::new(r.classification.category.unwrap_or("-")),
            Cell::new(
                r.distance_nm
                    .map(|d| format!("{d:.1}"))
                    .unwrap_or("-".into()),
            ),
            Cell::new(r.direction.unwrap_or("-")),
            Cell::new(
                r.altitude_ft
                    .map(|a| a.to_string())
                    .unwrap_or("-".into()),
            ),
            Cell::new(format!("{:?}", r.trend).to_lowercase()),
            Cell::new(r.urgency_score),
            Cell::new(format!("{:?}", r.threat_level).to_lowercase()),
        ]);
    }

    println!("{table}");
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
async fn cmd_serve(
    feed_url: Option<String>,
    backend_url: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    port: Option<u16>,
    webhook: Option<String>,
    db_path: Option<String>,
    interval: f64,
) {
    let cfg = config::load_config();

    let feed_url = feed_url.or(cfg.feed_url.clone()).unwrap_or_else(|| {
        eprintln!("No feed URL: pass --feed-url or set one in the config.");
        std::process::exit(1);
    });
    let backend_url = backend_url.or(cfg.backend_url.clone());
    let webhook = webhook.or(cfg.webhook.clone());
    let db_path = db_path.or(cfg.db_path.clone());
    let port = port.unwrap_or(cfg.server.port);
    let host = cfg.server.host.clone();

    // The config/CLI fallback position acts as the position source here;
    // a live GPS collaborator would drive the same transitions.
    let mut gps = PositionTracker::new();
    gps.begin_check();
    match observer_from(lat, lon, &cfg) {
        Some(pos) => {
            gps.prompt();
            gps.request();
            gps.grant(pos);
        }
        None => gps.unavailable(),
    }

    let mut filter: FilterConfig = cfg.filter.clone();
    filter.log_threats = db_path.is_some();

    let state: api::SharedState = Arc::new(Mutex::new(api::AppState::new(
        ThreatEngine::new(filter),
        gps,
    )));

    let backend_feed: backend::SharedBackendFeed = Arc::default();
    if let Some(url) = backend_url {
        tokio::spawn(backend::run(url, backend_feed.clone()));
    }

    // Feed poll loop: fetch outside the lock, tick inside it.
    let poll_state = state.clone();
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let console = ConsoleAlerts;
        let webhook = webhook.map(|url| WebhookDispatcher::new(&url));
        let database = db_path.and_then(|p| match db::Database::open(&p) {
            Ok(d) => Some(d),
            Err(e) => {
                eprintln!("Error opening database {p}: {e}");
                None
            }
        });

        loop {
            let now = now_sec();
            let backend_threats = backend_feed.lock().unwrap().fresh_threats(now);

            let events = if let Some(threats) = backend_threats {
                let mut st = poll_state.lock().unwrap();
                let (records, events) = st.engine.tick_backend(threats, now);
                st.mode = "backend";
                st.latest = records;
                events
            } else {
                match fetch_snapshot(&client, &feed_url).await {
                    Ok(doc) => {
                        let reports = feed::from_local_feed(&doc);
                        let mut st = poll_state.lock().unwrap();
                        let observer = st.gps.current_position().copied();
                        let (records, events) = st.engine.tick(&reports, observer.as_ref(), now);
                        st.mode = "local";
                        st.latest = records;
                        events
                    }
                    Err(e) => {
                        eprintln!("  [feed] fetch failed: {e}");
                        Vec::new()
                    }
                }
            };

            for event in &events {
                console.dispatch(event);
                if let Some(wh) = &webhook {
                    wh.notify(event);
                }
                if let (Some(db), ThreatEvent::LogThreat { record }) = (&database, event) {
                    if let Err(e) = db.log_threat(record) {
                        eprintln!("  [db] insert failed: {e}");
                    }
                }
            }

            tokio::time::sleep(Duration::from_secs_f64(interval)).await;
        }
    });

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        eprintln!("Error binding {addr}: {e}");
        std::process::exit(1);
    });
    println!("Serving on http://{addr}  (GET /api/threats, /api/status)");

    if let Err(e) = axum::serve(listener, api::router(state)).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

async fn fetch_snapshot(client: &reqwest::Client, url: &str) -> Result<LocalFeedDoc, reqwest::Error> {
    client.get(url).send().await?.json::<LocalFeedDoc>().await
}

// ---------------------------------------------------------------------------
// init / stats
// ---------------------------------------------------------------------------

fn cmd_init(lat: Option<f64>, lon: Option<f64>) {
    let mut cfg = config::Config::default();
    cfg.observer.lat = lat;
    cfg.observer.lon = lon;

    match config::save_config(&cfg) {
        Ok(path) => println!("Wrote config to {}", path.display()),
        Err(e) => {
            eprintln!("Error writing config: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_stats(db_path: &str) {
    let database = db::Database::open(db_path).unwrap_or_else(|e| {
        eprintln!("Error opening database {db_path}: {e}");
        std::process::exit(1);
    });

    let stats = database.stats();

    println!();
    println!("Threat log: {db_path}");
    println!();
    println!("  Logged threats:   {}", stats.threats);
    println!("  Unique aircraft:  {}", stats.aircraft);
    println!("  Law enforcement:  {}", stats.law_enforcement);
    println!();
}
