//! BETTRACKER: Sports Betting Ledger Dashboard
//!
//! Entry point. Loads configuration, initialises structured logging,
//! acquires the ledger source once, checks that it loads, and serves the
//! dashboard until Ctrl+C.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{error, info, warn};

use bettracker::config::{self, SourceKind};
use bettracker::dashboard::{self, DashboardSettings, DashboardState};
use bettracker::engine::MetricsEngine;
use bettracker::loader::RecordLoader;
use bettracker::source::local::LocalWorkbook;
use bettracker::source::sheets::SheetsClient;
use bettracker::source::TabularSource;

const BANNER: &str = r#"
 ____       _   _____               _
| __ )  ___| |_|_   _| __ __ _  ___| | _____ _ __
|  _ \ / _ \ __| | || '__/ _` |/ __| |/ / _ \ '__|
| |_) |  __/ |_  | || | | (_| | (__|   <  __/ |
|____/ \___|\__| |_||_|  \__,_|\___|_|\_\___|_|

  Units, records and P/L from your betting sheet
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("BETTRACKER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        tracker = %cfg.tracker.name,
        source = ?cfg.source.kind,
        port = cfg.dashboard.port,
        bankroll_mode = ?cfg.dashboard.bankroll_mode,
        currency = %cfg.tracker.currency,
        "BETTRACKER starting up"
    );

    // -- Acquire the ledger source ---------------------------------------

    let source = open_source(&cfg)?;
    let loader = RecordLoader::new(source.clone(), cfg.loader_config());

    // A failed first load is logged, not fatal: the dashboard reports the
    // ledger as unavailable until the source recovers.
    match loader.load().await {
        Ok(book) => info!(
            records = book.records.len(),
            warnings = book.warnings.len(),
            bankroll = %book.bankroll,
            "Initial load OK"
        ),
        Err(e) => warn!(error = %e, "Initial load failed"),
    }

    let settings = DashboardSettings {
        bankroll_mode: cfg.dashboard.bankroll_mode,
        manual_bankroll: cfg.dashboard.manual_bankroll,
        submissions_enabled: cfg.dashboard.submissions_enabled,
        currency: cfg.tracker.currency.clone(),
    };
    let state = Arc::new(DashboardState::new(
        loader,
        MetricsEngine::new(cfg.engine_config()),
        settings,
    ));

    // -- Serve -----------------------------------------------------------

    info!("Press Ctrl+C to stop.");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Shutdown signal received.");
    };
    dashboard::serve(state, cfg.dashboard.port, shutdown).await?;

    info!(source = source.name(), "BETTRACKER shut down cleanly.");
    Ok(())
}

/// Build the configured ledger source.
fn open_source(cfg: &config::AppConfig) -> Result<Arc<dyn TabularSource>> {
    match cfg.source.kind {
        SourceKind::Local => {
            let path = cfg.source.local_path.as_deref().unwrap_or("betting_sheet.json");
            let book = LocalWorkbook::open(path)
                .with_context(|| format!("Failed to open local workbook: {path}"))?;
            info!(path, "Using local workbook");
            Ok(Arc::new(book))
        }
        SourceKind::Sheets => {
            let spreadsheet_id = cfg
                .source
                .spreadsheet_id
                .clone()
                .context("source.spreadsheet_id is not set")?;
            let token_env = cfg.source.token_env.as_deref().context("source.token_env is not set")?;
            let token = SecretString::new(config::AppConfig::resolve_env(token_env)?);
            let sheet_name = cfg.source.sheet_name.clone().unwrap_or_else(|| "Sheet1".to_string());
            info!(spreadsheet_id = %spreadsheet_id, sheet = %sheet_name, "Using Google Sheets");
            Ok(Arc::new(SheetsClient::new(spreadsheet_id, sheet_name, token)?))
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bettracker=info"));

    let json_logging = std::env::var("BETTRACKER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
