//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.
//! Every request reloads the ledger from the source and recomputes the
//! metrics; nothing is cached between requests.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::BankrollMode;
use crate::engine::sports::SportBreakdown;
use crate::engine::weekly::{self, WeeklyBreakdown};
use crate::engine::{MetricsEngine, MetricsReport};
use crate::loader::RecordLoader;
use crate::source::TabularSource;
use crate::strategy::odds::{Odds, OddsFormat};
use crate::strategy::stake::{dollar_value, StakeCalculator, StakeQuote};
use crate::types::{BankrollSnapshot, LoadedBook, TrackerError};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Supplies "now" to every handler.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Wall clock in local time.
pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Local::now().naive_local())
}

/// Presentation settings taken from `[dashboard]`.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub bankroll_mode: BankrollMode,
    pub manual_bankroll: f64,
    pub submissions_enabled: bool,
    pub currency: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            bankroll_mode: BankrollMode::Sheet,
            manual_bankroll: 300.0,
            submissions_enabled: true,
            currency: "USD".to_string(),
        }
    }
}

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub loader: RecordLoader,
    pub engine: MetricsEngine,
    pub settings: DashboardSettings,
    clock: Clock,
}

impl DashboardState {
    pub fn new(loader: RecordLoader, engine: MetricsEngine, settings: DashboardSettings) -> Self {
        Self { loader, engine, settings, clock: system_clock() }
    }

    /// Replace the clock (tests pin "now" with this).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn source(&self) -> &Arc<dyn TabularSource> {
        self.loader.source()
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON error body with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "status": "error", "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Whether the ledger could be read. `Unavailable` is never the same thing
/// as a ledger with zero bets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStatus {
    Loaded,
    Unavailable,
}

/// Outcome of one load attempt, with failures folded into an empty book.
struct Fetched {
    status: DataStatus,
    error: Option<String>,
    book: LoadedBook,
}

async fn fetch(state: &DashboardState) -> Fetched {
    match state.loader.load().await {
        Ok(book) => Fetched { status: DataStatus::Loaded, error: None, book },
        Err(e) => {
            error!(source = state.source().name(), error = %e, "Ledger unavailable, serving empty dataset");
            Fetched {
                status: DataStatus::Unavailable,
                error: Some(e.to_string()),
                book: LoadedBook {
                    records: Vec::new(),
                    bankroll: BankrollSnapshot::unknown(),
                    warnings: Vec::new(),
                },
            }
        }
    }
}

/// Bankroll shown on the dashboard and fed to the calculators.
#[derive(Debug, Clone, Serialize)]
pub struct BankrollView {
    pub amount: f64,
    pub known: bool,
    /// `"sheet"`, `"manual"` or `"override"`.
    pub origin: &'static str,
}

fn resolve_bankroll(
    settings: &DashboardSettings,
    sheet: BankrollSnapshot,
    override_amount: Option<f64>,
) -> BankrollView {
    if let Some(v) = override_amount.filter(|v| v.is_finite() && *v > 0.0) {
        return BankrollView { amount: v, known: true, origin: "override" };
    }
    match settings.bankroll_mode {
        BankrollMode::Manual => BankrollView {
            amount: settings.manual_bankroll,
            known: settings.manual_bankroll > 0.0,
            origin: "manual",
        },
        BankrollMode::Sheet => BankrollView { amount: sheet.amount, known: sheet.known, origin: "sheet" },
    }
}

// ---------------------------------------------------------------------------
// Query and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Week anchor, defaults to today.
    pub date: Option<NaiveDate>,
    /// Manual bankroll override.
    pub bankroll: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub data_status: DataStatus,
    pub error: Option<String>,
    pub as_of: NaiveDateTime,
    pub currency: String,
    pub bankroll: BankrollView,
    pub warnings: usize,
    pub metrics: MetricsReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct SportsResponse {
    pub data_status: DataStatus,
    pub error: Option<String>,
    pub sports: Vec<SportBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekResponse {
    pub data_status: DataStatus,
    pub error: Option<String>,
    pub week: WeeklyBreakdown,
}

#[derive(Debug, Deserialize)]
pub struct StakeQuery {
    pub units_to_win: f64,
    pub odds: f64,
    #[serde(default)]
    pub format: OddsFormat,
    pub bankroll: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakeResponse {
    pub bankroll: BankrollView,
    /// Odds as entered, e.g. `"+150"` or `"2.50"`.
    pub odds: String,
    #[serde(flatten)]
    pub quote: StakeQuote,
}

#[derive(Debug, Deserialize)]
pub struct UnitQuery {
    pub units: f64,
    pub bankroll: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitResponse {
    pub bankroll: BankrollView,
    pub units: f64,
    pub dollars: f64,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// Week anchor for a request: the `date` parameter, else today. Rejected
/// before touching the source when its week falls off the calendar.
fn anchor_date(state: &DashboardState, requested: Option<NaiveDate>) -> Result<NaiveDate, ApiError> {
    let anchor = requested.unwrap_or(state.now().date());
    match weekly::week_bounds(anchor) {
        Some(_) => Ok(anchor),
        None => Err(out_of_range(anchor)),
    }
}

fn out_of_range(anchor: NaiveDate) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, TrackerError::DateOutOfRange(anchor).to_string())
}

/// GET /api/report
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let now = state.now();
    let anchor = anchor_date(&state, query.date)?;
    let fetched = fetch(&state).await;

    if !fetched.book.warnings.is_empty() {
        warn!(count = fetched.book.warnings.len(), "Report built with unparsable cells");
    }

    let metrics = state
        .engine
        .report(&fetched.book.records, anchor, now)
        .map_err(|_| out_of_range(anchor))?;

    Ok(Json(ReportResponse {
        data_status: fetched.status,
        error: fetched.error,
        as_of: now,
        currency: state.settings.currency.clone(),
        bankroll: resolve_bankroll(&state.settings, fetched.book.bankroll, query.bankroll),
        warnings: fetched.book.warnings.len(),
        metrics,
    }))
}

/// GET /api/sports
pub async fn get_sports(State(state): State<AppState>) -> Json<SportsResponse> {
    let fetched = fetch(&state).await;
    Json(SportsResponse {
        data_status: fetched.status,
        error: fetched.error,
        sports: crate::engine::sports::by_sport(&fetched.book.records),
    })
}

/// GET /api/week
pub async fn get_week(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<WeekResponse>, ApiError> {
    let anchor = anchor_date(&state, query.date)?;
    let fetched = fetch(&state).await;
    let week = weekly::weekly_breakdown(&fetched.book.records, anchor).ok_or_else(|| out_of_range(anchor))?;
    Ok(Json(WeekResponse {
        data_status: fetched.status,
        error: fetched.error,
        week,
    }))
}

/// Bankroll for a calculator request. Only touches the source when neither
/// an override nor manual mode supplies one.
async fn calculator_bankroll(state: &DashboardState, override_amount: Option<f64>) -> Result<BankrollView, ApiError> {
    let needs_sheet = override_amount.filter(|v| v.is_finite() && *v > 0.0).is_none()
        && state.settings.bankroll_mode == BankrollMode::Sheet;
    let sheet = if needs_sheet {
        let fetched = fetch(state).await;
        if let Some(e) = fetched.error {
            return Err(ApiError::new(StatusCode::BAD_GATEWAY, e));
        }
        fetched.book.bankroll
    } else {
        BankrollSnapshot::unknown()
    };

    let view = resolve_bankroll(&state.settings, sheet, override_amount);
    if !view.known {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Bankroll is unknown; pass ?bankroll= to override",
        ));
    }
    Ok(view)
}

/// GET /api/calculator/stake
pub async fn get_stake(
    State(state): State<AppState>,
    Query(query): Query<StakeQuery>,
) -> Result<Json<StakeResponse>, ApiError> {
    if !query.units_to_win.is_finite() || !query.odds.is_finite() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "units_to_win and odds must be numbers"));
    }
    if query.units_to_win <= 0.0 {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "units_to_win must be greater than zero"));
    }
    let bankroll = calculator_bankroll(&state, query.bankroll).await?;
    let odds = Odds::from_value(query.odds, query.format);
    let quote = StakeCalculator::new(bankroll.amount).quote(query.units_to_win, odds);

    Ok(Json(StakeResponse { bankroll, odds: odds.to_string(), quote }))
}

/// GET /api/calculator/unit
pub async fn get_unit_value(
    State(state): State<AppState>,
    Query(query): Query<UnitQuery>,
) -> Result<Json<UnitResponse>, ApiError> {
    if !query.units.is_finite() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "units must be a number"));
    }
    let bankroll = calculator_bankroll(&state, query.bankroll).await?;
    let dollars = dollar_value(query.units, bankroll.amount);
    Ok(Json(UnitResponse { bankroll, units: query.units, dollars }))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
