//! Record loader: sheet rows in, typed bet records out.
//!
//! Reads the bankroll cell and the bet rows from a `TabularSource`, checks
//! the fixed header schema, coerces every cell, and computes the per-record
//! unit value and money result. Unparsable cells become `None` and are
//! reported as `ParseWarning`s; they never abort the load.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::source::{SheetRow, TabularSource};
use crate::types::{BankrollSnapshot, BetRecord, LoadedBook, Outcome, ParseWarning, TrackerError};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

pub const COL_DATE: &str = "Date";
pub const COL_GAME: &str = "Game";
pub const COL_BET: &str = "Bet";
pub const COL_SPORT: &str = "Sport";
pub const COL_ODDS: &str = "Odds";
pub const COL_UNITS: &str = "Units";
pub const COL_OUTCOME: &str = "W_L_P";
pub const COL_POTD: &str = "POTD";
pub const COL_BANKROLL: &str = "Bankroll";
pub const COL_UNIT_RESULTS: &str = "Unit_Results";
pub const COL_LEG: &str = "Leg_or_No";
pub const COL_PARLAY: &str = "Is_Parlay";

/// Column names expected on the header row, in sheet order.
pub const EXPECTED_HEADERS: [&str; 12] = [
    COL_DATE, COL_GAME, COL_BET, COL_SPORT, COL_ODDS, COL_UNITS,
    COL_OUTCOME, COL_POTD, COL_BANKROLL, COL_UNIT_RESULTS, COL_LEG, COL_PARLAY,
];

/// Title row first, column names on the second row.
pub const DEFAULT_HEADER_ROW: usize = 2;

/// Where the present bankroll lives on the sheet.
pub const DEFAULT_BANKROLL_CELL: &str = "B1";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// 1-based row holding column names.
    pub header_row: usize,
    /// A1 reference of the bankroll cell. `None` skips the read and yields
    /// an unknown snapshot (manual-bankroll setups).
    pub bankroll_cell: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            header_row: DEFAULT_HEADER_ROW,
            bankroll_cell: Some(DEFAULT_BANKROLL_CELL.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

pub struct RecordLoader {
    source: Arc<dyn TabularSource>,
    config: LoaderConfig,
}

impl RecordLoader {
    pub fn new(source: Arc<dyn TabularSource>, config: LoaderConfig) -> Self {
        Self { source, config }
    }

    /// The data source this loader reads from.
    pub fn source(&self) -> &Arc<dyn TabularSource> {
        &self.source
    }

    /// Fetch and coerce everything. No retries, no partial results.
    pub async fn load(&self) -> Result<LoadedBook, TrackerError> {
        let source_name = self.source.name().to_string();
        debug!(source = %source_name, "Loading bet ledger");

        let bankroll = match &self.config.bankroll_cell {
            Some(cell) => {
                let raw = self.source.read_cell(cell).await.inspect_err(|e| {
                    error!(source = %source_name, error = %e, "Bankroll read failed");
                })?;
                let snapshot = BankrollSnapshot::from_cell(&raw);
                if !snapshot.known {
                    warn!(cell = %cell, value = %raw, "Bankroll cell is not a positive number");
                }
                snapshot
            }
            None => BankrollSnapshot::unknown(),
        };

        let expected: Vec<String> = EXPECTED_HEADERS.iter().map(|h| h.to_string()).collect();
        let rows = self
            .source
            .read_rows(self.config.header_row, &expected)
            .await
            .inspect_err(|e| {
                error!(source = %source_name, error = %e, "Bet rows could not be loaded");
            })?;

        let mut warnings = Vec::new();
        let records: Vec<BetRecord> = rows.iter().map(|r| coerce_row(r, &mut warnings)).collect();

        for w in &warnings {
            warn!(row = w.row, column = %w.column, value = %w.value, "Cell left empty after failed coercion");
        }

        info!(
            source = %source_name,
            records = records.len(),
            warnings = warnings.len(),
            bankroll = %bankroll,
            "Bet ledger loaded"
        );

        Ok(LoadedBook { records, bankroll, warnings })
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Turn one keyed sheet row into a record, collecting warnings for cells
/// that could not be coerced.
pub fn coerce_row(row: &SheetRow, warnings: &mut Vec<ParseWarning>) -> BetRecord {
    let mut warn_on = |column: &str, parsed_ok: bool| {
        let value = row.get(column);
        if !parsed_ok && !value.trim().is_empty() {
            warnings.push(ParseWarning {
                row: row.row_number,
                column: column.to_string(),
                value: value.to_string(),
            });
        }
    };

    let date = parse_date(row.get(COL_DATE));
    warn_on(COL_DATE, date.is_some());

    let odds = parse_number(row.get(COL_ODDS)).map(|v| v.round() as i64);
    warn_on(COL_ODDS, odds.is_some());

    let units = parse_number(row.get(COL_UNITS));
    warn_on(COL_UNITS, units.is_some());

    let bankroll = parse_number(row.get(COL_BANKROLL));
    warn_on(COL_BANKROLL, bankroll.is_some());

    let unit_result = parse_number(row.get(COL_UNIT_RESULTS));
    warn_on(COL_UNIT_RESULTS, unit_result.is_some());

    BetRecord::new(
        date,
        row.get(COL_GAME).trim(),
        row.get(COL_BET).trim(),
        row.get(COL_SPORT).trim(),
        odds,
        units,
        Outcome::from_cell(row.get(COL_OUTCOME)),
        parse_flag(row.get(COL_POTD)),
        bankroll,
        unit_result,
        row.get(COL_LEG).trim(),
        parse_flag(row.get(COL_PARLAY)),
    )
}

/// Parse a numeric cell. Currency symbols, thousands separators, a leading
/// `+` and a trailing `%` are tolerated. Non-finite values are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.strip_suffix('%').unwrap_or(&cleaned);
    let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned).trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date cell in any of the layouts a sheet is likely to produce.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // US layout; a two-digit trailing year means 20xx, not year 26 AD.
    let slash_parts: Vec<&str> = s.split('/').collect();
    if slash_parts.len() == 3 {
        let fmt = if slash_parts[2].len() == 2 { "%m/%d/%y" } else { "%m/%d/%Y" };
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Truthy sheet flags: `1`, `true`, `yes`, `y`, `x`.
pub fn parse_flag(raw: &str) -> bool {
    let s = raw.trim().to_lowercase();
    matches!(s.as_str(), "true" | "yes" | "y" | "x")
        || parse_number(&s).is_some_and(|v| v == 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
