//! Shared types for the bet tracker.
//!
//! These types form the data model used across all modules. The loader
//! produces them, the metrics engine consumes them, and the dashboard
//! serialises them. Nothing in here performs I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit is 1% of the bankroll in effect when a bet was placed.
pub const UNIT_FRACTION: f64 = 0.01;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Grading state of a bet, decoded from the `W_L_P` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Push,
    /// Anything that is not yet graded (blank, "pending", unknown codes).
    Pending,
}

impl Outcome {
    /// Decode a sheet cell. Unknown values are treated as not yet graded.
    pub fn from_cell(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "w" | "win" => Outcome::Win,
            "l" | "loss" => Outcome::Loss,
            "p" | "push" => Outcome::Push,
            _ => Outcome::Pending,
        }
    }

    /// A graded bet is one recorded as a win or a loss.
    pub fn is_graded(&self) -> bool {
        matches!(self, Outcome::Win | Outcome::Loss)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "W"),
            Outcome::Loss => write!(f, "L"),
            Outcome::Push => write!(f, "P"),
            Outcome::Pending => write!(f, "-"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bet record
// ---------------------------------------------------------------------------

/// One row of wagering history after coercion.
///
/// Numeric fields are `None` when the source cell was blank or could not be
/// parsed. Aggregations skip `None` rather than treating it as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    /// `None` when the date cell was unparsable; such rows never appear in
    /// date-filtered views.
    pub date: Option<NaiveDate>,
    pub game: String,
    pub bet_description: String,
    pub sport: String,
    pub american_odds: Option<i64>,
    pub units_staked: Option<f64>,
    pub outcome: Outcome,
    pub is_pick_of_the_day: bool,
    /// Bankroll snapshot at placement time.
    pub bankroll_at_time: Option<f64>,
    /// Net units won or lost.
    pub unit_result: Option<f64>,
    pub leg_count_or_flag: String,
    pub is_parlay: bool,
    /// `bankroll_at_time * 0.01`.
    pub unit_value: Option<f64>,
    /// `unit_result * unit_value`.
    pub money_result: Option<f64>,
}

impl BetRecord {
    /// Build a record and compute its historical derived columns.
    ///
    /// Derived values always use this record's own bankroll snapshot, never
    /// the present bankroll.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: Option<NaiveDate>,
        game: impl Into<String>,
        bet_description: impl Into<String>,
        sport: impl Into<String>,
        american_odds: Option<i64>,
        units_staked: Option<f64>,
        outcome: Outcome,
        is_pick_of_the_day: bool,
        bankroll_at_time: Option<f64>,
        unit_result: Option<f64>,
        leg_count_or_flag: impl Into<String>,
        is_parlay: bool,
    ) -> Self {
        let unit_value = bankroll_at_time.map(|b| b * UNIT_FRACTION);
        let money_result = match (unit_result, unit_value) {
            (Some(u), Some(v)) => Some(u * v),
            _ => None,
        };
        Self {
            date,
            game: game.into(),
            bet_description: bet_description.into(),
            sport: sport.into(),
            american_odds,
            units_staked,
            outcome,
            is_pick_of_the_day,
            bankroll_at_time,
            unit_result,
            leg_count_or_flag: leg_count_or_flag.into(),
            is_parlay,
            unit_value,
            money_result,
        }
    }

    /// Helper to build a test record with sensible defaults.
    #[cfg(test)]
    pub fn sample(date: &str, sport: &str, outcome: Outcome, unit_result: f64) -> Self {
        Self::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            "Team A vs Team B",
            "Team A ML",
            sport,
            Some(-110),
            Some(1.0),
            outcome,
            false,
            Some(1000.0),
            Some(unit_result),
            "",
            false,
        )
    }
}

impl fmt::Display for BetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "????-??-??".to_string());
        let odds = self
            .american_odds
            .map(crate::strategy::odds::format_american)
            .unwrap_or_else(|| "n/a".to_string());
        write!(
            f,
            "{date} [{}] {}: {} @ {odds} ({})",
            self.sport, self.game, self.bet_description, self.outcome,
        )
    }
}

// ---------------------------------------------------------------------------
// Bankroll snapshot
// ---------------------------------------------------------------------------

/// The present account bankroll, read independently of the bet rows.
///
/// `amount` is `0.0` whenever the source value was missing or not a positive
/// number. `known` tells that case apart from a real balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankrollSnapshot {
    pub amount: f64,
    pub known: bool,
}

impl BankrollSnapshot {
    pub fn known(amount: f64) -> Self {
        Self { amount, known: true }
    }

    pub fn unknown() -> Self {
        Self { amount: 0.0, known: false }
    }

    /// Interpret a raw cell. Only finite values above zero are accepted.
    pub fn from_cell(raw: &str) -> Self {
        match crate::loader::parse_number(raw) {
            Some(v) if v.is_finite() && v > 0.0 => Self::known(v),
            _ => Self::unknown(),
        }
    }
}

impl fmt::Display for BankrollSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.known {
            write!(f, "${:.2}", self.amount)
        } else {
            write!(f, "unknown")
        }
    }
}

// ---------------------------------------------------------------------------
// Load output
// ---------------------------------------------------------------------------

/// A cell that failed coercion. Non-fatal: the field becomes `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// 1-based sheet row number.
    pub row: usize,
    pub column: String,
    pub value: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} column {}: could not parse {:?}",
            self.row, self.column, self.value
        )
    }
}

/// Everything a single load call produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedBook {
    pub records: Vec<BetRecord>,
    pub bankroll: BankrollSnapshot,
    pub warnings: Vec<ParseWarning>,
}

impl LoadedBook {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the tracker.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("Schema mismatch: missing columns {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Load failure ({source_name}): {message}")]
    LoadFailure { source_name: String, message: String },

    #[error("Append failure ({source_name}): {message}")]
    AppendFailure { source_name: String, message: String },

    #[error("Invalid cell reference: {0}")]
    InvalidCellReference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Date out of range: the week of {0} cannot be represented")]
    DateOutOfRange(NaiveDate),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
