//! Odds conversion and settlement helpers.
//!
//! American odds are the sheet's native notation; decimal odds are what the
//! stake calculator works in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Outcome;

/// Which notation a user typed odds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OddsFormat {
    #[default]
    American,
    Decimal,
}

impl FromStr for OddsFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "american" | "us" => Ok(OddsFormat::American),
            "decimal" | "eu" => Ok(OddsFormat::Decimal),
            _ => Err(anyhow::anyhow!("Unknown odds format: {s}")),
        }
    }
}

/// A price in either notation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Odds {
    American(i64),
    Decimal(f64),
}

impl Odds {
    /// Interpret a raw number in the given notation. American input is
    /// rounded to the nearest whole price.
    pub fn from_value(value: f64, format: OddsFormat) -> Self {
        match format {
            OddsFormat::American => Odds::American(value.round() as i64),
            OddsFormat::Decimal => Odds::Decimal(value),
        }
    }

    pub fn to_decimal(self) -> f64 {
        match self {
            Odds::American(a) => american_to_decimal(a),
            Odds::Decimal(d) => d,
        }
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Odds::American(a) => write!(f, "{}", format_american(*a)),
            Odds::Decimal(d) => write!(f, "{d:.2}"),
        }
    }
}

/// Convert American odds to decimal odds.
///
/// `0` is not a real American price; it is read as `+100` (even money, 2.0).
pub fn american_to_decimal(odds: i64) -> f64 {
    if odds > 0 {
        odds as f64 / 100.0 + 1.0
    } else if odds < 0 {
        100.0 / odds.unsigned_abs() as f64 + 1.0
    } else {
        2.0
    }
}

/// `+150` / `-110` style rendering.
pub fn format_american(odds: i64) -> String {
    if odds > 0 {
        format!("+{odds}")
    } else {
        format!("{odds}")
    }
}

/// Break-even win probability implied by decimal odds (no vig removal).
/// Returns `None` for prices at or below 1.0.
pub fn implied_probability(decimal_odds: f64) -> Option<f64> {
    (decimal_odds > 1.0).then(|| 1.0 / decimal_odds)
}

/// Profit in units if a stake of `units` wins at American `odds`.
pub fn potential_profit(odds: i64, units: f64) -> f64 {
    (american_to_decimal(odds) - 1.0) * units
}

/// Net units for a settled bet: profit on a win, the stake on a loss,
/// nothing for pushes or ungraded bets.
pub fn settle_units(odds: i64, units: f64, outcome: Outcome) -> f64 {
    match outcome {
        Outcome::Win => potential_profit(odds, units),
        Outcome::Loss => -units,
        Outcome::Push | Outcome::Pending => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
