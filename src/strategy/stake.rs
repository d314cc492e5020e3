//! Stake sizing.
//!
//! Answers "how much do I bet to win N units?" against the present bankroll,
//! and converts a unit count to dollars.

use serde::Serialize;
use tracing::debug;

use super::odds::Odds;
use crate::types::UNIT_FRACTION;

/// Result of a "win X units" calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeQuote {
    pub one_unit_value: f64,
    pub target_profit: f64,
    pub decimal_odds: f64,
    /// Dollars to risk. Zero when the price cannot produce a profit.
    pub stake: f64,
}

/// Stake needed to net `desired_unit_win` units if the bet wins.
///
/// Decimal odds at or below 1.0 yield a zero stake rather than an error.
pub fn stake_for_units(desired_unit_win: f64, current_bankroll: f64, decimal_odds: f64) -> StakeQuote {
    let one_unit_value = current_bankroll * UNIT_FRACTION;
    let target_profit = desired_unit_win * one_unit_value;
    let stake = if decimal_odds > 1.0 {
        target_profit / (decimal_odds - 1.0)
    } else {
        0.0
    };

    debug!(
        desired_unit_win,
        current_bankroll,
        decimal_odds,
        stake = format!("${:.2}", stake),
        "Stake sized"
    );

    StakeQuote { one_unit_value, target_profit, decimal_odds, stake }
}

/// Dollar value of `units` at the given bankroll.
pub fn dollar_value(units: f64, current_bankroll: f64) -> f64 {
    current_bankroll * (units / 100.0)
}

/// Calculator bound to one bankroll value.
pub struct StakeCalculator {
    bankroll: f64,
}

impl StakeCalculator {
    pub fn new(bankroll: f64) -> Self {
        Self { bankroll }
    }

    pub fn bankroll(&self) -> f64 {
        self.bankroll
    }

    pub fn quote(&self, units_to_win: f64, odds: Odds) -> StakeQuote {
        stake_for_units(units_to_win, self.bankroll, odds.to_decimal())
    }

    pub fn dollar_value(&self, units: f64) -> f64 {
        dollar_value(units, self.bankroll)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
