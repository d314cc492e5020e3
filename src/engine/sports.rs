//! Per-sport breakdown.
//!
//! One row per distinct sport label, in the order each label first appears
//! in the ledger. Labels are compared verbatim (no case folding).

use serde::Serialize;
use std::collections::HashMap;

use super::{mean_present, rate, record_counts, sum_present};
use crate::types::BetRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportBreakdown {
    pub sport: String,
    /// Every bet in this sport, graded or not.
    pub total_bets: usize,
    pub graded_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub units: f64,
    /// Mean American odds over bets with parsable odds. `None` means no
    /// data, which is not the same as an average of zero.
    pub avg_odds: Option<f64>,
}

pub fn by_sport(records: &[BetRecord]) -> Vec<SportBreakdown> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&BetRecord>> = HashMap::new();

    for r in records {
        let key = r.sport.as_str();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(r);
    }

    order
        .into_iter()
        .map(|sport| {
            let bets = &groups[sport];
            let (wins, losses) = record_counts(bets.iter().copied());
            SportBreakdown {
                sport: sport.to_string(),
                total_bets: bets.len(),
                graded_bets: wins + losses,
                wins,
                losses,
                win_rate: rate(wins, wins + losses),
                units: sum_present(bets.iter().map(|r| r.unit_result)),
                avg_odds: mean_present(bets.iter().map(|r| r.american_odds.map(|o| o as f64))),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
