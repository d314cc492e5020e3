//! Book-wide summary: record, win rate, P/L, trailing window, POTD.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use super::{rate, record_counts, sum_present};
use crate::types::{BetRecord, Outcome};

/// Headline numbers for the whole ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_bets: usize,
    pub graded_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    pub pending: usize,
    /// Percent of graded bets won; 0 when nothing is graded.
    pub win_rate: f64,
    /// `"{wins}-{losses}"`.
    pub overall_record: String,
    pub total_money: f64,
    pub total_units: f64,
    /// Units over the trailing window ending at `as_of`.
    pub weekly_pl: f64,
    pub potd_bets: usize,
    pub potd_wins: usize,
    pub potd_rate: f64,
    /// Units staked on settled (win/loss/push) bets.
    pub units_risked: f64,
    pub roi_pct: f64,
}

pub fn summarize(records: &[BetRecord], as_of: NaiveDateTime, trailing_days: i64) -> Summary {
    let (wins, losses) = record_counts(records.iter());
    let graded_bets = wins + losses;
    let pushes = records.iter().filter(|r| r.outcome == Outcome::Push).count();
    let pending = records.iter().filter(|r| r.outcome == Outcome::Pending).count();

    let total_money = sum_present(records.iter().map(|r| r.money_result));
    let total_units = sum_present(records.iter().map(|r| r.unit_result));

    // Dates carry no time of day, so a bet counts from its midnight. A window
    // reaching past the earliest representable instant covers every dated bet.
    let window_start = Duration::try_days(trailing_days)
        .and_then(|span| as_of.checked_sub_signed(span))
        .unwrap_or(NaiveDateTime::MIN);
    let weekly_pl = sum_present(
        records
            .iter()
            .filter(|r| r.date.is_some_and(|d| d.and_time(chrono::NaiveTime::MIN) >= window_start))
            .map(|r| r.unit_result),
    );

    let potd: Vec<&BetRecord> = records.iter().filter(|r| r.is_pick_of_the_day).collect();
    let potd_wins = potd.iter().filter(|r| r.outcome == Outcome::Win).count();

    let units_risked = sum_present(
        records
            .iter()
            .filter(|r| r.outcome != Outcome::Pending)
            .map(|r| r.units_staked),
    );
    let roi_pct = if units_risked > 0.0 {
        total_units / units_risked * 100.0
    } else {
        0.0
    };

    Summary {
        total_bets: records.len(),
        graded_bets,
        wins,
        losses,
        pushes,
        pending,
        win_rate: rate(wins, graded_bets),
        overall_record: format!("{wins}-{losses}"),
        total_money,
        total_units,
        weekly_pl,
        potd_bets: potd.len(),
        potd_wins,
        potd_rate: rate(potd_wins, potd.len()),
        units_risked,
        roi_pct,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
