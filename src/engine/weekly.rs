//! Weekly and daily breakdown around an anchor date.
//!
//! Weeks run Monday through Sunday. The daily table always has seven rows,
//! zero-filled for days without bets. Records with no date never match.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::{mean_present, rate, record_counts, sum_present};
use crate::types::BetRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    /// Full English weekday name.
    pub day: String,
    pub date: NaiveDate,
    pub units: f64,
    pub bets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyBreakdown {
    pub anchor: NaiveDate,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// e.g. `"Feb 16 - Feb 22"`.
    pub label: String,
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub record: String,
    pub win_rate: f64,
    pub units: f64,
    /// Mean American odds in the window. Reported as 0 when the window has
    /// no odds at all, unlike the per-sport figure. A non-empty window whose
    /// odds are all unparsable also reports 0.
    pub avg_odds: f64,
    pub days: Vec<DailyRow>,
}

/// Monday and Sunday of the week containing `anchor`, or `None` when that
/// week runs past the representable date range.
pub fn week_bounds(anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let offset = Duration::days(anchor.weekday().num_days_from_monday() as i64);
    let start = anchor.checked_sub_signed(offset)?;
    let end = start.checked_add_signed(Duration::days(6))?;
    Some((start, end))
}

/// `None` when the anchor's week cannot be represented (see [`week_bounds`]).
pub fn weekly_breakdown(records: &[BetRecord], anchor: NaiveDate) -> Option<WeeklyBreakdown> {
    let (week_start, week_end) = week_bounds(anchor)?;

    let in_week: Vec<&BetRecord> = records
        .iter()
        .filter(|r| r.date.is_some_and(|d| d >= week_start && d <= week_end))
        .collect();

    let (wins, losses) = record_counts(in_week.iter().copied());

    let days = (0..7)
        .filter_map(|i| week_start.checked_add_signed(Duration::days(i)))
        .map(|date| {
            let on_day: Vec<&&BetRecord> = in_week.iter().filter(|r| r.date == Some(date)).collect();
            DailyRow {
                day: date.format("%A").to_string(),
                date,
                units: sum_present(on_day.iter().map(|r| r.unit_result)),
                bets: on_day.len(),
            }
        })
        .collect();

    Some(WeeklyBreakdown {
        anchor,
        week_start,
        week_end,
        label: format!("{} - {}", week_start.format("%b %d"), week_end.format("%b %d")),
        total_bets: in_week.len(),
        wins,
        losses,
        record: format!("{wins}-{losses}"),
        win_rate: rate(wins, wins + losses),
        units: sum_present(in_week.iter().map(|r| r.unit_result)),
        avg_odds: mean_present(in_week.iter().map(|r| r.american_odds.map(|o| o as f64)))
            .unwrap_or(0.0),
        days,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
