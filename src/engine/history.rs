//! Streaks and cumulative P/L over time.
//!
//! Only dated records take part. Within a single day, later sheet rows are
//! treated as more recent.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{BetRecord, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Streak {
    pub kind: Outcome,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakSummary {
    /// Run of identical results ending at the most recent graded bet.
    pub current: Option<Streak>,
    pub longest_win: usize,
    pub longest_loss: usize,
}

/// One point per betting day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlPoint {
    pub date: NaiveDate,
    pub units: f64,
    pub cumulative_units: f64,
    pub cumulative_money: f64,
}

/// Graded, dated records in chronological order.
fn graded_timeline(records: &[BetRecord]) -> Vec<(NaiveDate, usize, Outcome)> {
    let mut timeline: Vec<(NaiveDate, usize, Outcome)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.outcome.is_graded())
        .filter_map(|(i, r)| r.date.map(|d| (d, i, r.outcome)))
        .collect();
    timeline.sort_by_key(|(d, i, _)| (*d, *i));
    timeline
}

pub fn streaks(records: &[BetRecord]) -> StreakSummary {
    let timeline = graded_timeline(records);

    let mut longest_win = 0;
    let mut longest_loss = 0;
    let mut run: Option<Streak> = None;

    for (_, _, outcome) in &timeline {
        run = match run {
            Some(s) if s.kind == *outcome => Some(Streak { kind: s.kind, count: s.count + 1 }),
            _ => Some(Streak { kind: *outcome, count: 1 }),
        };
        if let Some(s) = run {
            match s.kind {
                Outcome::Win => longest_win = longest_win.max(s.count),
                Outcome::Loss => longest_loss = longest_loss.max(s.count),
                _ => {}
            }
        }
    }

    StreakSummary { current: run, longest_win, longest_loss }
}

/// Daily units with running totals, oldest day first.
pub fn pl_history(records: &[BetRecord]) -> Vec<PlPoint> {
    let mut by_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for r in records {
        if let Some(d) = r.date {
            let entry = by_day.entry(d).or_insert((0.0, 0.0));
            entry.0 += r.unit_result.unwrap_or(0.0);
            entry.1 += r.money_result.unwrap_or(0.0);
        }
    }

    let mut cumulative_units = 0.0;
    let mut cumulative_money = 0.0;
    by_day
        .into_iter()
        .map(|(date, (units, money))| {
            cumulative_units += units;
            cumulative_money += money;
            PlPoint { date, units, cumulative_units, cumulative_money }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
