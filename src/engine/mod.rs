//! Metrics engine: pure aggregations over loaded bet records.
//!
//! Every function here takes the full record slice and recomputes from
//! scratch. There is no cached or incremental state, so calling twice with
//! the same input yields identical output.

pub mod history;
pub mod sports;
pub mod summary;
pub mod weekly;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::types::{BetRecord, Outcome, TrackerError};
use history::{PlPoint, StreakSummary};
use sports::SportBreakdown;
use summary::Summary;
use weekly::WeeklyBreakdown;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Length of the trailing P/L window in days.
    pub trailing_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { trailing_days: 7 }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything the dashboard renders, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub summary: Summary,
    pub sports: Vec<SportBreakdown>,
    pub week: WeeklyBreakdown,
    pub streaks: StreakSummary,
    pub history: Vec<PlPoint>,
}

pub struct MetricsEngine {
    config: EngineConfig,
}

impl MetricsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the full report. `anchor` selects the week; `as_of` is "now"
    /// for the trailing window.
    pub fn report(
        &self,
        records: &[BetRecord],
        anchor: NaiveDate,
        as_of: NaiveDateTime,
    ) -> Result<MetricsReport, TrackerError> {
        let week = weekly::weekly_breakdown(records, anchor).ok_or(TrackerError::DateOutOfRange(anchor))?;
        let report = MetricsReport {
            summary: summary::summarize(records, as_of, self.config.trailing_days),
            sports: sports::by_sport(records),
            week,
            streaks: history::streaks(records),
            history: history::pl_history(records),
        };
        debug!(
            records = records.len(),
            sports = report.sports.len(),
            anchor = %anchor,
            "Metrics computed"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Shared aggregation helpers
// ---------------------------------------------------------------------------

/// Sum of present values. Nulls are skipped, an all-null input sums to 0.
pub(crate) fn sum_present(values: impl Iterator<Item = Option<f64>>) -> f64 {
    values.flatten().fold(0.0, |acc, v| acc + v)
}

/// Mean of present values, `None` when there are none.
pub(crate) fn mean_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Percentage `hits / total * 100`, defined as 0 when `total` is 0.
pub(crate) fn rate(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}

/// `(wins, losses)` among graded records.
pub(crate) fn record_counts<'a>(records: impl Iterator<Item = &'a BetRecord>) -> (usize, usize) {
    records.fold((0, 0), |(w, l), r| match r.outcome {
        Outcome::Win => (w + 1, l),
        Outcome::Loss => (w, l + 1),
        _ => (w, l),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
