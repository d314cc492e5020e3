//! Tabular data sources.
//!
//! Defines the `TabularSource` trait and provides implementations for:
//! - Google Sheets over the v4 REST API, the production ledger
//! - Local workbook: a JSON file or purely in-memory grid
//!
//! Every source exposes the same spreadsheet-shaped view: a grid of string
//! cells where one row holds the column names and later rows hold bets.

pub mod local;
pub mod sheets;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

use crate::types::TrackerError;

/// One data row keyed by header name.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row number in the sheet.
    pub row_number: usize,
    pub values: HashMap<String, String>,
}

impl SheetRow {
    /// Cell value for a column, or `""` when absent.
    pub fn get(&self, column: &str) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Abstraction over the spreadsheet holding the bet ledger.
///
/// Implementors are acquired once at startup and passed to the loader and
/// the submission endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Read a single cell by A1 reference (e.g. `B1`). Empty cells read as `""`.
    async fn read_cell(&self, reference: &str) -> Result<String, TrackerError>;

    /// Read all data rows below the 1-based `header_row`, keyed by header.
    ///
    /// Fails with `SchemaMismatch` if any expected header is missing.
    async fn read_rows(
        &self,
        header_row: usize,
        expected_headers: &[String],
    ) -> Result<Vec<SheetRow>, TrackerError>;

    /// Append one row after the last non-empty row.
    async fn append_row(&self, values: Vec<String>) -> Result<(), TrackerError>;

    /// Source name for logging and error messages.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Grid helpers shared by all sources
// ---------------------------------------------------------------------------

/// Map a raw grid to keyed rows using the header row convention.
///
/// Rows above the header (the title row) are ignored. Short rows are padded
/// with empty strings and rows with no content at all are skipped.
pub fn rows_from_grid(
    grid: &[Vec<String>],
    header_row: usize,
    expected_headers: &[String],
) -> Result<Vec<SheetRow>, TrackerError> {
    let header_idx = header_row.checked_sub(1).ok_or_else(|| {
        TrackerError::Config("header_row is 1-based and must be at least 1".into())
    })?;

    let headers: Vec<String> = grid
        .get(header_idx)
        .map(|row| row.iter().map(|h| h.trim().to_string()).collect())
        .unwrap_or_default();

    let missing: Vec<String> = expected_headers
        .iter()
        .filter(|h| !headers.iter().any(|have| have == *h))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(TrackerError::SchemaMismatch { missing });
    }

    let rows = grid
        .iter()
        .enumerate()
        .skip(header_idx + 1)
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(idx, cells)| {
            let values = headers
                .iter()
                .enumerate()
                .filter(|(_, h)| !h.is_empty())
                .map(|(col, h)| (h.clone(), cells.get(col).cloned().unwrap_or_default()))
                .collect();
            SheetRow { row_number: idx + 1, values }
        })
        .collect();

    Ok(rows)
}

/// A parsed A1-style cell reference (zero-based indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    /// Parse `B1`, `aa12`, etc. Ranges and sheet prefixes are rejected.
    pub fn parse(reference: &str) -> Result<Self, TrackerError> {
        let invalid = || TrackerError::InvalidCellReference(reference.to_string());
        let trimmed = reference.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = trimmed.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let col = letters
            .to_ascii_uppercase()
            .bytes()
            .try_fold(0usize, |acc, b| acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize))
            .ok_or_else(invalid)?
            - 1;
        let row_1: usize = digits.parse().map_err(|_| invalid())?;
        let row = row_1.checked_sub(1).ok_or_else(invalid)?;

        Ok(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.col + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        letters.reverse();
        write!(f, "{}{}", letters.into_iter().collect::<String>(), self.row + 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
