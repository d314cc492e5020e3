//! Local workbook source.
//!
//! Keeps the sheet grid in memory and optionally mirrors it to a JSON file,
//! so the tracker runs without spreadsheet credentials. The file layout is a
//! plain grid: `{"rows": [["Bankroll", "300"], ["Date", "Game", ...], ...]}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{rows_from_grid, CellRef, SheetRow, TabularSource};
use crate::types::TrackerError;

/// Default workbook file path.
const DEFAULT_WORKBOOK_FILE: &str = "betting_sheet.json";

const SOURCE_NAME: &str = "local";

/// Serialized workbook contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub rows: Vec<Vec<String>>,
}

/// Save a workbook to a JSON file.
pub fn save_workbook(book: &Workbook, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_WORKBOOK_FILE);
    let json = serde_json::to_string_pretty(book).context("Failed to serialise workbook")?;

    std::fs::write(path, &json).context(format!("Failed to write workbook to {path}"))?;

    debug!(path, rows = book.rows.len(), "Workbook saved");
    Ok(())
}

/// Load a workbook from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_workbook(path: Option<&str>) -> Result<Option<Workbook>> {
    let path = path.unwrap_or(DEFAULT_WORKBOOK_FILE);

    if !Path::new(path).exists() {
        info!(path, "No workbook file found");
        return Ok(None);
    }

    let json =
        std::fs::read_to_string(path).context(format!("Failed to read workbook from {path}"))?;

    let book: Workbook =
        serde_json::from_str(&json).context(format!("Failed to parse workbook from {path}"))?;

    info!(path, rows = book.rows.len(), "Workbook loaded from disk");

    Ok(Some(book))
}

/// A `TabularSource` backed by an in-memory grid, optionally persisted.
pub struct LocalWorkbook {
    path: Option<PathBuf>,
    book: RwLock<Workbook>,
}

impl LocalWorkbook {
    /// Purely in-memory workbook (nothing is written to disk).
    pub fn in_memory(book: Workbook) -> Self {
        Self { path: None, book: RwLock::new(book) }
    }

    /// Open a workbook file, starting empty if it doesn't exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let book = load_workbook(Some(&path.to_string_lossy()))?.unwrap_or_default();
        Ok(Self { path: Some(path), book: RwLock::new(book) })
    }

    /// Snapshot of the current grid.
    pub async fn snapshot(&self) -> Workbook {
        self.book.read().await.clone()
    }
}

#[async_trait]
impl TabularSource for LocalWorkbook {
    async fn read_cell(&self, reference: &str) -> Result<String, TrackerError> {
        let cell = CellRef::parse(reference)?;
        let book = self.book.read().await;
        Ok(book
            .rows
            .get(cell.row)
            .and_then(|r| r.get(cell.col))
            .cloned()
            .unwrap_or_default())
    }

    async fn read_rows(
        &self,
        header_row: usize,
        expected_headers: &[String],
    ) -> Result<Vec<SheetRow>, TrackerError> {
        let book = self.book.read().await;
        rows_from_grid(&book.rows, header_row, expected_headers)
    }

    async fn append_row(&self, values: Vec<String>) -> Result<(), TrackerError> {
        let mut book = self.book.write().await;

        // Stage the write on a copy so a failed save leaves the grid as it was.
        let mut next = book.clone();
        // Append after the last row with content, like a spreadsheet does.
        let last_used = next
            .rows
            .iter()
            .rposition(|r| r.iter().any(|c| !c.trim().is_empty()))
            .map(|i| i + 1)
            .unwrap_or(0);
        next.rows.truncate(last_used);
        next.rows.push(values);

        if let Some(path) = &self.path {
            save_workbook(&next, Some(&path.to_string_lossy())).map_err(|e| {
                TrackerError::AppendFailure {
                    source_name: SOURCE_NAME.into(),
                    message: format!("{e:#}"),
                }
            })?;
        }
        *book = next;
        Ok(())
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
