//! Mock sheet for integration testing.
//!
//! Provides a deterministic `TabularSource` implementation that holds a
//! grid in memory, records every appended row, and can be told to fail.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use bettracker::loader::EXPECTED_HEADERS;
use bettracker::source::{rows_from_grid, CellRef, SheetRow, TabularSource};
use bettracker::types::TrackerError;

/// A mock spreadsheet. All state is in-memory and controllable from tests.
#[derive(Clone)]
pub struct MockSheet {
    grid: Arc<Mutex<Vec<Vec<String>>>>,
    appended: Arc<Mutex<Vec<Vec<String>>>>,
    /// If set, reads fail with `LoadFailure`.
    read_error: Arc<Mutex<Option<String>>>,
    /// Appends succeed this many times, then fail.
    append_budget: Arc<Mutex<Option<usize>>>,
}

impl MockSheet {
    /// A sheet with a bankroll title row, the standard header and `bets`.
    pub fn new(bankroll: &str, bets: &[[&str; 12]]) -> Self {
        let mut grid = vec![
            vec!["Bankroll".to_string(), bankroll.to_string()],
            EXPECTED_HEADERS.iter().map(|h| h.to_string()).collect(),
        ];
        grid.extend(bets.iter().map(|b| b.iter().map(|c| c.to_string()).collect()));
        Self::from_grid(grid)
    }

    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        Self {
            grid: Arc::new(Mutex::new(grid)),
            appended: Arc::new(Mutex::new(Vec::new())),
            read_error: Arc::new(Mutex::new(None)),
            append_budget: Arc::new(Mutex::new(None)),
        }
    }

    /// Force all subsequent reads to fail.
    pub fn set_read_error(&self, msg: &str) {
        *self.read_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_read_error(&self) {
        *self.read_error.lock().unwrap() = None;
    }

    /// Allow `n` more appends, then fail.
    pub fn fail_appends_after(&self, n: usize) {
        *self.append_budget.lock().unwrap() = Some(n);
    }

    /// Rows appended so far, in order.
    pub fn appended(&self) -> Vec<Vec<String>> {
        self.appended.lock().unwrap().clone()
    }

    fn check_read(&self) -> Result<(), TrackerError> {
        match self.read_error.lock().unwrap().as_ref() {
            Some(msg) => Err(TrackerError::LoadFailure {
                source_name: "mock-sheet".into(),
                message: msg.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TabularSource for MockSheet {
    async fn read_cell(&self, reference: &str) -> Result<String, TrackerError> {
        self.check_read()?;
        let cell = CellRef::parse(reference)?;
        let grid = self.grid.lock().unwrap();
        Ok(grid
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
        self.check_read()?;
        let grid = self.grid.lock().unwrap();
        rows_from_grid(&grid, header_row, expected_headers)
    }

    async fn append_row(&self, values: Vec<String>) -> Result<(), TrackerError> {
        {
            let mut budget = self.append_budget.lock().unwrap();
            if let Some(left) = budget.as_mut() {
                if *left == 0 {
                    return Err(TrackerError::AppendFailure {
                        source_name: "mock-sheet".into(),
                        message: "write quota exceeded".into(),
                    });
                }
                *left -= 1;
            }
        }
        self.grid.lock().unwrap().push(values.clone());
        self.appended.lock().unwrap().push(values);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock-sheet"
    }
}
