//! Google Sheets ledger integration.
//!
//! Reads and appends rows through the Sheets v4 values API.
//!
//! API docs: https://developers.google.com/sheets/api/reference/rest
//! Base URL: https://sheets.googleapis.com/v4/spreadsheets/
//! Auth: `Authorization: Bearer {token}` (an OAuth access token with the
//! spreadsheets scope, e.g. from a service account token exchange).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{rows_from_grid, CellRef, SheetRow, TabularSource};
use crate::types::TrackerError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SOURCE_NAME: &str = "sheets";

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

/// `ValueRange` as returned by `values.get`. Empty ranges omit `values`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Request body for `values.append`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendBody<'a> {
    major_dimension: &'static str,
    values: [&'a [String]; 1],
}

/// Cells come back as strings with the default render option, but be
/// lenient in case a caller asks for unformatted values.
fn cell_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn grid_from_value_range(range: ValueRange) -> Vec<Vec<String>> {
    range
        .values
        .iter()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Google Sheets client bound to one worksheet.
pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    token: SecretString,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: String, sheet_name: String, token: SecretString) -> Result<Self> {
        Self::with_base_url(BASE_URL.to_string(), spreadsheet_id, sheet_name, token)
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(
        base_url: String,
        spreadsheet_id: String,
        sheet_name: String,
        token: SecretString,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .user_agent("bettracker/0.1.0")
            .build()
            .context("Failed to build Sheets HTTP client")?;
        info!(spreadsheet_id = %spreadsheet_id, sheet = %sheet_name, "Sheets client ready");
        Ok(Self { http, base_url, spreadsheet_id, sheet_name, token })
    }

    /// Quote the worksheet name so names with spaces survive A1 notation.
    fn a1_range(&self, reference: Option<&str>) -> String {
        let sheet = format!("'{}'", self.sheet_name.replace('\'', "''"));
        match reference {
            Some(r) => format!("{sheet}!{r}"),
            None => sheet,
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        )
    }

    fn append_url(&self) -> String {
        format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url(&self.a1_range(Some("A1")))
        )
    }

    fn load_failure(message: impl Into<String>) -> TrackerError {
        TrackerError::LoadFailure { source_name: SOURCE_NAME.into(), message: message.into() }
    }

    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>, TrackerError> {
        let url = self.values_url(range);
        debug!(range, "Fetching sheet range");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| Self::load_failure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, range, "Sheets read rejected");
            return Err(Self::load_failure(format!("HTTP {status}: {body}")));
        }

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| Self::load_failure(format!("bad response body: {e}")))?;
        Ok(grid_from_value_range(range))
    }
}

#[async_trait]
impl TabularSource for SheetsClient {
    async fn read_cell(&self, reference: &str) -> Result<String, TrackerError> {
        let cell = CellRef::parse(reference)?;
        let grid = self.get_range(&self.a1_range(Some(&cell.to_string()))).await?;
        Ok(grid
            .first()
            .and_then(|r| r.first())
            .cloned()
            .unwrap_or_default())
    }

    async fn read_rows(
        &self,
        header_row: usize,
        expected_headers: &[String],
    ) -> Result<Vec<SheetRow>, TrackerError> {
        let grid = self.get_range(&self.a1_range(None)).await?;
        debug!(rows = grid.len(), "Sheet grid fetched");
        rows_from_grid(&grid, header_row, expected_headers)
    }

    async fn append_row(&self, values: Vec<String>) -> Result<(), TrackerError> {
        let append_failure = |message: String| TrackerError::AppendFailure {
            source_name: SOURCE_NAME.into(),
            message,
        };

        let body = AppendBody { major_dimension: "ROWS", values: [values.as_slice()] };
        let resp = self
            .http
            .post(self.append_url())
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| append_failure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(append_failure(format!("HTTP {status}: {body}")));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
