//! Bet submission endpoint.
//!
//! `POST /api/submit-bets` takes a JSON array of bet objects and appends one
//! row per element: `[today, game, bet, sport, odds, units]`. There is no
//! dedup and no batch atomicity; rows appended before a failure stay.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use super::routes::{ApiError, AppState};

/// Keys read from each submitted object, in row order after the date.
pub const SUBMIT_KEYS: [&str; 5] = ["game", "bet", "sport", "odds", "units"];

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub rows_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Text written to the sheet for one JSON value. Missing and null become
/// `""`; numbers keep their JSON spelling.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Build the sheet row for one submitted bet.
pub fn submission_row(date: &str, bet: &Map<String, Value>) -> Vec<String> {
    std::iter::once(date.to_string())
        .chain(SUBMIT_KEYS.iter().map(|k| cell_text(bet.get(*k))))
        .collect()
}

/// POST /api/submit-bets
pub async fn submit_bets(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.settings.submissions_enabled {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Bet submission is disabled"));
    }

    let Value::Array(items) = body else {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Expected a JSON array of bets"));
    };

    // Reject the whole batch up front rather than appending a prefix of it.
    let bets: Vec<&Map<String, Value>> = items
        .iter()
        .map(Value::as_object)
        .collect::<Option<_>>()
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Every element must be a JSON object"))?;

    let today = state.now().date().format("%Y-%m-%d").to_string();
    let source = state.source();
    let mut rows_added = 0;

    for bet in bets {
        let row = submission_row(&today, bet);
        debug!(source = source.name(), row = ?row, "Appending bet row");
        if let Err(e) = source.append_row(row).await {
            error!(source = source.name(), rows_added, error = %e, "Bet submission aborted");
            let body = SubmitResponse { status: "error", rows_added, message: Some(e.to_string()) };
            return Ok((StatusCode::BAD_GATEWAY, Json(body)));
        }
        rows_added += 1;
    }

    info!(source = source.name(), rows_added, "Bets submitted");
    Ok((StatusCode::OK, Json(SubmitResponse { status: "ok", rows_added, message: None })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
