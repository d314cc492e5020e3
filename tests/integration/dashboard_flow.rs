//! End-to-end flows: sheet → loader → engine → HTTP.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use bettracker::config::BankrollMode;
use bettracker::dashboard::{build_router, Clock, DashboardSettings, DashboardState};
use bettracker::engine::{EngineConfig, MetricsEngine};
use bettracker::loader::{LoaderConfig, RecordLoader};
use bettracker::types::{Outcome, TrackerError};

use crate::mock_source::MockSheet;

const LEDGER: &[[&str; 12]] = &[
    ["2026-02-09", "KC @ BUF", "KC -2.5", "NFL", "-110", "1", "W", "1", "1000", "0.91", "", "0"],
    ["2026-02-10", "LAL @ BOS", "Over 221.5", "NBA", "-105", "1", "L", "0", "1000", "-1", "", "0"],
    ["2026-02-16", "NYR @ PIT", "NYR ML", "NHL", "+135", "1", "W", "0", "1000", "1.35", "", "0"],
    ["2026-02-17", "DEN @ PHX", "DEN -4", "NBA", "n/a", "2", "P", "1", "1000", "0", "", "0"],
    ["02/18/2026", "MIA @ ORL", "Under 210", "NBA", "-115", "1", "w", "1", "$1,000", "0.87", "", "0"],
    ["2026-02-19", "TOR @ MTL", "TOR -1.5", "NHL", "+160", "1", "", "0", "1000", "", "", "0"],
    ["", "Futures", "BUF to win SB", "NFL", "+900", "0.5", "", "0", "1000", "", "", "0"],
];

fn clock() -> Clock {
    Arc::new(|| {
        NaiveDate::from_ymd_opt(2026, 2, 19)
            .and_then(|d| d.and_hms_opt(20, 30, 0))
            .unwrap()
    })
}

fn app_for(sheet: &MockSheet, settings: DashboardSettings) -> axum::Router {
    let loader = RecordLoader::new(Arc::new(sheet.clone()), LoaderConfig::default());
    let state = DashboardState::new(loader, MetricsEngine::new(EngineConfig::default()), settings)
        .with_clock(clock());
    build_router(Arc::new(state))
}

async fn call(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_loader_coerces_ledger() {
    let sheet = MockSheet::new("$1,250.00", LEDGER);
    let loader = RecordLoader::new(Arc::new(sheet), LoaderConfig::default());
    let book = loader.load().await.unwrap();

    assert_eq!(book.records.len(), 7);
    assert!(book.bankroll.known);
    assert_eq!(book.bankroll.amount, 1250.0);
    // "n/a" odds is the only unparsable non-blank cell.
    assert_eq!(book.warnings.len(), 1);
    assert_eq!(book.warnings[0].column, "Odds");
    assert_eq!(book.warnings[0].row, 6);

    let mia = &book.records[4];
    assert_eq!(mia.date, NaiveDate::from_ymd_opt(2026, 2, 18));
    assert_eq!(mia.outcome, Outcome::Win);
    assert_eq!(mia.bankroll_at_time, Some(1000.0));
    assert!((mia.money_result.unwrap() - 8.7).abs() < 1e-10);

    assert_eq!(book.records[6].date, None);
}

#[tokio::test]
async fn test_schema_mismatch_is_fatal() {
    let grid = vec![
        vec!["Bankroll".to_string(), "500".to_string()],
        vec!["Date".to_string(), "Game".to_string(), "Odds".to_string()],
        vec!["2026-02-09".to_string(), "KC @ BUF".to_string(), "-110".to_string()],
    ];
    let loader = RecordLoader::new(Arc::new(MockSheet::from_grid(grid)), LoaderConfig::default());
    match loader.load().await {
        Err(TrackerError::SchemaMismatch { missing }) => {
            assert!(missing.contains(&"W_L_P".to_string()));
            assert!(missing.contains(&"Unit_Results".to_string()));
            assert!(!missing.contains(&"Odds".to_string()));
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_report_over_http() {
    let sheet = MockSheet::new("1250", LEDGER);
    let (status, json) = call(app_for(&sheet, DashboardSettings::default()), get("/api/report")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data_status"], "loaded");

    let summary = &json["metrics"]["summary"];
    assert_eq!(summary["total_bets"], 7);
    assert_eq!(summary["overall_record"], "3-1");
    assert_eq!(summary["pushes"], 1);
    assert_eq!(summary["pending"], 2);
    assert_eq!(summary["potd_bets"], 3);
    assert_eq!(summary["potd_wins"], 2);

    // Trailing 7 days from 2026-02-19 20:30 starts at 2026-02-12 20:30.
    let weekly_pl = summary["weekly_pl"].as_f64().unwrap();
    assert!((weekly_pl - 2.22).abs() < 1e-10);

    // First-seen order, not alphabetical.
    let sports: Vec<&str> = json["metrics"]["sports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["sport"].as_str().unwrap())
        .collect();
    assert_eq!(sports, vec!["NFL", "NBA", "NHL"]);

    let week = &json["metrics"]["week"];
    assert_eq!(week["label"], "Feb 16 - Feb 22");
    assert_eq!(week["days"].as_array().unwrap().len(), 7);
    assert_eq!(week["days"][3]["bets"], 1);
    assert_eq!(week["days"][6]["bets"], 0);
    assert_eq!(week["record"], "2-0");

    assert_eq!(json["bankroll"]["amount"], 1250.0);
    assert_eq!(json["warnings"], 1);
}

#[tokio::test]
async fn test_report_is_deterministic() {
    let sheet = MockSheet::new("1250", LEDGER);
    let (_, a) = call(app_for(&sheet, DashboardSettings::default()), get("/api/report?date=2026-02-10")).await;
    let (_, b) = call(app_for(&sheet, DashboardSettings::default()), get("/api/report?date=2026-02-10")).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_outage_then_recovery() {
    let sheet = MockSheet::new("1250", LEDGER);
    sheet.set_read_error("transport error: connection refused");

    let (status, json) = call(app_for(&sheet, DashboardSettings::default()), get("/api/report")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data_status"], "unavailable");
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
    assert_eq!(json["metrics"]["summary"]["total_bets"], 0);

    sheet.clear_read_error();
    let (_, json) = call(app_for(&sheet, DashboardSettings::default()), get("/api/report")).await;
    assert_eq!(json["data_status"], "loaded");
    assert_eq!(json["metrics"]["summary"]["total_bets"], 7);
}

#[tokio::test]
async fn test_submitted_bets_show_up_in_report() {
    let sheet = MockSheet::new("1250", LEDGER);
    let body = r#"[{"game":"BOS @ NYK","bet":"BOS -3","sport":"NBA","odds":-110,"units":1}]"#;
    let (status, json) = call(app_for(&sheet, DashboardSettings::default()), post_json("/api/submit-bets", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"status": "ok", "rows_added": 1}));

    assert_eq!(
        sheet.appended(),
        vec![vec!["2026-02-19", "BOS @ NYK", "BOS -3", "NBA", "-110", "1"]]
    );

    let (_, json) = call(app_for(&sheet, DashboardSettings::default()), get("/api/report")).await;
    assert_eq!(json["metrics"]["summary"]["total_bets"], 8);
    assert_eq!(json["metrics"]["week"]["days"][3]["bets"], 2);
}

#[tokio::test]
async fn test_partial_append_failure() {
    let sheet = MockSheet::new("1250", LEDGER);
    sheet.fail_appends_after(2);
    let body = r#"[{"game":"A"},{"game":"B"},{"game":"C"}]"#;
    let (status, json) = call(app_for(&sheet, DashboardSettings::default()), post_json("/api/submit-bets", body)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["status"], "error");
    assert_eq!(json["rows_added"], 2);
    assert_eq!(sheet.appended().len(), 2);
}

#[tokio::test]
async fn test_submit_rejects_object_body() {
    let sheet = MockSheet::new("1250", LEDGER);
    let (status, _) = call(app_for(&sheet, DashboardSettings::default()), post_json("/api/submit-bets", r#"{"game":"A"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(sheet.appended().is_empty());
}

#[tokio::test]
async fn test_stake_calculator_manual_bankroll() {
    let sheet = MockSheet::new("not a number", LEDGER);
    let settings = DashboardSettings {
        bankroll_mode: BankrollMode::Manual,
        manual_bankroll: 1000.0,
        ..Default::default()
    };
    let (status, json) = call(
        app_for(&sheet, settings),
        get("/api/calculator/stake?units_to_win=2&odds=150"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bankroll"]["origin"], "manual");
    assert_eq!(json["target_profit"], 20.0);
    assert!((json["stake"].as_f64().unwrap() - 13.333_333).abs() < 1e-4);
}

#[tokio::test]
async fn test_unknown_sheet_bankroll_is_not_zero() {
    let sheet = MockSheet::new("", LEDGER);
    let (_, json) = call(app_for(&sheet, DashboardSettings::default()), get("/api/report")).await;
    assert_eq!(json["data_status"], "loaded");
    assert_eq!(json["bankroll"]["known"], false);
    assert_eq!(json["bankroll"]["amount"], 0.0);

    let (status, _) = call(app_for(&sheet, DashboardSettings::default()), get("/api/calculator/unit?units=1")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
