//! Dashboard: Axum web server for the betting ledger.
//!
//! Serves a REST API and a self-contained HTML dashboard.
//! CORS is open so the page can be hosted separately during development.

pub mod routes;
pub mod submit;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    response::Html,
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use routes::{system_clock, AppState, Clock, DashboardSettings, DashboardState};

/// The embedded dashboard HTML (compiled into the binary).
const DASHBOARD_HTML: &str = include_str!("templates/index.html");

/// Run the dashboard until `shutdown` resolves.
pub async fn serve<F>(state: AppState, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard port {port}"))?;
    info!(port, "Dashboard server starting on http://localhost:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Dashboard server error")?;

    info!("Dashboard server stopped");
    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/api/report", get(routes::get_report))
        .route("/api/sports", get(routes::get_sports))
        .route("/api/week", get(routes::get_week))
        .route("/api/calculator/stake", get(routes::get_stake))
        .route("/api/calculator/unit", get(routes::get_unit_value))
        .route("/api/submit-bets", post(submit::submit_bets))
        .route("/health", get(routes::health))
        // Dashboard HTML
        .route("/", get(serve_dashboard))
        .layer(cors)
        .with_state(state)
}

/// Serve the embedded HTML dashboard.
async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
