//! Integration tests: loader, engine and dashboard wired over an
//! in-memory sheet.

mod dashboard_flow;
mod mock_source;
