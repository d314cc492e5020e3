//! BETTRACKER: sports betting ledger and performance dashboard.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod source;
pub mod loader;
pub mod strategy;
pub mod engine;
pub mod dashboard;
