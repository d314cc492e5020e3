//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the Sheets bearer token) are referenced by env-var name in the
//! config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::engine::EngineConfig;
use crate::loader::{LoaderConfig, DEFAULT_BANKROLL_CELL, DEFAULT_HEADER_ROW};
use crate::source::CellRef;

/// Upper bound for `engine.trailing_days` (about a century).
pub const MAX_TRAILING_DAYS: i64 = 36_500;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub tracker: TrackerConfig,
    pub source: SourceConfig,
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    pub name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Sheets,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// JSON workbook path for `kind = "local"`.
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    /// Name of the env var holding the OAuth bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    #[serde(default = "default_bankroll_cell")]
    pub bankroll_cell: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BankrollMode {
    /// Read the bankroll cell on every load.
    #[default]
    Sheet,
    /// Use `manual_bankroll` (overridable per request).
    Manual,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub port: u16,
    #[serde(default)]
    pub bankroll_mode: BankrollMode,
    #[serde(default = "default_manual_bankroll")]
    pub manual_bankroll: f64,
    #[serde(default = "default_true")]
    pub submissions_enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSection {
    #[serde(default = "default_trailing_days")]
    pub trailing_days: i64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self { trailing_days: default_trailing_days() }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_header_row() -> usize {
    DEFAULT_HEADER_ROW
}

fn default_bankroll_cell() -> Option<String> {
    Some(DEFAULT_BANKROLL_CELL.to_string())
}

fn default_manual_bankroll() -> f64 {
    300.0
}

fn default_true() -> bool {
    true
}

fn default_trailing_days() -> i64 {
    7
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.source.header_row == 0 {
            anyhow::bail!("source.header_row is 1-based and must be at least 1");
        }
        if self.source.kind == SourceKind::Sheets {
            if self.source.spreadsheet_id.is_none() {
                anyhow::bail!("source.spreadsheet_id is required when kind = \"sheets\"");
            }
            if self.source.token_env.is_none() {
                anyhow::bail!("source.token_env is required when kind = \"sheets\"");
            }
        }
        if !(0..=MAX_TRAILING_DAYS).contains(&self.engine.trailing_days) {
            anyhow::bail!("engine.trailing_days must be between 0 and {MAX_TRAILING_DAYS}");
        }
        if let Some(cell) = &self.source.bankroll_cell {
            CellRef::parse(cell).with_context(|| format!("source.bankroll_cell {cell:?} is not a single cell"))?;
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            header_row: self.source.header_row,
            bankroll_cell: match self.dashboard.bankroll_mode {
                BankrollMode::Sheet => self.source.bankroll_cell.clone(),
                BankrollMode::Manual => None,
            },
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig { trailing_days: self.engine.trailing_days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [tracker]
        name = "Sharp Ledger"

        [source]
        kind = "local"

        [dashboard]
        port = 8050
    "#;

    #[test]
    fn test_load_config() {
        // This test requires config.toml to be in the working directory.
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert!(!cfg.tracker.name.is_empty());
            assert!(cfg.dashboard.port > 0);
            assert!(cfg.source.header_row >= 1);
            assert!(cfg.dashboard.manual_bankroll > 0.0);
        }
        // If config.toml isn't found, that's acceptable in some test environments
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = AppConfig::parse(MINIMAL).unwrap();
        assert_eq!(cfg.tracker.currency, "USD");
        assert_eq!(cfg.source.kind, SourceKind::Local);
        assert_eq!(cfg.source.header_row, 2);
        assert_eq!(cfg.source.bankroll_cell.as_deref(), Some("B1"));
        assert_eq!(cfg.dashboard.bankroll_mode, BankrollMode::Sheet);
        assert_eq!(cfg.dashboard.manual_bankroll, 300.0);
        assert!(cfg.dashboard.submissions_enabled);
        assert_eq!(cfg.engine.trailing_days, 7);
    }

    #[test]
    fn test_manual_mode_skips_bankroll_cell() {
        let text = MINIMAL.replace("port = 8050", "port = 8050\nbankroll_mode = \"manual\"");
        let cfg = AppConfig::parse(&text).unwrap();
        assert_eq!(cfg.dashboard.bankroll_mode, BankrollMode::Manual);
        assert_eq!(cfg.loader_config().bankroll_cell, None);
    }

    #[test]
    fn test_sheets_requires_spreadsheet_id() {
        let text = MINIMAL.replace("kind = \"local\"", "kind = \"sheets\"\ntoken_env = \"SHEETS_TOKEN\"");
        let err = AppConfig::parse(&text).unwrap_err();
        assert!(err.to_string().contains("spreadsheet_id"));
    }

    #[test]
    fn test_zero_header_row_rejected() {
        let text = MINIMAL.replace("kind = \"local\"", "kind = \"local\"\nheader_row = 0");
        assert!(AppConfig::parse(&text).is_err());
    }

    #[test]
    fn test_unknown_source_kind_rejected() {
        let text = MINIMAL.replace("kind = \"local\"", "kind = \"excel\"");
        assert!(AppConfig::parse(&text).is_err());
    }

    #[test]
    fn test_trailing_days_bounded() {
        let text = format!("{MINIMAL}\n[engine]\ntrailing_days = 100000000\n");
        let err = AppConfig::parse(&text).unwrap_err();
        assert!(err.to_string().contains("trailing_days"));

        let text = format!("{MINIMAL}\n[engine]\ntrailing_days = -1\n");
        assert!(AppConfig::parse(&text).is_err());

        let text = format!("{MINIMAL}\n[engine]\ntrailing_days = {MAX_TRAILING_DAYS}\n");
        assert_eq!(AppConfig::parse(&text).unwrap().engine.trailing_days, MAX_TRAILING_DAYS);
    }

    #[test]
    fn test_bankroll_cell_must_be_single_cell() {
        for bad in ["B1:C2", "nope", "A0"] {
            let text = MINIMAL.replace("kind = \"local\"", &format!("kind = \"local\"\nbankroll_cell = \"{bad}\""));
            let err = AppConfig::parse(&text).unwrap_err();
            assert!(err.to_string().contains("bankroll_cell"), "{bad}: {err}");
        }
        let text = MINIMAL.replace("kind = \"local\"", "kind = \"local\"\nbankroll_cell = \"C3\"");
        assert_eq!(AppConfig::parse(&text).unwrap().source.bankroll_cell.as_deref(), Some("C3"));
    }
}
