use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BudgetError, Result};
use crate::forecaster::ForecastConfig;

pub const DB_FILE: &str = "budgetbattles.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_budget")]
    pub default_budget: f64,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

fn default_currency_symbol() -> String {
    "£".to_string()
}

fn default_budget() -> f64 {
    2000.0
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            currency_symbol: default_currency_symbol(),
            default_budget: default_budget(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}

fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("budgetbattles")
        .join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("budgetbattles")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Read settings from `path`, falling back to defaults for a missing or
/// unreadable file and for an invalid `forecast` section.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    let mut settings: Settings = serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
        Settings::default()
    });
    if let Err(e) = settings.forecast.validate() {
        warn!(path = %path.display(), error = %e, "invalid forecast settings, using defaults");
        settings.forecast = ForecastConfig::default();
    }
    settings
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BudgetError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
