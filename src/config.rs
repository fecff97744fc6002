// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default = "Config::builtin")]
pub struct Config {
    /// First date of the price history window (YYYY-MM-DD)
    pub start_date: String,
    pub ticker_map: PathBuf,
    pub output_csv: PathBuf,
    /// Written to the CSV in place of undefined numbers
    pub missing_marker: String,
    pub yahoo_base_url: String,
    pub finviz_base_url: String,
    pub request_delay_ms: u64,
    pub user_agent: String,
}

impl Config {
    fn builtin() -> Self {
        Self {
            start_date: "2024-01-01".to_string(),
            ticker_map: PathBuf::from("ticker_map.json"),
            output_csv: PathBuf::from("Morning_Dashboard_Output.csv"),
            missing_marker: "NA".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            finviz_base_url: "https://finviz.com".to_string(),
            request_delay_ms: 200,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    pub fn start_date(&self) -> anyhow::Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d").with_context(|| {
            format!(
                "Invalid start_date '{}'. Use YYYY-MM-DD",
                self.start_date
            )
        })
    }

    /// Applies `DASHBOARD_*` overrides. `lookup` is normally `std::env::var(..).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(start) = lookup("DASHBOARD_START_DATE") {
            self.start_date = start;
        }
        if let Some(path) = lookup("DASHBOARD_TICKER_MAP") {
            self.ticker_map = PathBuf::from(path);
        }
        if let Some(path) = lookup("DASHBOARD_OUTPUT_CSV") {
            self.output_csv = PathBuf::from(path);
        }
    }

    /// Relative paths are taken to live beside the crate manifest.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir().join(path)
        }
    }

    pub fn ticker_map_path(&self) -> PathBuf {
        self.resolve_path(&self.ticker_map)
    }

    pub fn output_csv_path(&self) -> PathBuf {
        self.resolve_path(&self.output_csv)
    }
}

impl Default for Config {
    fn default() -> Self {
        // Try to read from config.toml first
        if let Ok(config) = load_config() {
            return config;
        }

        Self::builtin()
    }
}

fn base_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn get_config_path() -> PathBuf {
    let mut path = base_dir();
    path.push("config.toml");
    path
}

pub fn load_config() -> anyhow::Result<Config> {
    let config_path = get_config_path();
    match fs::read_to_string(&config_path) {
        Ok(config_str) => match toml::from_str(&config_str) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Failed to parse config.toml: {}", e);
                Err(e.into())
            }
        },
        Err(e) => {
            tracing::debug!(
                "No config.toml at {:?} ({}), using built-in defaults",
                config_path,
                e
            );
            Err(e.into())
        }
    }
}
